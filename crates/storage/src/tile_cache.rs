//! Disk-backed tile cache with a per-key single-producer protocol.
//!
//! Any number of threads may request the same key concurrently; exactly
//! one of them runs the producer while the rest block on the entry's
//! condition variable. Files become visible only through a rename chain,
//! so a reader can never observe a partially written tile.
//!
//! Lock order is always index → entry state, and neither lock is held
//! across producer invocation or file I/O.

use image::RgbaImage;
use map_common::{MapError, MapResult};
use projection::TileCoord;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, warn};

use crate::CacheConfig;

/// Per-entry production state. `Ready` implies the entry's path slot is
/// populated and the publication (if any) is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Absent,
    Producing,
    Ready,
}

#[derive(Debug)]
struct EntryState {
    status: Status,
    path: Option<PathBuf>,
}

#[derive(Debug)]
struct CacheEntry {
    state: Mutex<EntryState>,
    changed: Condvar,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            state: Mutex::new(EntryState {
                status: Status::Absent,
                path: None,
            }),
            changed: Condvar::new(),
        }
    }
}

#[derive(Debug)]
struct Index {
    tiles: HashMap<String, Arc<CacheEntry>>,
    requests: HashMap<String, Instant>,
    shutdown: bool,
}

#[derive(Debug)]
struct Shared {
    dir: PathBuf,
    config: CacheConfig,
    index: Mutex<Index>,
    sweep: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
    produced: AtomicU64,
    evicted: AtomicU64,
}

/// Counter snapshot for observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub produced: u64,
    pub evicted: u64,
}

/// Handle to a cached tile. The file may legitimately not exist when the
/// tile rendered empty and empty tiles are not persisted.
#[derive(Debug, Clone)]
pub struct CachedTile {
    key: String,
    path: PathBuf,
}

impl CachedTile {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the tile bytes; `None` when no file was persisted.
    pub fn read(&self) -> MapResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Disk-backed, key-addressed store for rendered tiles.
#[derive(Debug)]
pub struct TileCache {
    shared: Arc<Shared>,
    sweeper: Option<JoinHandle<()>>,
}

impl TileCache {
    /// Open a cache rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> MapResult<Self> {
        Self::with_config(dir, CacheConfig::default())
    }

    pub fn with_config(dir: impl Into<PathBuf>, config: CacheConfig) -> MapResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| MapError::InvalidCacheDir(format!("{}: {}", dir.display(), e)))?;

        let shared = Arc::new(Shared {
            dir,
            config,
            index: Mutex::new(Index {
                tiles: HashMap::new(),
                requests: HashMap::new(),
                shutdown: false,
            }),
            sweep: Condvar::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            produced: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
        });
        let sweeper = spawn_sweeper(Arc::clone(&shared));

        Ok(Self {
            shared,
            sweeper: Some(sweeper),
        })
    }

    /// The conventional on-disk layout for a tile key: `/z/x/y`, with a
    /// two-level zoom-8 ancestor prefix from zoom 8 up to bound
    /// directory fan-out.
    pub fn relative_path(x: u32, y: u32, z: u32) -> String {
        if z >= 8 {
            let a = TileCoord::new(z, x, y).ancestor(8);
            format!("/{}/{}/{}/{}/{}", z, a.x, a.y, x, y)
        } else {
            format!("/{}/{}/{}", z, x, y)
        }
    }

    /// `get_or_create` without persisting empty tiles.
    pub fn get_or_create<F>(&self, key: &str, producer: F) -> MapResult<CachedTile>
    where
        F: FnOnce() -> MapResult<Option<RgbaImage>>,
    {
        self.get_or_create_with(key, producer, false)
    }

    /// Return the tile for `key`, invoking `producer` at most once across
    /// all concurrent requesters. A producer returning `None` (or an
    /// all-transparent image) yields an empty tile: a zero-byte file when
    /// `save_empty_tiles`, otherwise no file at all.
    pub fn get_or_create_with<F>(
        &self,
        key: &str,
        producer: F,
        save_empty_tiles: bool,
    ) -> MapResult<CachedTile>
    where
        F: FnOnce() -> MapResult<Option<RgbaImage>>,
    {
        let entry = {
            let mut index = self.shared.index.lock().expect("cache index lock poisoned");
            index.requests.insert(key.to_string(), Instant::now());
            index
                .tiles
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(CacheEntry::new()))
                .clone()
        };

        // wait for a path, or claim the producer role
        {
            let mut state = entry.state.lock().expect("cache entry lock poisoned");
            loop {
                if let Some(path) = &state.path {
                    self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key, "tile cache hit");
                    return Ok(CachedTile {
                        key: key.to_string(),
                        path: path.clone(),
                    });
                }
                match state.status {
                    Status::Producing => {
                        state = entry
                            .changed
                            .wait(state)
                            .expect("cache entry lock poisoned");
                    }
                    _ => {
                        state.status = Status::Producing;
                        break;
                    }
                }
            }
        }

        let guard = ProducerGuard {
            entry: &entry,
            armed: true,
        };
        let tile = self.produce(key, producer, save_empty_tiles)?;

        let mut state = entry.state.lock().expect("cache entry lock poisoned");
        state.path = Some(tile.path.clone());
        state.status = Status::Ready;
        entry.changed.notify_all();
        drop(state);
        guard.disarm();

        Ok(tile)
    }

    /// Delete `key`'s file, waiting out any in-flight producer first.
    /// Removing an unknown key is a no-op.
    pub fn remove(&self, key: &str) -> MapResult<()> {
        let entry = {
            let mut index = self.shared.index.lock().expect("cache index lock poisoned");
            index.requests.remove(key);
            index.tiles.remove(key)
        };

        if let Some(entry) = entry {
            let mut state = entry.state.lock().expect("cache entry lock poisoned");
            while state.status == Status::Producing {
                state = entry
                    .changed
                    .wait(state)
                    .expect("cache entry lock poisoned");
            }
            state.path = None;
            state.status = Status::Absent;
        }

        match fs::remove_file(self.tile_path(key)) {
            Ok(()) => {
                debug!(key, "removed cached tile");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of keys currently tracked by the request map.
    pub fn len(&self) -> usize {
        self.shared
            .index
            .lock()
            .expect("cache index lock poisoned")
            .requests
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
            produced: self.shared.produced.load(Ordering::Relaxed),
            evicted: self.shared.evicted.load(Ordering::Relaxed),
        }
    }

    fn tile_path(&self, key: &str) -> PathBuf {
        self.shared.dir.join(format!("{}.png", key))
    }

    /// Producer-role body: runs with no locks held.
    fn produce<F>(&self, key: &str, producer: F, save_empty_tiles: bool) -> MapResult<CachedTile>
    where
        F: FnOnce() -> MapResult<Option<RgbaImage>>,
    {
        let final_path = self.tile_path(key);

        // a tile published by an earlier entry generation (or process)
        // satisfies the request without re-rendering
        if final_path.exists() {
            self.shared.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "adopted existing tile file");
            return Ok(CachedTile {
                key: key.to_string(),
                path: final_path,
            });
        }
        self.shared.misses.fetch_add(1, Ordering::Relaxed);

        let image = producer().map_err(|e| MapError::ProducerFailed(e.to_string()))?;
        let is_empty = match &image {
            None => true,
            Some(img) => img.pixels().all(|p| p.0[3] == 0),
        };

        let bytes = match (&image, is_empty) {
            (Some(img), false) => Some(encode_png(img)?),
            _ if save_empty_tiles => Some(Vec::new()),
            _ => None,
        };

        if let Some(bytes) = bytes {
            publish_file(&final_path, &bytes)?;
            debug!(key, size = bytes.len(), "published tile");
        } else {
            debug!(key, "empty tile, nothing persisted");
        }
        self.shared.produced.fetch_add(1, Ordering::Relaxed);

        Ok(CachedTile {
            key: key.to_string(),
            path: final_path,
        })
    }
}

impl Drop for TileCache {
    fn drop(&mut self) {
        if let Ok(mut index) = self.shared.index.lock() {
            index.shutdown = true;
        }
        self.shared.sweep.notify_all();
        if let Some(handle) = self.sweeper.take() {
            let _ = handle.join();
        }
    }
}

/// Resets a claimed entry on early exit (producer error or panic) so
/// waiters can retry instead of hanging.
struct ProducerGuard<'a> {
    entry: &'a CacheEntry,
    armed: bool,
}

impl ProducerGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProducerGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("tile producer aborted, releasing entry");
        if let Ok(mut state) = self.entry.state.lock() {
            state.status = Status::Absent;
            self.entry.changed.notify_all();
        }
    }
}

/// Stage into the sibling `<dir>_temp` directory, then walk the file to
/// its final name through renames: `<dir>_temp/<name>` →
/// `<dir>_temp/<name>.tmp` → `<dir>/<name>.tmp` → `<dir>/<name>`.
/// The last hop is a same-directory rename, so readers of the final path
/// only ever see complete content.
fn publish_file(final_path: &Path, bytes: &[u8]) -> MapResult<()> {
    let dir = final_path
        .parent()
        .ok_or_else(|| MapError::InvalidCacheDir(final_path.display().to_string()))?;
    let name = final_path
        .file_name()
        .ok_or_else(|| MapError::InvalidCacheDir(final_path.display().to_string()))?;
    let dir_name = dir
        .file_name()
        .ok_or_else(|| MapError::InvalidCacheDir(dir.display().to_string()))?;

    fs::create_dir_all(dir)?;
    let mut temp_dir_name = dir_name.to_os_string();
    temp_dir_name.push("_temp");
    let temp_dir = dir.with_file_name(&temp_dir_name);
    fs::create_dir_all(&temp_dir)?;

    let staged = temp_dir.join(name);
    fs::write(&staged, bytes)?;

    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    let staged_tmp = temp_dir.join(&tmp_name);
    fs::rename(&staged, &staged_tmp)?;

    let landing = dir.join(&tmp_name);
    fs::rename(&staged_tmp, &landing)?;
    fs::rename(&landing, final_path)?;
    Ok(())
}

fn encode_png(img: &RgbaImage) -> MapResult<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::ImageEncoder;

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), image::ColorType::Rgba8)
        .map_err(|e| MapError::Render(e.to_string()))?;
    Ok(buf)
}

/// Periodic eviction of idle keys. Runs every `max_age`, and only once
/// the request map has reached `max_entries`. Entries mid-production are
/// left for the next cycle.
fn spawn_sweeper(shared: Arc<Shared>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut index = shared.index.lock().expect("cache index lock poisoned");
        loop {
            let (guard, _timeout) = shared
                .sweep
                .wait_timeout(index, shared.config.max_age)
                .expect("cache index lock poisoned");
            index = guard;
            if index.shutdown {
                break;
            }
            if index.requests.len() < shared.config.max_entries {
                continue;
            }

            let now = Instant::now();
            let stale: Vec<String> = index
                .requests
                .iter()
                .filter(|(_, last)| now.duration_since(**last) >= shared.config.max_age)
                .map(|(key, _)| key.clone())
                .collect();

            let mut evicted = 0u64;
            for key in stale {
                let producing = index
                    .tiles
                    .get(&key)
                    .map(|entry| {
                        entry
                            .state
                            .lock()
                            .map(|s| s.status == Status::Producing)
                            .unwrap_or(false)
                    })
                    .unwrap_or(false);
                if producing {
                    continue;
                }
                index.tiles.remove(&key);
                index.requests.remove(&key);
                evicted += 1;
            }
            if evicted > 0 {
                shared.evicted.fetch_add(evicted, Ordering::Relaxed);
                debug!(evicted, "swept idle tile cache entries");
            }
        }
    })
}
