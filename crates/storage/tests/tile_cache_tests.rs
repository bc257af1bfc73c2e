//! Concurrency and persistence tests for the disk tile cache.

use image::RgbaImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use storage::{CacheConfig, TileCache};

fn red_tile() -> RgbaImage {
    let mut img = RgbaImage::new(1, 1);
    img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
    img
}

fn transparent_tile() -> RgbaImage {
    RgbaImage::new(8, 8)
}

// ============================================================================
// Basic produce / hit behavior
// ============================================================================

#[test]
fn test_produce_then_hit() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();
    let calls = AtomicUsize::new(0);

    let tile = cache
        .get_or_create("0/0/0", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(red_tile()))
        })
        .unwrap();
    assert!(tile.exists());
    assert!(tile.read().unwrap().unwrap().len() > 0);

    let again = cache
        .get_or_create("0/0/0", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(red_tile()))
        })
        .unwrap();
    assert_eq!(tile.path(), again.path());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_nested_key_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();

    let tile = cache
        .get_or_create("layer/3/2/1", || Ok(Some(red_tile())))
        .unwrap();
    assert!(tile.exists());
    assert_eq!(tile.path(), dir.path().join("layer/3/2/1.png"));
    // staging directory sits beside the final one
    assert!(dir.path().join("layer/3/2_temp").is_dir());
    // nothing left in staging
    assert_eq!(
        std::fs::read_dir(dir.path().join("layer/3/2_temp"))
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn test_produced_file_decodes() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();

    let tile = cache
        .get_or_create("t/1", || Ok(Some(red_tile())))
        .unwrap();
    let bytes = tile.read().unwrap().unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

// ============================================================================
// Single-producer protocol
// ============================================================================

#[test]
fn test_concurrent_requests_invoke_producer_once() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(TileCache::new(dir.path()).unwrap());
    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let calls = Arc::clone(&calls);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            cache
                .get_or_create("a/1/0/0", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(50));
                    Ok(Some(red_tile()))
                })
                .unwrap()
        }));
    }

    let tiles: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let first = tiles[0].path().to_path_buf();
    for tile in &tiles {
        assert_eq!(tile.path(), first);
        assert!(tile.exists());
    }
    assert!(std::fs::metadata(&first).unwrap().len() > 0);
}

#[test]
fn test_readers_never_observe_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(TileCache::new(dir.path()).unwrap());
    let final_path = dir.path().join("probe/5/5.png");

    let probe_path = final_path.clone();
    let stop = Arc::new(AtomicUsize::new(0));
    let probe_stop = Arc::clone(&stop);
    let probe = thread::spawn(move || {
        let mut observed = 0usize;
        while probe_stop.load(Ordering::SeqCst) == 0 {
            if let Ok(bytes) = std::fs::read(&probe_path) {
                // any visible file must already be a complete PNG
                assert!(image::load_from_memory(&bytes).is_ok());
                observed += 1;
            }
        }
        observed
    });

    cache
        .get_or_create("probe/5/5", || {
            thread::sleep(Duration::from_millis(80));
            let mut img = RgbaImage::new(64, 64);
            for p in img.pixels_mut() {
                p.0 = [0, 128, 255, 255];
            }
            Ok(Some(img))
        })
        .unwrap();
    // give the probe a chance to see the published file
    thread::sleep(Duration::from_millis(20));
    stop.store(1, Ordering::SeqCst);
    let observed = probe.join().unwrap();
    assert!(observed > 0, "probe never saw the published file");
}

#[test]
fn test_producer_failure_releases_waiters() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(TileCache::new(dir.path()).unwrap());

    let failing = Arc::clone(&cache);
    let first = thread::spawn(move || {
        failing.get_or_create("flaky", || {
            thread::sleep(Duration::from_millis(30));
            Err(map_common::MapError::Render("boom".to_string()))
        })
    });
    thread::sleep(Duration::from_millis(10));

    // second requester must not hang; after the failure it retries and wins
    let tile = cache
        .get_or_create("flaky", || Ok(Some(red_tile())))
        .unwrap();
    assert!(tile.exists());
    assert!(first.join().unwrap().is_err());
}

// ============================================================================
// Empty-tile policy
// ============================================================================

#[test]
fn test_empty_tile_not_saved_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();

    let tile = cache
        .get_or_create("void/1", || Ok(Some(transparent_tile())))
        .unwrap();
    assert!(!tile.exists());
    assert_eq!(tile.read().unwrap(), None);
    assert_eq!(tile.path(), dir.path().join("void/1.png"));
}

#[test]
fn test_empty_tile_saved_as_zero_bytes_when_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();

    let tile = cache
        .get_or_create_with("void/2", || Ok(None), true)
        .unwrap();
    assert!(tile.exists());
    assert_eq!(std::fs::metadata(tile.path()).unwrap().len(), 0);
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn test_remove_is_idempotent_and_reproduces() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();
    let calls = AtomicUsize::new(0);

    let produce = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(red_tile()))
    };
    let tile = cache.get_or_create("r/9", produce).unwrap();
    assert!(tile.exists());

    cache.remove("r/9").unwrap();
    cache.remove("r/9").unwrap();
    assert!(!tile.exists());

    let tile = cache
        .get_or_create("r/9", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(red_tile()))
        })
        .unwrap();
    assert!(tile.exists());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_remove_waits_for_in_flight_producer() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(TileCache::new(dir.path()).unwrap());

    let producer_cache = Arc::clone(&cache);
    let handle = thread::spawn(move || {
        producer_cache
            .get_or_create("slow/1", || {
                thread::sleep(Duration::from_millis(80));
                Ok(Some(red_tile()))
            })
            .unwrap()
    });
    thread::sleep(Duration::from_millis(20));

    // remove() runs while the producer is mid-flight: it must wait for
    // publication, then delete
    cache.remove("slow/1").unwrap();
    let tile = handle.join().unwrap();
    assert!(!tile.exists());
}

// ============================================================================
// Sweeper
// ============================================================================

#[test]
fn test_sweeper_evicts_idle_entries() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        max_entries: 2,
        max_age: Duration::from_millis(60),
    };
    let cache = TileCache::with_config(dir.path(), config).unwrap();

    cache.get_or_create("s/1", || Ok(Some(red_tile()))).unwrap();
    cache.get_or_create("s/2", || Ok(Some(red_tile()))).unwrap();
    assert_eq!(cache.len(), 2);

    // both entries idle past max_age; the sweep threshold (2 keys) is met
    thread::sleep(Duration::from_millis(200));
    assert_eq!(cache.len(), 0);
    assert!(cache.stats().evicted >= 2);

    // eviction drops bookkeeping, not files
    assert!(dir.path().join("s/1.png").exists());
}

#[test]
fn test_sweeper_keeps_fresh_entries() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        max_entries: 1,
        max_age: Duration::from_millis(150),
    };
    let cache = TileCache::with_config(dir.path(), config).unwrap();

    cache.get_or_create("f/1", || Ok(Some(red_tile()))).unwrap();
    // keep the entry fresh across a few sweep periods
    for _ in 0..4 {
        thread::sleep(Duration::from_millis(50));
        cache.get_or_create("f/1", || Ok(Some(red_tile()))).unwrap();
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_stats_track_hits_and_misses() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path()).unwrap();

    cache.get_or_create("m/1", || Ok(Some(red_tile()))).unwrap();
    cache.get_or_create("m/1", || Ok(Some(red_tile()))).unwrap();
    cache.get_or_create("m/1", || Ok(Some(red_tile()))).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.produced, 1);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_invalid_cache_dir_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"file, not a directory").unwrap();

    let err = TileCache::new(blocker.join("sub")).unwrap_err();
    assert!(matches!(err, map_common::MapError::InvalidCacheDir(_)));
}
