//! Cache tuning knobs.

use std::time::Duration;

/// Sizing and aging parameters for [`crate::TileCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Request-tracking threshold: the sweeper only evicts once at least
    /// this many distinct keys have been requested.
    pub max_entries: usize,
    /// Entries whose last request is older than this are evicted; also
    /// the sweep period.
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_age: Duration::from_millis(120_000),
        }
    }
}

impl CacheConfig {
    /// Read overrides from `TILE_CACHE_MAX_ENTRIES` and
    /// `TILE_CACHE_MAX_AGE_MS`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_entries = std::env::var("TILE_CACHE_MAX_ENTRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_entries);

        let max_age = std::env::var("TILE_CACHE_MAX_AGE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.max_age);

        Self {
            max_entries,
            max_age,
        }
    }
}
