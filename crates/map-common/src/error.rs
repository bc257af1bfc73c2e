//! Error types shared across the tile-rendering crates.

use thiserror::Error;

/// Result type alias using MapError.
pub type MapResult<T> = Result<T, MapError>;

/// Primary error type for tile, heatmap and cache operations.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("Unsupported projection: EPSG:{0}")]
    UnsupportedProjection(i32),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Cache directory cannot be created: {0}")]
    InvalidCacheDir(String),

    #[error("Malformed WKT: {0}")]
    WktParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tile producer failed: {0}")]
    ProducerFailed(String),

    #[error("Rendering failed: {0}")]
    Render(String),
}
