//! Common types and utilities shared across the tile-rendering crates.

pub mod bbox;
pub mod color;
pub mod error;
pub mod style;

pub use bbox::{format_coord, BoundingBox};
pub use color::Color;
pub use error::{MapError, MapResult};
pub use style::{FontSpec, HorizontalAlignment, MapStyle, VerticalAlignment};
