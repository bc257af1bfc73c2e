//! Raster tile rendering.
//!
//! - `frame`: per-tile drawing surface with the world→pixel affine
//! - `heatmap`: point-density compositing onto a color ramp
//! - `contour`: iso-alpha contour extraction from rendered heatmaps
//! - `trace`: binary-mask vectorization (edge walking + spline fitting)

pub mod contour;
pub mod frame;
pub mod gradient;
pub mod heatmap;
pub mod trace;

pub use contour::{Contour, ContourExtractor};
pub use frame::TileFrame;
pub use heatmap::HeatmapRenderer;
