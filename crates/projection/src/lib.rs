//! Web-Mercator projection math and slippy-map tile grid arithmetic.
//!
//! Implements the EPSG:3857 forward/inverse transforms from scratch and
//! the tile (x, y, z) indexing built on top of them.

pub mod mercator;
pub mod tiles;

pub use mercator::{
    lat_from_merc_y, lon_from_merc_x, merc_x_from_lon, merc_y_from_lat, MAX_LATITUDE, ORIGIN_SHIFT,
};
pub use tiles::{intersecting_tiles, lat_lon_to_tile, tile_bounds, tile_to_lat, tile_to_lon, TileCoord};
