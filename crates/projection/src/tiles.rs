//! Slippy-map tile coordinates and grid queries.

use crate::mercator::MAX_LATITUDE;
use geo::{BoundingRect, Intersects};
use geo_types::Geometry;
use map_common::BoundingBox;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A tile coordinate (z/x/y). Tile (0, 0) is the NW corner of the grid;
/// zoom z has 2^z tiles per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Get the parent tile (zoom - 1).
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord {
            z: self.z - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// Get the four children tiles (zoom + 1).
    pub fn children(&self) -> [TileCoord; 4] {
        let x = self.x * 2;
        let y = self.y * 2;
        let z = self.z + 1;
        [
            TileCoord { z, x, y },
            TileCoord { z, x: x + 1, y },
            TileCoord { z, x, y: y + 1 },
            TileCoord {
                z,
                x: x + 1,
                y: y + 1,
            },
        ]
    }

    /// The enclosing tile at a shallower zoom level.
    ///
    /// Returns `self` when `z >= self.z`.
    pub fn ancestor(&self, z: u32) -> TileCoord {
        if z >= self.z {
            return *self;
        }
        let shift = self.z - z;
        TileCoord {
            z,
            x: self.x >> shift,
            y: self.y >> shift,
        }
    }
}

/// Longitude in degrees of the west edge of tile column `x` at zoom `z`.
pub fn tile_to_lon(x: u32, z: u32) -> f64 {
    x as f64 / 2f64.powi(z as i32) * 360.0 - 180.0
}

/// Latitude in degrees of the north edge of tile row `y` at zoom `z`.
pub fn tile_to_lat(y: u32, z: u32) -> f64 {
    (PI - 2.0 * PI * y as f64 / 2f64.powi(z as i32)).sinh().atan() * 180.0 / PI
}

/// The tile containing a lat/lon point at zoom `z`.
///
/// Latitude is clipped to ±85.05112878 and longitude to ±180 before
/// indexing, so poles and the antimeridian land on the edge tiles.
pub fn lat_lon_to_tile(lat: f64, lon: f64, z: u32) -> TileCoord {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let lon = lon.clamp(-180.0, 180.0);
    let n = 2f64.powi(z as i32);
    let max_index = (n - 1.0) as u32;

    let tx = ((lon + 180.0) / 360.0 * n).floor() as i64;
    let lat_rad = lat * PI / 180.0;
    let ty = ((1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln()) / PI) / 2.0 * n).floor() as i64;

    TileCoord {
        z,
        x: (tx.max(0) as u32).min(max_index),
        y: (ty.max(0) as u32).min(max_index),
    }
}

/// Geographic bounds of a tile, in lat/lon degrees.
pub fn tile_bounds(coord: &TileCoord) -> BoundingBox {
    BoundingBox::new(
        tile_to_lon(coord.x, coord.z),
        tile_to_lat(coord.y + 1, coord.z),
        tile_to_lon(coord.x + 1, coord.z),
        tile_to_lat(coord.y, coord.z),
    )
}

/// Tiles at zoom `z` whose rectangle actually intersects `geom`.
///
/// The candidate set is the bounding rectangle of `geom` expressed in tile
/// indices; each candidate is kept only if its polygon intersects the
/// geometry itself.
pub fn intersecting_tiles(geom: &Geometry<f64>, z: u32) -> Vec<TileCoord> {
    let rect = match geom.bounding_rect() {
        Some(r) => r,
        None => return Vec::new(),
    };

    let ul = lat_lon_to_tile(rect.max().y, rect.min().x, z);
    let lr = lat_lon_to_tile(rect.min().y, rect.max().x, z);

    let mut tiles = Vec::new();
    for y in ul.y..=lr.y {
        for x in ul.x..=lr.x {
            let tile = TileCoord { z, x, y };
            if tile_bounds(&tile).to_polygon().intersects(geom) {
                tiles.push(tile);
            }
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, polygon};

    #[test]
    fn test_tile_zero_corners() {
        assert!((tile_to_lat(0, 0) - 85.0511287798).abs() < 1e-9);
        assert_eq!(tile_to_lon(0, 0), -180.0);
        assert!((tile_to_lat(1, 0) + 85.0511287798).abs() < 1e-9);
        assert_eq!(tile_to_lon(1, 0), 180.0);
    }

    #[test]
    fn test_origin_tile_at_zoom_one() {
        let t = lat_lon_to_tile(0.0, 0.0, 1);
        assert_eq!((t.x, t.y), (1, 1));
    }

    #[test]
    fn test_tile_latlon_round_trip() {
        let eps = 1e-7;
        for z in 1..=6 {
            let n = 2u32.pow(z);
            for (x, y) in [(0, 0), (n / 2, n / 2), (n - 1, n - 1), (1, n / 2)] {
                let lat = tile_to_lat(y, z) - eps;
                let lon = tile_to_lon(x, z) + eps;
                let t = lat_lon_to_tile(lat, lon, z);
                assert_eq!((t.x, t.y), (x, y), "z={} x={} y={}", z, x, y);
            }
        }
    }

    #[test]
    fn test_clipping_lands_on_edge_tiles() {
        let t = lat_lon_to_tile(90.0, -200.0, 2);
        assert_eq!((t.x, t.y), (0, 0));
        let t = lat_lon_to_tile(-90.0, 200.0, 2);
        assert_eq!((t.x, t.y), (3, 3));
    }

    #[test]
    fn test_parent_children_ancestor() {
        let tile = TileCoord::new(5, 10, 15);
        let parent = tile.parent().unwrap();
        assert_eq!(parent, TileCoord::new(4, 5, 7));
        assert!(parent.children().contains(&tile));
        assert_eq!(tile.ancestor(3), TileCoord::new(3, 2, 3));
        assert_eq!(tile.ancestor(5), tile);
        assert!(TileCoord::new(0, 0, 0).parent().is_none());
    }

    #[test]
    fn test_tile_bounds_nesting() {
        let parent = TileCoord::new(3, 2, 5);
        let pb = tile_bounds(&parent);
        for child in parent.children() {
            let cb = tile_bounds(&child);
            assert!(pb.intersects(&cb));
            assert!(cb.width() < pb.width());
        }
    }

    #[test]
    fn test_intersecting_tiles_point() {
        let geom = Geometry::Point(point!(x: 0.5, y: 0.5));
        let tiles = intersecting_tiles(&geom, 2);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0], TileCoord::new(2, 2, 1));
    }

    #[test]
    fn test_intersecting_tiles_polygon_prunes_corners() {
        // A thin diagonal strip across several tiles: the enclosing tile
        // rectangle contains tiles the strip itself never touches.
        let geom = Geometry::Polygon(polygon![
            (x: -170.0, y: 80.0),
            (x: -168.0, y: 80.0),
            (x: 170.0, y: -80.0),
            (x: 168.0, y: -80.0),
        ]);
        let tiles = intersecting_tiles(&geom, 3);
        let enumerated = 8 * 8;
        assert!(!tiles.is_empty());
        assert!(tiles.len() < enumerated, "expected pruning, got {}", tiles.len());
    }

    #[test]
    fn test_intersecting_tiles_world_at_zoom_zero() {
        let geom = Geometry::Polygon(
            map_common::BoundingBox::new(-10.0, -10.0, 10.0, 10.0).to_polygon(),
        );
        let tiles = intersecting_tiles(&geom, 0);
        assert_eq!(tiles, vec![TileCoord::new(0, 0, 0)]);
    }
}
