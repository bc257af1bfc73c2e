//! Bounding box types and operations.

use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// For geographic coordinates (EPSG:4326) the values are degrees; for
/// projected coordinates (EPSG:3857) they are meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// The boundary ring as coordinate pairs, starting at the NE corner
    /// and closing back on it.
    pub fn ring(&self) -> [(f64, f64); 5] {
        [
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
        ]
    }

    /// Convert to a polygon for geometry predicates.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(LineString::from(self.ring().to_vec()), vec![])
    }

    /// Serialize the boundary as a WKT POLYGON.
    ///
    /// Coordinates carry at most 8 fractional digits with trailing zeros
    /// trimmed, so integral bounds serialize as bare integers.
    pub fn to_wkt(&self) -> String {
        let coords: Vec<String> = self
            .ring()
            .iter()
            .map(|(x, y)| format!("{} {}", format_coord(*x), format_coord(*y)))
            .collect();
        format!("POLYGON(({}))", coords.join(","))
    }
}

/// Format a coordinate with at most 8 fractional digits.
///
/// Trailing zeros (and a bare trailing decimal point) are trimmed.
pub fn format_coord(v: f64) -> String {
    let mut s = format!("{:.8}", v);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
