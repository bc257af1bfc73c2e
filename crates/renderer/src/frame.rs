//! Per-tile drawing surface with the world→pixel affine transform.

use geo::Intersects;
use geo_types::{Geometry, Polygon};
use image::RgbaImage;
use map_common::{BoundingBox, Color, MapError, MapResult};
use once_cell::sync::OnceCell;
use projection::mercator;
use std::str::FromStr;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

const SRID_WEB_MERCATOR: i32 = 3857;
const SRID_WGS84: i32 = 4326;

/// Pixel offsets this close to zero collapse to exactly zero, keeping tile
/// edges addressable without a one-ulp sign flip.
const SNAP_EPSILON: f64 = 1e-8;

/// A fixed-extent raster tile: immutable georeferencing plus a drawing
/// surface addressed in lat/lon degrees.
#[derive(Debug)]
pub struct TileFrame {
    srid: i32,
    width: u32,
    height: u32,
    bounds: BoundingBox,
    ul_x: f64,
    ul_y: f64,
    res_x: f64,
    res_y: f64,
    wkt: String,
    geometry: OnceCell<Polygon<f64>>,
    surface: Pixmap,
}

impl TileFrame {
    /// Create a frame covering `(min_x, min_y)..(max_x, max_y)` in the
    /// units of `srid` (meters for 3857, degrees for 4326), rendered at
    /// `width × height` pixels.
    pub fn new(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        width: u32,
        height: u32,
        srid: i32,
    ) -> MapResult<Self> {
        if width == 0 || height == 0 {
            return Err(MapError::InvalidCoordinates(format!(
                "zero-sized frame: {}x{}",
                width, height
            )));
        }
        if min_x > max_x || min_y > max_y {
            return Err(MapError::InvalidCoordinates(format!(
                "min exceeds max: ({}, {})..({}, {})",
                min_x, min_y, max_x, max_y
            )));
        }

        let (bounds, ul_x, ul_y, res_x, res_y) = match srid {
            SRID_WEB_MERCATOR => {
                let west = mercator::lon_from_merc_x(min_x);
                let east = mercator::lon_from_merc_x(max_x);
                let south = mercator::lat_from_merc_y(min_y);
                let north = mercator::lat_from_merc_y(max_y);
                validate_latlon(west, east, south, north)?;

                let res_x = width as f64 / (max_x - min_x).abs();
                let res_y = height as f64 / (max_y - min_y).abs();
                (
                    BoundingBox::new(west, south, east, north),
                    min_x,
                    max_y,
                    res_x,
                    res_y,
                )
            }
            SRID_WGS84 => {
                let min_x = min_x.clamp(-180.0, 180.0);
                let max_x = max_x.clamp(-180.0, 180.0);
                let min_y = min_y.clamp(-90.0, 90.0);
                let max_y = max_y.clamp(-90.0, 90.0);
                if min_x == max_x || min_y == max_y {
                    return Err(MapError::InvalidCoordinates(
                        "degenerate extent after clamping".to_string(),
                    ));
                }

                let ul_x = min_x + 180.0;
                let ul_y = fold_lat(max_y);
                let res_x = width as f64 / ((max_x + 180.0) - ul_x);
                // negative: the folded axis grows north, pixels grow south
                let res_y = height as f64 / (fold_lat(min_y) - ul_y);
                (
                    BoundingBox::new(min_x, min_y, max_x, max_y),
                    ul_x,
                    ul_y,
                    res_x,
                    res_y,
                )
            }
            other => return Err(MapError::UnsupportedProjection(other)),
        };

        let surface = Pixmap::new(width, height).ok_or_else(|| {
            MapError::Render(format!("cannot allocate {}x{} surface", width, height))
        })?;

        Ok(Self {
            srid,
            width,
            height,
            wkt: bounds.to_wkt(),
            bounds,
            ul_x,
            ul_y,
            res_x,
            res_y,
            geometry: OnceCell::new(),
            surface,
        })
    }

    pub fn srid(&self) -> i32 {
        self.srid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn north(&self) -> f64 {
        self.bounds.max_y
    }

    pub fn south(&self) -> f64 {
        self.bounds.min_y
    }

    pub fn east(&self) -> f64 {
        self.bounds.max_x
    }

    pub fn west(&self) -> f64 {
        self.bounds.min_x
    }

    /// The geographic bounds as a WKT POLYGON, NE corner first.
    pub fn bounds_wkt(&self) -> &str {
        &self.wkt
    }

    /// The boundary polygon, realized on first use.
    pub fn geometry(&self) -> &Polygon<f64> {
        self.geometry.get_or_init(|| self.bounds.to_polygon())
    }

    /// Whether the frame's bounds intersect the given WKT geometry.
    pub fn intersects(&self, other_wkt: &str) -> MapResult<bool> {
        let parsed = wkt::Wkt::<f64>::from_str(other_wkt)
            .map_err(|e| MapError::WktParse(e.to_string()))?;
        let geom = Geometry::try_from(parsed).map_err(|e| MapError::WktParse(e.to_string()))?;
        Ok(self.geometry().intersects(&geom))
    }

    /// Fill the entire surface with an opaque color.
    pub fn set_background(&mut self, r: u8, g: u8, b: u8) {
        self.surface
            .fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
    }

    /// Write a single pixel at the projected location, if it lands on the
    /// surface.
    pub fn add_pixel(&mut self, lat: f64, lon: f64, color: Color) {
        let (px, py) = self.pixel(lat, lon);
        if px < 0 || py < 0 || px >= self.width as i64 || py >= self.height as i64 {
            return;
        }
        let p = tiny_skia::ColorU8::from_rgba(color.r, color.g, color.b, color.a).premultiply();
        let idx = py as usize * self.width as usize + px as usize;
        self.surface.pixels_mut()[idx] = p;
    }

    /// Draw an antialiased filled circle of the given diameter, centered
    /// at the projected location.
    pub fn add_point(&mut self, lat: f64, lon: f64, color: Color, size: u32) {
        if size == 0 {
            return;
        }
        let (x, y) = self.project(lat, lon);
        let radius = size as f32 / 2.0;
        if let Some(path) = PathBuilder::from_circle(x as f32, y as f32, radius) {
            let mut paint = Paint::default();
            paint.set_color_rgba8(color.r, color.g, color.b, color.a);
            paint.anti_alias = true;
            self.surface
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    /// Draw a polygon given as (lat, lon) vertices. The interior is filled
    /// first when `fill_color` is present, then the outline is stroked
    /// when `line_color` is present.
    pub fn add_polygon(
        &mut self,
        ring: &[(f64, f64)],
        line_color: Option<Color>,
        fill_color: Option<Color>,
    ) {
        if ring.len() < 2 {
            return;
        }
        let mut pb = PathBuilder::new();
        for (i, (lat, lon)) in ring.iter().enumerate() {
            let (x, y) = self.project(*lat, *lon);
            if i == 0 {
                pb.move_to(x as f32, y as f32);
            } else {
                pb.line_to(x as f32, y as f32);
            }
        }
        pb.close();
        let path = match pb.finish() {
            Some(p) => p,
            None => return,
        };

        if let Some(fill) = fill_color {
            let mut paint = Paint::default();
            paint.set_color_rgba8(fill.r, fill.g, fill.b, fill.a);
            paint.anti_alias = true;
            self.surface
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        if let Some(line) = line_color {
            let mut paint = Paint::default();
            paint.set_color_rgba8(line.r, line.g, line.b, line.a);
            paint.anti_alias = true;
            let stroke = Stroke::default();
            self.surface
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Copy of the surface as a straight-alpha RGBA image.
    pub fn image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width, self.height);
        for (src, dst) in self.surface.pixels().iter().zip(img.pixels_mut()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }
        img
    }

    /// PNG-encode the surface.
    pub fn png(&self) -> MapResult<Vec<u8>> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(self.image())
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageOutputFormat::Png)
            .map_err(|e| MapError::Render(e.to_string()))?;
        Ok(buf)
    }

    /// Project lat/lon degrees to fractional pixel coordinates.
    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        match self.srid {
            SRID_WEB_MERCATOR => {
                let mx = mercator::merc_x_from_lon(lon);
                let my = mercator::merc_y_from_lat(lat);
                ((mx - self.ul_x) * self.res_x, (self.ul_y - my) * self.res_y)
            }
            _ => {
                let x = (lon + 180.0 - self.ul_x) * self.res_x;
                let mut y = (fold_lat(lat) - self.ul_y) * self.res_y;
                if y.abs() < SNAP_EPSILON {
                    y = 0.0;
                }
                (x, y)
            }
        }
    }

    /// Project to integer pixels, rounding half away from zero.
    fn pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let (x, y) = self.project(lat, lon);
        (x.round() as i64, y.round() as i64)
    }
}

/// The 4326 Y-axis fold: invert, then rebase onto the 0..180 span.
fn fold_lat(lat: f64) -> f64 {
    let v = -lat;
    90.0 - v
}

fn validate_latlon(west: f64, east: f64, south: f64, north: f64) -> MapResult<()> {
    let eps = 1e-6;
    if west < -180.0 - eps || east > 180.0 + eps || south < -90.0 - eps || north > 90.0 + eps {
        return Err(MapError::InvalidCoordinates(format!(
            "bounds outside valid range: ({}, {})..({}, {})",
            west, south, east, north
        )));
    }
    Ok(())
}
