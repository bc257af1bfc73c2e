//! Heatmap rendering: point-density compositing remapped onto a color ramp.

use crate::contour::{Contour, ContourExtractor};
use crate::gradient;
use image::RgbaImage;
use map_common::Color;
use rayon::prelude::*;
use std::collections::HashMap;
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, GradientStop, Paint, PathBuilder, Pixmap, PixmapPaint,
    Point, RadialGradient, SpreadMode, Transform,
};

/// An aggregated density point: pixel location plus occurrence count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatPoint {
    pub x: i32,
    pub y: i32,
    pub count: u32,
}

/// Composites point densities into a raster and remaps the result onto a
/// color ramp.
#[derive(Debug, Clone)]
pub struct HeatmapRenderer {
    width: u32,
    height: u32,
    points: Vec<HeatPoint>,
    index: HashMap<(i32, i32), usize>,
    max_occurrence: u32,
    explicit_max: bool,
    radius: u32,
    intensity: f64,
    blur: f64,
    ramp: Option<Vec<u32>>,
}

impl HeatmapRenderer {
    /// An empty heatmap of the given size with the default ramp and a
    /// 32 px point radius.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            points: Vec::new(),
            index: HashMap::new(),
            max_occurrence: 1,
            explicit_max: false,
            radius: 32,
            intensity: 1.0,
            blur: 1.0,
            ramp: Some(gradient::default_ramp()),
        }
    }

    /// Build a heatmap from raw pixel points: duplicates aggregate into
    /// counts, the canvas size is the points' bounding-box extent, and
    /// `max_occurrence` starts at the largest aggregated count.
    pub fn from_points(points: &[(i32, i32)], radius: u32) -> Self {
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for (x, y) in points {
            min_x = min_x.min(*x);
            min_y = min_y.min(*y);
            max_x = max_x.max(*x);
            max_y = max_y.max(*y);
        }
        let (width, height) = if points.is_empty() {
            (1, 1)
        } else {
            (
                (max_x - min_x + 1).max(1) as u32,
                (max_y - min_y + 1).max(1) as u32,
            )
        };

        let mut heatmap = Self::new(width, height);
        heatmap.radius = radius.max(1);
        heatmap.add_points(points);
        heatmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn max_occurrence(&self) -> u32 {
        self.max_occurrence
    }

    pub fn points(&self) -> &[HeatPoint] {
        &self.points
    }

    pub fn ramp(&self) -> Option<&[u32]> {
        self.ramp.as_deref()
    }

    /// Point radius in pixels; values below 1 are ignored.
    pub fn set_radius(&mut self, radius: u32) {
        if radius >= 1 {
            self.radius = radius;
        }
    }

    /// Per-point opacity multiplier in (0, 1]; out-of-range values are
    /// ignored.
    pub fn set_intensity(&mut self, intensity: f64) {
        if intensity > 0.0 && intensity <= 1.0 {
            self.intensity = intensity;
        }
    }

    /// Edge falloff in (0, 1]; out-of-range values are ignored.
    pub fn set_blur(&mut self, blur: f64) {
        if blur > 0.0 && blur <= 1.0 {
            self.blur = blur;
        }
    }

    /// Pin the normalization denominator; values below 1 are ignored.
    /// Once set, insertion no longer auto-raises it.
    pub fn set_max_occurrence(&mut self, max: u32) {
        if max >= 1 {
            self.max_occurrence = max;
            self.explicit_max = true;
        }
    }

    /// Replace the ramp by blending the given stop colors.
    pub fn set_colors(&mut self, colors: &[Color]) {
        if let Some(ramp) = gradient::build_ramp(colors) {
            self.ramp = Some(ramp);
        }
    }

    /// Replace the ramp from hex color strings; unparseable entries are
    /// skipped.
    pub fn set_colors_hex(&mut self, hex: &[&str]) {
        let colors: Vec<Color> = hex.iter().filter_map(|h| Color::from_hex(h)).collect();
        self.set_colors(&colors);
    }

    /// Install a pre-built ramp of packed RGBA words. An empty ramp
    /// disables remapping entirely.
    pub fn set_ramp(&mut self, ramp: Vec<u32>) {
        self.ramp = if ramp.is_empty() { None } else { Some(ramp) };
    }

    /// Read a ramp directly out of an image: column 0 top-to-bottom when
    /// `use_rows`, row 0 left-to-right otherwise.
    pub fn set_colors_from_image(&mut self, img: &RgbaImage, use_rows: bool) {
        let ramp: Vec<u32> = if use_rows {
            (0..img.height())
                .map(|y| {
                    let p = img.get_pixel(0, y).0;
                    Color::rgba(p[0], p[1], p[2], p[3]).to_u32()
                })
                .collect()
        } else {
            (0..img.width())
                .map(|x| {
                    let p = img.get_pixel(x, 0).0;
                    Color::rgba(p[0], p[1], p[2], p[3]).to_u32()
                })
                .collect()
        };
        self.set_ramp(ramp);
    }

    /// Add points, aggregating duplicates at the same pixel into counts.
    pub fn add_points(&mut self, points: &[(i32, i32)]) {
        for &(x, y) in points {
            let count = match self.index.get(&(x, y)) {
                Some(&i) => {
                    self.points[i].count += 1;
                    self.points[i].count
                }
                None => {
                    self.index.insert((x, y), self.points.len());
                    self.points.push(HeatPoint { x, y, count: 1 });
                    1
                }
            };
            if !self.explicit_max && count > self.max_occurrence {
                self.max_occurrence = count;
            }
        }
    }

    /// Render the composited, ramp-mapped raster.
    pub fn render(&self) -> RgbaImage {
        let mut canvas =
            Pixmap::new(self.width, self.height).expect("failed to allocate heatmap canvas");
        if self.ramp.is_some() {
            canvas.fill(tiny_skia::Color::WHITE);
        }

        let stamp = self.stamp();
        for p in &self.points {
            let opacity =
                (p.count as f64 / self.max_occurrence as f64 * self.intensity).min(1.0) as f32;
            let paint = PixmapPaint {
                opacity,
                blend_mode: BlendMode::SourceOver,
                quality: FilterQuality::Nearest,
            };
            canvas.draw_pixmap(
                p.x - self.radius as i32,
                p.y - self.radius as i32,
                stamp.as_ref(),
                &paint,
                Transform::identity(),
                None,
            );
        }

        let mut img = RgbaImage::new(self.width, self.height);
        for (src, dst) in canvas.pixels().iter().zip(img.pixels_mut()) {
            let c = src.demultiply();
            dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
        }

        if let Some(ramp) = &self.ramp {
            remap(&mut img, ramp);
        }
        img
    }

    /// Extract iso-alpha contours at the given percentile breakpoints.
    /// An empty slice selects the defaults (80, half-between, minimum).
    pub fn contours(&self, percentiles: &[f64]) -> Vec<Contour> {
        let defaults = [80.0, 40.0, 0.0];
        let breaks = if percentiles.is_empty() {
            &defaults[..]
        } else {
            percentiles
        };
        ContourExtractor::new(self).extract(breaks)
    }

    /// The radial falloff stamp: a circle of diameter `2 * radius`,
    /// opaque black out to 10% of the radius, fading to the blur-derived
    /// edge alpha.
    fn stamp(&self) -> Pixmap {
        let d = (self.radius * 2).max(1);
        let mut pm = Pixmap::new(d, d).expect("failed to allocate stamp");
        let r = self.radius as f32;
        let edge_alpha = (255.0 * (1.0 - self.blur)).round() as u8;

        let stops = vec![
            GradientStop::new(0.0, tiny_skia::Color::from_rgba8(0, 0, 0, 255)),
            GradientStop::new(0.1, tiny_skia::Color::from_rgba8(0, 0, 0, 255)),
            GradientStop::new(1.0, tiny_skia::Color::from_rgba8(0, 0, 0, edge_alpha)),
        ];
        let mut paint = Paint::default();
        paint.anti_alias = true;
        if let Some(shader) = RadialGradient::new(
            Point::from_xy(r, r),
            Point::from_xy(r, r),
            r,
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ) {
            paint.shader = shader;
        }

        if let Some(circle) = PathBuilder::from_circle(r, r, r) {
            pm.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
        }
        pm
    }

    /// Grow the canvas by `offset` on every side and shift all points
    /// with it. Used by contour extraction.
    pub(crate) fn expand(&mut self, offset: u32) {
        self.width += offset * 2;
        self.height += offset * 2;
        let d = offset as i32;
        self.index.clear();
        for (i, p) in self.points.iter_mut().enumerate() {
            p.x += d;
            p.y += d;
            self.index.insert((p.x, p.y), i);
        }
    }
}

/// Invert RGB and replace each pixel with the ramp entry selected by the
/// luminance product. Rows are independent, so they run in parallel.
fn remap(img: &mut RgbaImage, ramp: &[u32]) {
    let last = (ramp.len() - 1) as f64;
    let row_bytes = img.width() as usize * 4;
    let buf: &mut [u8] = img;
    buf.par_chunks_mut(row_bytes).for_each(|row| {
        for px in row.chunks_exact_mut(4) {
            let r = 255 - px[0];
            let g = 255 - px[1];
            let b = 255 - px[2];
            let multiplier =
                (r as f64 * g as f64 * b as f64) / (255.0 * 255.0 * 255.0);
            let c = Color::from_u32(ramp[(multiplier * last).round() as usize]);
            px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    });
}
