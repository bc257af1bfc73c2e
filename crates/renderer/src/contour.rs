//! Iso-alpha contour extraction from rendered heatmaps.
//!
//! The extractor re-renders the heatmap on an expanded canvas with a
//! white→red ramp (so the alpha channel carries density alone), blurs it,
//! derives alpha thresholds from the density distribution at the input
//! points, and vectorizes each threshold's level set.

use crate::heatmap::HeatmapRenderer;
use crate::trace::{trace_mask, TraceOptions};
use map_common::Color;
use rayon::prelude::*;
use tracing::debug;

/// One iso-density level: the alpha threshold it was cut at and the
/// closed polygon outlines of its level set, in heatmap pixel
/// coordinates.
#[derive(Debug, Clone)]
pub struct Contour {
    pub threshold: u8,
    pub polygons: Vec<Vec<(f64, f64)>>,
}

/// Extracts iso-alpha contours from a heatmap.
pub struct ContourExtractor<'a> {
    heatmap: &'a HeatmapRenderer,
}

impl<'a> ContourExtractor<'a> {
    pub fn new(heatmap: &'a HeatmapRenderer) -> Self {
        Self { heatmap }
    }

    /// One `Contour` per percentile breakpoint. Percentile 0 cuts at the
    /// minimum observed density.
    pub fn extract(&self, percentiles: &[f64]) -> Vec<Contour> {
        if self.heatmap.points().is_empty() {
            return percentiles
                .iter()
                .map(|_| Contour {
                    threshold: 0,
                    polygons: Vec::new(),
                })
                .collect();
        }

        let radius = self.heatmap.radius();
        let offset = radius + radius;

        // the outermost level set must not clip at the canvas edge
        let mut staged = self.heatmap.clone();
        staged.expand(offset);
        staged.set_colors(&[Color::WHITE, Color::RED]);

        let rendered = staged.render();
        let sigma = (radius as f32).max(1.0);
        let blurred = imageproc::filter::gaussian_blur_f32(&rendered, sigma);

        let width = blurred.width();
        let height = blurred.height();

        let mut samples: Vec<u8> = staged
            .points()
            .iter()
            .map(|p| {
                let x = p.x.clamp(0, width as i32 - 1) as u32;
                let y = p.y.clamp(0, height as i32 - 1) as u32;
                blurred.get_pixel(x, y).0[3]
            })
            .collect();
        samples.sort_unstable();

        let opts = TraceOptions {
            ltres: 2.0,
            qtres: 2.0,
            pathomit: 8,
        };
        let w = width as usize;
        let h = height as usize;
        let alpha: Vec<u8> = blurred.pixels().map(|p| p.0[3]).collect();

        let mut contours = Vec::with_capacity(percentiles.len());
        for &p in percentiles {
            let threshold = percentile_value(&samples, p);

            let mut mask = vec![0u8; w * h];
            mask.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
                let line = &alpha[y * w..(y + 1) * w];
                for (cell, a) in row.iter_mut().zip(line) {
                    *cell = (*a >= threshold) as u8;
                }
            });

            let polygons: Vec<Vec<(f64, f64)>> = trace_mask(&mask, w, h, &opts)
                .into_iter()
                .map(|ring| {
                    ring.into_iter()
                        .map(|(x, y)| (x - offset as f64, y - offset as f64))
                        .collect()
                })
                .collect();

            debug!(
                percentile = p,
                threshold,
                polygons = polygons.len(),
                "extracted contour level"
            );
            contours.push(Contour { threshold, polygons });
        }
        contours
    }
}

/// `sorted[ceil(p/100 · N) - 1]`, clamped into range so percentile 0
/// selects the minimum.
fn percentile_value(sorted: &[u8], percentile: f64) -> u8 {
    let n = sorted.len() as f64;
    let idx = ((percentile / 100.0 * n).ceil() as isize - 1).clamp(0, sorted.len() as isize - 1);
    sorted[idx as usize]
}
