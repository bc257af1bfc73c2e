//! Color-ramp construction for heatmap rendering.

use map_common::Color;

/// Nominal number of entries in a generated ramp. The actual length is
/// `num_steps * round(500 / num_steps)`, which can differ slightly when
/// the step count does not divide 500.
pub const RAMP_SIZE: usize = 500;

/// Build a color ramp by blending between consecutive stop colors.
///
/// Each of the `len - 1` segments contributes `round(500 / segments)`
/// entries. Alpha ramps linearly from 0 to 255 across the first segment;
/// every later entry is fully opaque.
///
/// Returns `None` for fewer than two stops.
pub fn build_ramp(colors: &[Color]) -> Option<Vec<u32>> {
    if colors.len() < 2 {
        return None;
    }

    let num_steps = colors.len() - 1;
    let per_segment = (RAMP_SIZE as f64 / num_steps as f64).round() as usize;
    let mut ramp = Vec::with_capacity(num_steps * per_segment);

    for step in 0..num_steps {
        let from = colors[step];
        let to = colors[step + 1];
        for i in 0..per_segment {
            let t = if per_segment > 1 {
                i as f64 / (per_segment - 1) as f64
            } else {
                0.0
            };
            let mut c = from.lerp(to, t);
            c.a = if step == 0 {
                (t * 255.0).round() as u8
            } else {
                255
            };
            ramp.push(c.to_u32());
        }
    }
    Some(ramp)
}

/// The default heatmap ramp: black through cyan, green and yellow to red.
pub fn default_ramp() -> Vec<u32> {
    build_ramp(&[
        Color::BLACK,
        Color::CYAN,
        Color::GREEN,
        Color::YELLOW,
        Color::RED,
    ])
    .expect("static stop list")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ramp_shape() {
        let ramp = default_ramp();
        assert_eq!(ramp.len(), 500); // 4 segments of 125

        let first = Color::from_u32(ramp[0]);
        let last = Color::from_u32(*ramp.last().unwrap());
        assert_eq!((first.r, first.g, first.b, first.a), (0, 0, 0, 0));
        assert_eq!((last.r, last.g, last.b, last.a), (255, 0, 0, 255));
    }

    #[test]
    fn test_alpha_ramps_in_first_segment_only() {
        let ramp = build_ramp(&[Color::BLACK, Color::CYAN, Color::RED]).unwrap();
        assert_eq!(ramp.len(), 500); // 2 segments of 250

        let mid_first = Color::from_u32(ramp[125]);
        assert!(mid_first.a > 0 && mid_first.a < 255);
        let second_segment = Color::from_u32(ramp[250]);
        assert_eq!(second_segment.a, 255);
    }

    #[test]
    fn test_two_color_ramp_blends() {
        let ramp = build_ramp(&[Color::WHITE, Color::RED]).unwrap();
        assert_eq!(ramp.len(), 500);
        let mid = Color::from_u32(ramp[250]);
        assert_eq!(mid.r, 255);
        assert!(mid.g > 100 && mid.g < 160);
        assert_eq!(mid.g, mid.b);
    }

    #[test]
    fn test_uneven_segment_rounding() {
        // 3 segments: round(500/3) = 167 entries each
        let ramp = build_ramp(&[Color::BLACK, Color::CYAN, Color::GREEN, Color::RED]).unwrap();
        assert_eq!(ramp.len(), 3 * 167);
    }

    #[test]
    fn test_single_color_rejected() {
        assert!(build_ramp(&[Color::RED]).is_none());
        assert!(build_ramp(&[]).is_none());
    }
}
