//! Binary-mask vectorization: edge-node classification, boundary walking
//! and recursive line/quadratic-spline fitting.
//!
//! The walk operates on a per-value "layer" of 4-bit edge-node codes. Each
//! code describes which of a corner's four surrounding pixels match the
//! layer value; the transition table below drives the boundary walk from
//! cell to cell, clearing codes as it goes.

use kurbo::{flatten, PathEl, Point as BezPoint};

/// Fitting tolerances and the minimum path length worth keeping.
#[derive(Debug, Clone, Copy)]
pub struct TraceOptions {
    /// Max squared error for a straight-line fit.
    pub ltres: f64,
    /// Max squared error for a quadratic-spline fit.
    pub qtres: f64,
    /// Paths shorter than this many boundary cells are discarded.
    pub pathomit: usize,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            ltres: 1.0,
            qtres: 1.0,
            pathomit: 8,
        }
    }
}

/// Flatness tolerance when expanding quadratic segments to polylines.
const FLATTEN_TOLERANCE: f64 = 0.5;

/// Combined walk table: `EDGE_WALK[code][direction]` gives
/// `(replacement_code, new_direction, dx, dy)`. Directions are
/// 0 = east, 1 = south, 2 = west, 3 = north. A row of -1s marks a
/// state the walk can never be in.
#[rustfmt::skip]
const EDGE_WALK: [[[i8; 4]; 4]; 16] = [
    [[-1,-1,-1,-1], [-1,-1,-1,-1], [-1,-1,-1,-1], [-1,-1,-1,-1]],
    [[ 0, 1, 0,-1], [-1,-1,-1,-1], [-1,-1,-1,-1], [ 0, 2,-1, 0]],
    [[-1,-1,-1,-1], [-1,-1,-1,-1], [ 0, 1, 0,-1], [ 0, 0, 1, 0]],
    [[ 0, 0, 1, 0], [-1,-1,-1,-1], [ 0, 2,-1, 0], [-1,-1,-1,-1]],
    [[-1,-1,-1,-1], [ 0, 0, 1, 0], [ 0, 3, 0, 1], [-1,-1,-1,-1]],
    [[13, 3, 0, 1], [13, 2,-1, 0], [ 7, 1, 0,-1], [ 7, 0, 1, 0]],
    [[-1,-1,-1,-1], [ 0, 1, 0,-1], [-1,-1,-1,-1], [ 0, 3, 0, 1]],
    [[ 0, 3, 0, 1], [ 0, 2,-1, 0], [-1,-1,-1,-1], [-1,-1,-1,-1]],
    [[ 0, 3, 0, 1], [ 0, 2,-1, 0], [-1,-1,-1,-1], [-1,-1,-1,-1]],
    [[-1,-1,-1,-1], [ 0, 1, 0,-1], [-1,-1,-1,-1], [ 0, 3, 0, 1]],
    [[11, 1, 0,-1], [14, 0, 1, 0], [14, 3, 0, 1], [11, 2,-1, 0]],
    [[-1,-1,-1,-1], [ 0, 0, 1, 0], [ 0, 3, 0, 1], [-1,-1,-1,-1]],
    [[ 0, 0, 1, 0], [-1,-1,-1,-1], [ 0, 2,-1, 0], [-1,-1,-1,-1]],
    [[-1,-1,-1,-1], [-1,-1,-1,-1], [ 0, 1, 0,-1], [ 0, 0, 1, 0]],
    [[ 0, 1, 0,-1], [-1,-1,-1,-1], [-1,-1,-1,-1], [ 0, 2,-1, 0]],
    [[-1,-1,-1,-1], [-1,-1,-1,-1], [-1,-1,-1,-1], [-1,-1,-1,-1]],
];

/// Initial walk direction per edge-node code; -1 marks codes that never
/// begin a path. Walks start only at a region's NW outline corner (4) or
/// a hole's NW corner (11).
const START_DIRECTION: [i8; 16] = [-1, -1, -1, -1, 1, -1, -1, -1, -1, -1, -1, 1, -1, -1, -1, -1];

/// Whether a path started at this code traces a hole.
const HOLE_PATH: [bool; 16] = [
    false, false, false, false, false, false, false, false, false, false, false, true, false,
    false, false, false,
];

/// A fitted path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Quad {
        x1: f64,
        y1: f64,
        cx: f64,
        cy: f64,
        x2: f64,
        y2: f64,
    },
}

impl Segment {
    fn start(&self) -> (f64, f64) {
        match *self {
            Segment::Line { x1, y1, .. } | Segment::Quad { x1, y1, .. } => (x1, y1),
        }
    }
}

/// Vectorize the foreground (value 1) of a binary mask into closed
/// polygon outlines in mask pixel coordinates.
pub fn trace_mask(mask: &[u8], width: usize, height: usize, opts: &TraceOptions) -> Vec<Vec<(f64, f64)>> {
    if width == 0 || height == 0 || mask.len() != width * height {
        return Vec::new();
    }

    let (mut layer, aw, ah) = layer_mask(mask, width, height);
    let paths = pathscan(&mut layer, aw, ah, opts.pathomit);

    let mut polygons = Vec::new();
    for path in paths {
        let nodes = internodes(&path);
        let segments = trace_path(&nodes, opts.ltres, opts.qtres);
        if is_frame_artifact(&segments) {
            continue;
        }
        if let Some(polygon) = assemble(&segments) {
            polygons.push(polygon);
        }
    }
    polygons
}

/// Classify every foreground pixel's corner neighborhood into edge-node
/// codes over a 1-pixel padded grid (padding counts as a foreign value).
///
/// The main write lands at `[y+1][x+1]`; unequal W/N/NW neighbors also get
/// tentative look-back codes so boundary corners exist before the scan
/// reaches them.
fn layer_mask(mask: &[u8], width: usize, height: usize) -> (Vec<u8>, usize, usize) {
    let aw = width + 2;
    let ah = height + 2;

    // padded indexed image; -1 border never equals a pixel value
    let mut arr = vec![-1i8; aw * ah];
    for y in 0..height {
        for x in 0..width {
            arr[(y + 1) * aw + (x + 1)] = mask[y * width + x] as i8;
        }
    }

    let mut layer = vec![0u8; aw * ah];
    for j in 1..ah - 1 {
        for i in 1..aw - 1 {
            if arr[j * aw + i] != 1 {
                continue;
            }
            let eq = |jj: usize, ii: usize| (arr[jj * aw + ii] == 1) as u8;
            let n1 = eq(j - 1, i - 1);
            let n2 = eq(j - 1, i);
            let n3 = eq(j - 1, i + 1);
            let n4 = eq(j, i - 1);
            let n5 = eq(j, i + 1);
            let n6 = eq(j + 1, i - 1);
            let n7 = eq(j + 1, i);
            let n8 = eq(j + 1, i + 1);

            layer[(j + 1) * aw + (i + 1)] = 1 + n5 * 2 + n8 * 4 + n7 * 8;
            if n4 == 0 {
                layer[(j + 1) * aw + i] = 2 + n7 * 4 + n6 * 8;
            }
            if n2 == 0 {
                layer[j * aw + (i + 1)] = n3 * 2 + n5 * 4 + 8;
            }
            if n1 == 0 {
                layer[j * aw + i] = n2 * 2 + 4 + n4 * 8;
            }
        }
    }
    (layer, aw, ah)
}

/// Walk every boundary in the layer, recording `(x-1, y-1, code)` per
/// cell. Hole paths and paths shorter than `pathomit` are dropped.
fn pathscan(layer: &mut [u8], aw: usize, ah: usize, pathomit: usize) -> Vec<Vec<(i32, i32, u8)>> {
    let mut paths = Vec::new();
    let max_steps = aw * ah * 4;

    for j in 0..ah {
        for i in 0..aw {
            let code = layer[j * aw + i] as usize;
            let start_dir = START_DIRECTION[code];
            if start_dir < 0 {
                continue;
            }
            let hole = HOLE_PATH[code];

            let mut px = i;
            let mut py = j;
            let mut dir = start_dir as usize;
            let mut points: Vec<(i32, i32, u8)> = Vec::new();
            let mut steps = 0usize;

            loop {
                let code = layer[py * aw + px];
                points.push((px as i32 - 1, py as i32 - 1, code));

                let step = EDGE_WALK[code as usize][dir];
                if step[1] < 0 {
                    // walk fell into an impossible state; drop the path
                    points.clear();
                    break;
                }
                layer[py * aw + px] = step[0] as u8;
                dir = step[1] as usize;
                px = (px as i64 + step[2] as i64) as usize;
                py = (py as i64 + step[3] as i64) as usize;

                if px as i32 - 1 == points[0].0 && py as i32 - 1 == points[0].1 {
                    break;
                }
                steps += 1;
                if steps > max_steps {
                    points.clear();
                    break;
                }
            }

            if !hole && points.len() >= pathomit {
                paths.push(points);
            }
        }
    }
    paths
}

/// Midpoint interpolation with an 8-way direction tag per node
/// (0 = E, 1 = SE, 2 = S, 3 = SW, 4 = W, 5 = NW, 6 = N, 7 = NE;
/// 8 marks a degenerate zero step).
fn internodes(path: &[(i32, i32, u8)]) -> Vec<(f64, f64, u8)> {
    let n = path.len();
    let mut nodes = Vec::with_capacity(n);
    for i in 0..n {
        let next = (i + 1) % n;
        let next2 = (i + 2) % n;
        let this_x = (path[i].0 + path[next].0) as f64 / 2.0;
        let this_y = (path[i].1 + path[next].1) as f64 / 2.0;
        let next_x = (path[next].0 + path[next2].0) as f64 / 2.0;
        let next_y = (path[next].1 + path[next2].1) as f64 / 2.0;
        nodes.push((this_x, this_y, direction(this_x, this_y, next_x, next_y)));
    }
    nodes
}

fn direction(x1: f64, y1: f64, x2: f64, y2: f64) -> u8 {
    if x1 < x2 {
        if y1 < y2 {
            1 // SE
        } else if y1 > y2 {
            7 // NE
        } else {
            0 // E
        }
    } else if x1 > x2 {
        if y1 < y2 {
            3 // SW
        } else if y1 > y2 {
            5 // NW
        } else {
            4 // W
        }
    } else if y1 < y2 {
        2 // S
    } else if y1 > y2 {
        6 // N
    } else {
        8
    }
}

/// Split the node list into maximal sub-sequences holding at most two
/// direction tags and fit each one.
fn trace_path(path: &[(f64, f64, u8)], ltres: f64, qtres: f64) -> Vec<Segment> {
    let n = path.len();
    if n == 0 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut pcnt = 0usize;
    while pcnt < n {
        let type1 = path[pcnt].2 as i32;
        let mut type2 = -1i32;
        let mut seqend = pcnt + 1;
        while seqend < n - 1
            && (path[seqend].2 as i32 == type1 || path[seqend].2 as i32 == type2 || type2 == -1)
        {
            if path[seqend].2 as i32 != type1 && type2 == -1 {
                type2 = path[seqend].2 as i32;
            }
            seqend += 1;
        }
        if seqend == n - 1 {
            seqend = 0;
        }

        fit_sequence(path, ltres, qtres, pcnt, seqend, &mut segments);

        if seqend > 0 {
            pcnt = seqend;
        } else {
            pcnt = n;
        }
    }
    segments
}

/// Fit one sub-sequence: straight line, else quadratic spline through the
/// worst point, else split at the midpoint of the two error locations and
/// retry both halves. Uses an explicit worklist so deep splits cannot
/// exhaust the stack.
fn fit_sequence(
    path: &[(f64, f64, u8)],
    ltres: f64,
    qtres: f64,
    seqstart: usize,
    seqend: usize,
    out: &mut Vec<Segment>,
) {
    let n = path.len();
    let mut stack = vec![(seqstart, seqend)];

    while let Some((s, e)) = stack.pop() {
        if s >= n || e >= n || s == e {
            continue;
        }

        let mut tl = e as f64 - s as f64;
        if tl < 0.0 {
            tl += n as f64;
        }
        let vx = (path[e].0 - path[s].0) / tl;
        let vy = (path[e].1 - path[s].1) / tl;

        // straight-line attempt
        let mut errorpoint = s;
        let mut errorval = 0.0f64;
        let mut pass = true;
        let mut pcnt = (s + 1) % n;
        while pcnt != e {
            let mut pl = pcnt as f64 - s as f64;
            if pl < 0.0 {
                pl += n as f64;
            }
            let px = path[s].0 + vx * pl;
            let py = path[s].1 + vy * pl;
            let dist2 = (path[pcnt].0 - px).powi(2) + (path[pcnt].1 - py).powi(2);
            if dist2 > ltres {
                pass = false;
            }
            if dist2 > errorval {
                errorpoint = pcnt;
                errorval = dist2;
            }
            pcnt = (pcnt + 1) % n;
        }
        if pass {
            out.push(Segment::Line {
                x1: path[s].0,
                y1: path[s].1,
                x2: path[e].0,
                y2: path[e].1,
            });
            continue;
        }

        // quadratic attempt through the worst point
        let fitpoint = errorpoint;
        let t = (fitpoint as f64 - s as f64) / tl;
        let t1 = (1.0 - t) * (1.0 - t);
        let t2 = 2.0 * (1.0 - t) * t;
        let t3 = t * t;
        let cx = ((t1 * path[s].0 + t3 * path[e].0) - path[fitpoint].0) / -t2;
        let cy = ((t1 * path[s].1 + t3 * path[e].1) - path[fitpoint].1) / -t2;

        pass = true;
        errorval = 0.0;
        errorpoint = s;
        let mut pcnt = (s + 1) % n;
        while pcnt != e {
            let mut pl = pcnt as f64 - s as f64;
            if pl < 0.0 {
                pl += n as f64;
            }
            let t = pl / tl;
            let t1 = (1.0 - t) * (1.0 - t);
            let t2 = 2.0 * (1.0 - t) * t;
            let t3 = t * t;
            let px = t1 * path[s].0 + t2 * cx + t3 * path[e].0;
            let py = t1 * path[s].1 + t2 * cy + t3 * path[e].1;
            let dist2 = (path[pcnt].0 - px).powi(2) + (path[pcnt].1 - py).powi(2);
            if dist2 > qtres {
                pass = false;
            }
            if dist2 > errorval {
                errorpoint = pcnt;
                errorval = dist2;
            }
            pcnt = (pcnt + 1) % n;
        }
        if pass {
            out.push(Segment::Quad {
                x1: path[s].0,
                y1: path[s].1,
                cx,
                cy,
                x2: path[e].0,
                y2: path[e].1,
            });
            continue;
        }

        // split between the two worst points and retry both halves
        let splitpoint = (fitpoint + errorpoint) / 2;
        if splitpoint == s || splitpoint == e {
            out.push(Segment::Line {
                x1: path[s].0,
                y1: path[s].1,
                x2: path[e].0,
                y2: path[e].1,
            });
            continue;
        }
        stack.push((splitpoint, e));
        stack.push((s, splitpoint));
    }
}

/// Exactly four segments starting on the top-left image corner cells is
/// the outline of the raster frame itself, not of any region.
fn is_frame_artifact(segments: &[Segment]) -> bool {
    if segments.len() != 4 {
        return false;
    }
    matches!(
        segments[0].start(),
        (x, y) if (x == 0.0 && y == 0.0) || (x == 1.0 && y == 0.0) || (x == 0.0 && y == 1.0)
    )
}

/// Chain segments into a closed point ring; quadratics flatten to
/// polylines at half-pixel tolerance.
fn assemble(segments: &[Segment]) -> Option<Vec<(f64, f64)>> {
    let mut pts: Vec<(f64, f64)> = Vec::new();
    let push = |pts: &mut Vec<(f64, f64)>, p: (f64, f64)| {
        if pts.last() != Some(&p) {
            pts.push(p);
        }
    };

    for seg in segments {
        match *seg {
            Segment::Line { x1, y1, x2, y2 } => {
                push(&mut pts, (x1, y1));
                push(&mut pts, (x2, y2));
            }
            Segment::Quad {
                x1,
                y1,
                cx,
                cy,
                x2,
                y2,
            } => {
                push(&mut pts, (x1, y1));
                let quad = [
                    PathEl::MoveTo(BezPoint::new(x1, y1)),
                    PathEl::QuadTo(BezPoint::new(cx, cy), BezPoint::new(x2, y2)),
                ];
                flatten(quad, FLATTEN_TOLERANCE, |el| {
                    if let PathEl::LineTo(p) = el {
                        push(&mut pts, (p.x, p.y));
                    }
                });
            }
        }
    }

    if pts.len() < 3 {
        return None;
    }
    let first = pts[0];
    let last = *pts.last()?;
    if (first.0 - last.0).abs() > 0.01 || (first.1 - last.1).abs() > 0.01 {
        return None;
    }
    *pts.last_mut()? = first;
    if pts.len() < 4 {
        return None;
    }
    Some(pts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_mask(size: usize, lo: usize, hi: usize) -> Vec<u8> {
        let mut mask = vec![0u8; size * size];
        for y in lo..hi {
            for x in lo..hi {
                mask[y * size + x] = 1;
            }
        }
        mask
    }

    #[test]
    fn test_walk_table_rows_are_unit_steps() {
        for (code, row) in EDGE_WALK.iter().enumerate() {
            for dir in 0..4 {
                let step = row[dir];
                if step[1] < 0 {
                    continue;
                }
                assert!(step[2].abs() + step[3].abs() == 1, "code {} dir {}", code, dir);
                assert!((0..4).contains(&step[1]), "code {} dir {}", code, dir);
                assert!(
                    matches!(step[0], 0 | 7 | 11 | 13 | 14),
                    "code {} dir {} clears to {}",
                    code,
                    dir,
                    step[0]
                );
            }
        }
    }

    #[test]
    fn test_walk_table_interior_codes_invalid() {
        for dir in 0..4 {
            assert_eq!(EDGE_WALK[0][dir][1], -1);
            assert_eq!(EDGE_WALK[15][dir][1], -1);
        }
    }

    #[test]
    fn test_walk_table_complement_symmetry() {
        // a code and its bit-complement describe the same corner geometry
        // from the two sides, so their walk rows match
        for code in 1..15usize {
            if code == 5 || code == 10 {
                continue; // saddles resolve differently by design
            }
            assert_eq!(EDGE_WALK[code], EDGE_WALK[15 - code], "code {}", code);
        }
    }

    #[test]
    fn test_start_lookup() {
        for code in 0..16 {
            let dir = START_DIRECTION[code];
            match code {
                4 | 11 => {
                    assert_eq!(dir, 1);
                    assert!(EDGE_WALK[code][dir as usize][1] >= 0);
                }
                _ => assert_eq!(dir, -1, "code {}", code),
            }
            assert_eq!(HOLE_PATH[code], code == 11);
        }
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(direction(0.0, 0.0, 1.0, 0.0), 0); // E
        assert_eq!(direction(0.0, 0.0, 1.0, 1.0), 1); // SE
        assert_eq!(direction(0.0, 0.0, 0.0, 1.0), 2); // S
        assert_eq!(direction(0.0, 0.0, -1.0, 1.0), 3); // SW
        assert_eq!(direction(0.0, 0.0, -1.0, 0.0), 4); // W
        assert_eq!(direction(0.0, 0.0, -1.0, -1.0), 5); // NW
        assert_eq!(direction(0.0, 0.0, 0.0, -1.0), 6); // N
        assert_eq!(direction(0.0, 0.0, 1.0, -1.0), 7); // NE
        assert_eq!(direction(0.0, 0.0, 0.0, 0.0), 8);
    }

    #[test]
    fn test_layer_codes_for_isolated_pixel() {
        let mut mask = vec![0u8; 9];
        mask[4] = 1; // center of a 3x3 mask
        let (layer, aw, _) = layer_mask(&mask, 3, 3);
        // pixel (1,1) sits at padded (2,2); its corner codes form a
        // closed single-cell loop
        assert_eq!(layer[3 * aw + 3], 1); // SE corner: self only
        assert_eq!(layer[3 * aw + 2], 2); // SW corner
        assert_eq!(layer[2 * aw + 3], 8); // NE corner
        assert_eq!(layer[2 * aw + 2], 4); // NW corner
    }

    #[test]
    fn test_single_pixel_path_omitted() {
        let mut mask = vec![0u8; 100];
        mask[5 * 10 + 5] = 1;
        let polygons = trace_mask(&mask, 10, 10, &TraceOptions::default());
        assert!(polygons.is_empty());
    }

    #[test]
    fn test_square_blob_traces_to_closed_ring() {
        let mask = square_mask(30, 8, 22);
        let polygons = trace_mask(&mask, 30, 30, &TraceOptions::default());
        assert_eq!(polygons.len(), 1);

        let ring = &polygons[0];
        assert!(ring.len() >= 4);
        assert_eq!(ring.first(), ring.last());

        let (mut cx, mut cy) = (0.0, 0.0);
        for (x, y) in &ring[..ring.len() - 1] {
            cx += x;
            cy += y;
        }
        let count = (ring.len() - 1) as f64;
        cx /= count;
        cy /= count;
        assert!((cx - 14.5).abs() < 2.0, "centroid x {}", cx);
        assert!((cy - 14.5).abs() < 2.0, "centroid y {}", cy);

        for (x, y) in ring {
            assert!((6.5..=23.5).contains(x), "x {}", x);
            assert!((6.5..=23.5).contains(y), "y {}", y);
        }
    }

    #[test]
    fn test_hole_paths_are_discarded() {
        // a ring-shaped blob: outer outline kept, inner hole dropped
        let mut mask = square_mask(40, 5, 35);
        for y in 15..25 {
            for x in 15..25 {
                mask[y * 40 + x] = 0;
            }
        }
        let polygons = trace_mask(&mask, 40, 40, &TraceOptions::default());
        assert_eq!(polygons.len(), 1);
        // the kept outline is the outer one
        let max_x = polygons[0]
            .iter()
            .map(|(x, _)| *x)
            .fold(f64::MIN, f64::max);
        assert!(max_x > 30.0);
    }

    #[test]
    fn test_two_blobs_two_polygons() {
        let mut mask = vec![0u8; 60 * 60];
        for y in 5..20 {
            for x in 5..20 {
                mask[y * 60 + x] = 1;
            }
        }
        for y in 35..55 {
            for x in 35..55 {
                mask[y * 60 + x] = 1;
            }
        }
        let polygons = trace_mask(&mask, 60, 60, &TraceOptions::default());
        assert_eq!(polygons.len(), 2);
        for ring in &polygons {
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn test_frame_artifact_detection() {
        let quad = |x1, y1, x2, y2| Segment::Line { x1, y1, x2, y2 };
        let frame = vec![
            quad(0.0, 0.0, 10.0, 0.0),
            quad(10.0, 0.0, 10.0, 10.0),
            quad(10.0, 10.0, 0.0, 10.0),
            quad(0.0, 10.0, 0.0, 0.0),
        ];
        assert!(is_frame_artifact(&frame));

        let offset = vec![
            quad(3.0, 3.0, 10.0, 3.0),
            quad(10.0, 3.0, 10.0, 10.0),
            quad(10.0, 10.0, 3.0, 10.0),
            quad(3.0, 10.0, 3.0, 3.0),
        ];
        assert!(!is_frame_artifact(&offset));

        let five = vec![
            quad(0.0, 0.0, 10.0, 0.0),
            quad(10.0, 0.0, 10.0, 10.0),
            quad(10.0, 10.0, 5.0, 12.0),
            quad(5.0, 12.0, 0.0, 10.0),
            quad(0.0, 10.0, 0.0, 0.0),
        ];
        assert!(!is_frame_artifact(&five));
    }

    #[test]
    fn test_quadratic_flattening_stays_near_curve() {
        let segments = vec![
            Segment::Quad {
                x1: 0.0,
                y1: 0.0,
                cx: 10.0,
                cy: 20.0,
                x2: 20.0,
                y2: 0.0,
            },
            Segment::Line {
                x1: 20.0,
                y1: 0.0,
                x2: 0.0,
                y2: 0.0,
            },
        ];
        let ring = assemble(&segments).unwrap();
        assert_eq!(ring.first(), ring.last());
        // flattening inserted interior points along the arc
        assert!(ring.len() > 4);
        let apex = ring
            .iter()
            .map(|(_, y)| *y)
            .fold(f64::MIN, f64::max);
        assert!((apex - 10.0).abs() < 1.0, "apex {}", apex);
    }

    #[test]
    fn test_open_chain_rejected() {
        let segments = vec![Segment::Line {
            x1: 0.0,
            y1: 0.0,
            x2: 5.0,
            y2: 5.0,
        }];
        assert!(assemble(&segments).is_none());
    }
}
