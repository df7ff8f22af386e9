//! Contour lines by marching squares and filled bands between contour levels.

use optional::Optioned;

/// A straight piece of a contour line, in data coordinates.
pub type Segment = [(f64, f64); 2];

/// Segments where a field crosses `level`.
///
/// `rows[i][j]` is the value at `(xs[j], ys[i])`. Cells with a missing corner are skipped.
/// Saddle cells are resolved with the mean of the four corners.
pub fn contour_segments(
    xs: &[f64],
    ys: &[f64],
    rows: &[Vec<Optioned<f64>>],
    level: f64,
) -> Vec<Segment> {
    let mut segments = vec![];
    if xs.len() < 2 || ys.len() < 2 {
        return segments;
    }

    for (i, pair) in rows.windows(2).enumerate().take(ys.len() - 1) {
        let (lower, upper) = (&pair[0], &pair[1]);
        for j in 0..cell_count(xs, lower, upper) {
            if let Some((pts, vals)) = cell(xs, ys, lower, upper, i, j) {
                cell_segments(&pts, &vals, level, &mut segments);
            }
        }
    }

    segments
}

/// A filled polygon in data coordinates and the color band it belongs to.
pub type Band = (usize, Vec<(f64, f64)>);

/// Polygons filling the field between consecutive `levels`.
///
/// Band `b` holds values in `levels[b - 1]..levels[b]`, band 0 everything below the first level
/// and the last band everything at or above the last level. These are the bins of a
/// [`ColorScale`](super::style::ColorScale). Cells with a missing corner are left empty.
///
/// Each cell is split into two triangles over which the field is linear, and each triangle is
/// cut at the levels it spans. Runs of cells lying wholly inside one band become one rectangle.
pub fn filled_bands(
    xs: &[f64],
    ys: &[f64],
    rows: &[Vec<Optioned<f64>>],
    levels: &[f64],
) -> Vec<Band> {
    let mut bands = vec![];
    if xs.len() < 2 || ys.len() < 2 {
        return bands;
    }

    for (i, pair) in rows.windows(2).enumerate().take(ys.len() - 1) {
        let (lower, upper) = (&pair[0], &pair[1]);
        let (y0, y1) = (ys[i], ys[i + 1]);
        let n_cells = cell_count(xs, lower, upper);

        // (band, first cell) of the run of whole cells in progress
        let mut run: Option<(usize, usize)> = None;
        for j in 0..n_cells {
            let whole = cell(xs, ys, lower, upper, i, j).and_then(|(pts, vals)| {
                let band = band_of(levels, vals[0]);
                if vals.iter().all(|&v| band_of(levels, v) == band) {
                    Some(band)
                } else {
                    split_cell(&pts, &vals, levels, &mut bands);
                    None
                }
            });

            match (run, whole) {
                (Some((band, _)), Some(next)) if band == next => {}
                _ => {
                    if let Some((band, start)) = run {
                        bands.push((band, rectangle(xs[start], xs[j], y0, y1)));
                    }
                    run = whole.map(|band| (band, j));
                }
            }
        }

        if let Some((band, start)) = run {
            bands.push((band, rectangle(xs[start], xs[n_cells], y0, y1)));
        }
    }

    bands
}

fn band_of(levels: &[f64], val: f64) -> usize {
    levels.partition_point(|&l| l <= val)
}

fn cell_count(xs: &[f64], lower: &[Optioned<f64>], upper: &[Optioned<f64>]) -> usize {
    (xs.len() - 1)
        .min(lower.len().saturating_sub(1))
        .min(upper.len().saturating_sub(1))
}

// Corners of cell (i, j) counter-clockwise from the lower left, `None` if any is missing.
fn cell(
    xs: &[f64],
    ys: &[f64],
    lower: &[Optioned<f64>],
    upper: &[Optioned<f64>],
    i: usize,
    j: usize,
) -> Option<([(f64, f64); 4], [f64; 4])> {
    let pts = [
        (xs[j], ys[i]),
        (xs[j + 1], ys[i]),
        (xs[j + 1], ys[i + 1]),
        (xs[j], ys[i + 1]),
    ];

    let mut vals = [0.0; 4];
    for (k, val) in [lower[j], lower[j + 1], upper[j + 1], upper[j]]
        .iter()
        .enumerate()
    {
        match val.into_option() {
            Some(v) if !v.is_nan() => vals[k] = v,
            _ => return None,
        }
    }

    Some((pts, vals))
}

fn rectangle(x0: f64, x1: f64, y0: f64, y1: f64) -> Vec<(f64, f64)> {
    vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
}

// A vertex carrying the field value, (x, y, value).
type Vertex = (f64, f64, f64);

fn split_cell(pts: &[(f64, f64); 4], vals: &[f64; 4], levels: &[f64], out: &mut Vec<Band>) {
    for tri in [[0, 1, 2], [0, 2, 3]] {
        let tri: Vec<Vertex> = tri
            .iter()
            .map(|&k| (pts[k].0, pts[k].1, vals[k]))
            .collect();

        let (lo, hi) = tri.iter().fold((f64::MAX, f64::MIN), |(lo, hi), v| {
            (lo.min(v.2), hi.max(v.2))
        });

        for band in band_of(levels, lo)..=band_of(levels, hi) {
            let mut piece = tri.clone();
            if band > 0 {
                piece = clip_at(&piece, levels[band - 1], true);
            }
            if band < levels.len() {
                piece = clip_at(&piece, levels[band], false);
            }

            if piece.len() >= 3 && area(&piece) > 1.0e-12 {
                out.push((band, piece.iter().map(|v| (v.0, v.1)).collect()));
            }
        }
    }
}

// Keep the part of a convex polygon at or above `level`, or strictly below it.
fn clip_at(poly: &[Vertex], level: f64, keep_above: bool) -> Vec<Vertex> {
    let inside = |v: &Vertex| if keep_above { v.2 >= level } else { v.2 < level };
    let cross = |a: &Vertex, b: &Vertex| {
        let t = (level - a.2) / (b.2 - a.2);
        (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1), level)
    };

    let mut out = vec![];
    let mut prev = match poly.last() {
        Some(v) => v,
        None => return out,
    };
    for cur in poly {
        match (inside(prev), inside(cur)) {
            (true, true) => out.push(*cur),
            (true, false) => out.push(cross(prev, cur)),
            (false, true) => {
                out.push(cross(prev, cur));
                out.push(*cur);
            }
            (false, false) => {}
        }
        prev = cur;
    }

    out
}

// Unsigned shoelace area.
fn area(poly: &[Vertex]) -> f64 {
    let n = poly.len();
    (0..n)
        .map(|k| {
            let (a, b) = (poly[k], poly[(k + 1) % n]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum::<f64>()
        .abs()
        / 2.0
}

// Edge k joins corner k and corner k + 1.
fn cell_segments(pts: &[(f64, f64); 4], vals: &[f64; 4], level: f64, out: &mut Vec<Segment>) {
    let above: Vec<bool> = vals.iter().map(|&v| v >= level).collect();

    let crossing = |k: usize| -> (f64, f64) {
        let (a, b) = (k, (k + 1) % 4);
        let t = (level - vals[a]) / (vals[b] - vals[a]);
        (
            pts[a].0 + t * (pts[b].0 - pts[a].0),
            pts[a].1 + t * (pts[b].1 - pts[a].1),
        )
    };

    let crossed: Vec<usize> = (0..4).filter(|&k| above[k] != above[(k + 1) % 4]).collect();

    match crossed.len() {
        2 => out.push([crossing(crossed[0]), crossing(crossed[1])]),
        4 => {
            let center_above = vals.iter().sum::<f64>() / 4.0 >= level;
            if center_above == above[0] {
                // Corners 0 and 2 connect through the center, cut off 1 and 3
                out.push([crossing(0), crossing(1)]);
                out.push([crossing(2), crossing(3)]);
            } else {
                out.push([crossing(3), crossing(0)]);
                out.push([crossing(1), crossing(2)]);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::test_tools::approx_equal;
    use optional::{none, some};

    fn rows_of<F: Fn(f64, f64) -> f64>(xs: &[f64], ys: &[f64], f: F) -> Vec<Vec<Optioned<f64>>> {
        ys.iter()
            .map(|&y| xs.iter().map(|&x| some(f(x, y))).collect())
            .collect()
    }

    #[test]
    fn test_plane() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 2.0];
        let rows = rows_of(&xs, &ys, |x, _| x);

        let segs = contour_segments(&xs, &ys, &rows, 0.5);
        assert_eq!(segs.len(), 2);
        for seg in &segs {
            assert!(approx_equal(seg[0].0, 0.5, 1.0e-12));
            assert!(approx_equal(seg[1].0, 0.5, 1.0e-12));
        }

        assert!(contour_segments(&xs, &ys, &rows, 5.0).is_empty());
    }

    #[test]
    fn test_saddle() {
        let xs = [0.0, 1.0];
        let ys = [0.0, 1.0];
        let rows = vec![vec![some(1.0), some(0.0)], vec![some(0.0), some(1.0)]];
        assert_eq!(contour_segments(&xs, &ys, &rows, 0.5).len(), 2);
    }

    #[test]
    fn test_missing_corner_skipped() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0];
        let rows = vec![
            vec![some(0.0), some(1.0), some(2.0)],
            vec![none(), some(1.0), some(2.0)],
        ];
        let segs = contour_segments(&xs, &ys, &rows, 1.5);
        assert_eq!(segs.len(), 1);
        assert!(approx_equal(segs[0][0].0, 1.5, 1.0e-12));
        assert!(contour_segments(&xs, &ys, &rows, 0.5).is_empty());
    }

    fn band_areas(bands: &[Band], n_bands: usize) -> Vec<f64> {
        let mut areas = vec![0.0; n_bands];
        for (band, ring) in bands {
            let ring: Vec<Vertex> = ring.iter().map(|&(x, y)| (x, y, 0.0)).collect();
            areas[*band] += area(&ring);
        }
        areas
    }

    #[test]
    fn test_bands_of_plane() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0];
        let rows = rows_of(&xs, &ys, |x, _| x);

        let bands = filled_bands(&xs, &ys, &rows, &[0.5, 1.5]);
        let areas = band_areas(&bands, 3);
        assert!(approx_equal(areas[0], 0.5, 1.0e-12));
        assert!(approx_equal(areas[1], 1.0, 1.0e-12));
        assert!(approx_equal(areas[2], 0.5, 1.0e-12));

        for (band, ring) in &bands {
            let (lo, hi) = [(0.0, 0.5), (0.5, 1.5), (1.5, 2.0)][*band];
            assert!(ring.iter().all(|&(x, _)| x >= lo - 1.0e-12 && x <= hi + 1.0e-12));
        }
    }

    #[test]
    fn test_uniform_rows_merge() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.0, 1.0, 2.0];
        // Exactly on a level belongs to the band above it
        let rows = rows_of(&xs, &ys, |_, _| 1.0);

        let bands = filled_bands(&xs, &ys, &rows, &[0.0, 1.0, 2.0]);
        assert_eq!(bands.len(), 2);
        for (band, ring) in &bands {
            assert_eq!(*band, 2);
            assert_eq!(ring.len(), 4);
            assert_eq!(ring[0].0, 0.0);
            assert_eq!(ring[1].0, 3.0);
        }
    }

    #[test]
    fn test_missing_cell_left_empty() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0];
        let rows = vec![
            vec![none(), some(1.0), some(1.0)],
            vec![some(1.0), some(1.0), some(1.0)],
        ];

        let bands = filled_bands(&xs, &ys, &rows, &[0.5]);
        assert_eq!(bands, vec![(1, vec![(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)])]);

        let rows = vec![vec![none(); 3], vec![none(); 3]];
        assert!(filled_bands(&xs, &ys, &rows, &[0.5]).is_empty());
    }
}
