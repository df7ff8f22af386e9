//! Interpolation along a single axis, bilinear regridding and longitude bookkeeping for maps.

use crate::{
    error::{ReportError, Result},
    field::Grid,
    region::lon_0_360,
    utility::stepped_range,
};
use itertools::Itertools;
use optional::{none, some, Optioned};
use tracing::debug;

/// Value of a row at `target_x`, linear between the neighbouring coordinates.
///
/// Moves a latitude averaged row from one longitude axis to another, e.g. the observed
/// equatorial rows onto the model longitudes of the section. `xs` may run either way but must be
/// monotonic. Pairs with a missing coordinate or value are skipped, and a target off either end
/// of `xs` is missing.
pub fn linear_interpolate(
    xs: &[Optioned<f64>],
    ys: &[Optioned<f64>],
    target_x: f64,
) -> Optioned<f64> {
    debug_assert_eq!(xs.len(), ys.len());

    let present = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x.into_option()?, y.into_option()?)));

    for ((x0, y0), (x1, y1)) in present.tuple_windows() {
        if (x0 - target_x).abs() < f64::EPSILON {
            return some(y0);
        }
        if (x1 - target_x).abs() < f64::EPSILON {
            return some(y1);
        }
        // Strictly between, in either direction
        if (x0 < target_x) == (target_x < x1) {
            return some(linear_interp(target_x, x0, x1, y0, y1));
        }
    }

    none()
}

/// Straight line through (x1, y1) and (x2, y2) evaluated at `x_val`. Extrapolates.
#[inline]
pub(crate) fn linear_interp(x_val: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    debug_assert!((x1 - x2).abs() > 0.0);

    let run = x2 - x1;
    let rise = y2 - y1;
    let dx = x_val - x1;

    y1 + dx * (rise / run)
}

/// A regular latitude/longitude grid covering a box, endpoints included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetGrid {
    /// Southern edge.
    pub lat_min: f64,
    /// Northern edge.
    pub lat_max: f64,
    /// Western edge.
    pub lon_min: f64,
    /// Eastern edge.
    pub lon_max: f64,
    /// Spacing in degrees, the same in both directions.
    pub resolution: f64,
}

impl TargetGrid {
    /// Quarter degree grid over mainland China, 10-60N, 70-140E.
    pub const CHINA: TargetGrid = TargetGrid {
        lat_min: 10.0,
        lat_max: 60.0,
        lon_min: 70.0,
        lon_max: 140.0,
        resolution: 0.25,
    };

    /// Quarter degree grid over the South China Sea islands inset, 0-25N, 104-125E.
    pub const SOUTH_CHINA_SEA: TargetGrid = TargetGrid {
        lat_min: 0.0,
        lat_max: 25.0,
        lon_min: 104.0,
        lon_max: 125.0,
        resolution: 0.25,
    };

    /// Latitudes of the grid, south to north.
    pub fn lats(&self) -> Vec<f64> {
        stepped_range(self.lat_min, self.lat_max, self.resolution)
    }

    /// Longitudes of the grid, west to east.
    pub fn lons(&self) -> Vec<f64> {
        stepped_range(self.lon_min, self.lon_max, self.resolution)
    }
}

/// An axis sorted ascending, remembering where each value came from.
struct SortedAxis {
    coords: Vec<f64>,
    source_idx: Vec<usize>,
}

impl SortedAxis {
    fn new(coords: &[f64]) -> Self {
        let mut pairs: Vec<(f64, usize)> = coords.iter().copied().zip(0..).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        SortedAxis {
            coords: pairs.iter().map(|p| p.0).collect(),
            source_idx: pairs.iter().map(|p| p.1).collect(),
        }
    }

    /// Sorted positions of the two points used to interpolate to `x`. Beyond either end the
    /// outermost pair is used so the line extrapolates.
    fn bracket(&self, x: f64) -> (usize, usize) {
        let n = self.coords.len();
        debug_assert!(n >= 2);

        let upper = self.coords.partition_point(|&c| c < x).clamp(1, n - 1);
        (upper - 1, upper)
    }
}

/// Bilinear interpolation of a grid onto a regular target grid.
///
/// Target points beyond the source grid are linearly extrapolated from the nearest pair of
/// source points along each axis. A target point is missing when any of the four source points
/// around it is missing. Source longitudes must use the same convention as the target.
pub fn regrid_bilinear(grid: &Grid, target: &TargetGrid) -> Result<Grid> {
    let (n_lat, n_lon) = grid.shape();
    if n_lat < 2 || n_lon < 2 {
        return Err(ReportError::InvalidInput(format!(
            "cannot regrid a {}x{} grid",
            n_lat, n_lon
        )));
    }

    let lat_axis = SortedAxis::new(grid.lats());
    let lon_axis = SortedAxis::new(grid.lons());

    let lats = target.lats();
    let lons = target.lons();

    let src_lat_min = lat_axis.coords[0];
    let src_lat_max = lat_axis.coords[n_lat - 1];
    let src_lon_min = lon_axis.coords[0];
    let src_lon_max = lon_axis.coords[n_lon - 1];
    if target.lat_min < src_lat_min
        || target.lat_max > src_lat_max
        || target.lon_min < src_lon_min
        || target.lon_max > src_lon_max
    {
        debug!(
            ?target,
            src_lat = ?(src_lat_min, src_lat_max),
            src_lon = ?(src_lon_min, src_lon_max),
            "regridding extrapolates beyond the source grid"
        );
    }

    // Longitude brackets are shared by every row
    let lon_brackets: Vec<(usize, usize)> =
        lons.iter().map(|&lon| lon_axis.bracket(lon)).collect();

    let mut values = Vec::with_capacity(lats.len() * lons.len());
    for &lat in &lats {
        let (a0, a1) = lat_axis.bracket(lat);
        let (y0, y1) = (lat_axis.coords[a0], lat_axis.coords[a1]);
        let (i0, i1) = (lat_axis.source_idx[a0], lat_axis.source_idx[a1]);

        for (&lon, &(b0, b1)) in lons.iter().zip(&lon_brackets) {
            let (x0, x1) = (lon_axis.coords[b0], lon_axis.coords[b1]);
            let (j0, j1) = (lon_axis.source_idx[b0], lon_axis.source_idx[b1]);

            let corners = (
                grid.get(i0, j0).into_option(),
                grid.get(i0, j1).into_option(),
                grid.get(i1, j0).into_option(),
                grid.get(i1, j1).into_option(),
            );

            let val = match corners {
                (Some(v00), Some(v01), Some(v10), Some(v11)) => {
                    let south = linear_interp(lon, x0, x1, v00, v01);
                    let north = linear_interp(lon, x0, x1, v10, v11);
                    some(linear_interp(lat, y0, y1, south, north))
                }
                _ => none(),
            };

            values.push(val);
        }
    }

    Grid::new(lats, lons, values)
}

/// Rotate a grid so longitudes run west to east from `lon_min` to below `lon_min + 360`.
pub fn wrap_longitudes(grid: &Grid, lon_min: f64) -> Grid {
    let wrapped: Vec<f64> = grid
        .lons()
        .iter()
        .map(|&lon| lon_min + lon_0_360(lon - lon_min))
        .collect();

    let mut order: Vec<usize> = (0..wrapped.len()).collect();
    order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));

    let lons: Vec<f64> = order.iter().map(|&j| wrapped[j]).collect();
    let (n_lat, _) = grid.shape();
    let values = (0..n_lat)
        .flat_map(|i| order.iter().map(move |&j| (i, j)))
        .map(|(i, j)| grid.get(i, j))
        .collect();

    Grid::from_parts(grid.lats().to_vec(), lons, values)
}

/// Append a copy of the first longitude column 360 degrees east so a global map closes at the
/// seam. Grids that do not wrap the globe are returned unchanged.
pub fn add_cyclic_point(grid: &Grid) -> Grid {
    let lons = grid.lons();
    let (n_lat, n_lon) = grid.shape();
    if n_lon < 2 {
        return grid.clone();
    }

    let spacing = (lons[n_lon - 1] - lons[0]) / (n_lon - 1) as f64;
    let span = lons[n_lon - 1] - lons[0] + spacing.abs();
    if (span - 360.0).abs() > spacing.abs() * 0.5 {
        return grid.clone();
    }

    let mut new_lons = lons.to_vec();
    new_lons.push(lons[0] + 360.0_f64.copysign(spacing));

    let values = (0..n_lat)
        .flat_map(|i| {
            let row = grid.row(i);
            row.iter().copied().chain(std::iter::once(row[0]))
        })
        .collect();

    Grid::from_parts(grid.lats().to_vec(), new_lons, values)
}
