//! Gridded data: a single (lat, lon) snapshot and a monthly (time, lat, lon) field.

use crate::{
    error::{ReportError, Result},
    region::{lon_0_360, RegionBox},
    time_window::ForecastMonth,
    utility::{mean_all, mean_present},
};
use optional::{none, Optioned};

/// A 2-D (latitude, longitude) grid of values stored row-major by latitude.
///
/// Coordinates are monotonic but may run in either direction. Missing values are `none`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<Optioned<f64>>,
}

impl Grid {
    /// Build a grid, checking that the number of values matches the coordinates.
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, values: Vec<Optioned<f64>>) -> Result<Self> {
        if values.len() != lats.len() * lons.len() {
            return Err(ReportError::ShapeMismatch(format!(
                "{} values for a {}x{} grid",
                values.len(),
                lats.len(),
                lons.len()
            )));
        }

        Ok(Grid { lats, lons, values })
    }

    // Callers guarantee the length matches.
    pub(crate) fn from_parts(lats: Vec<f64>, lons: Vec<f64>, values: Vec<Optioned<f64>>) -> Self {
        debug_assert_eq!(values.len(), lats.len() * lons.len());
        Grid { lats, lons, values }
    }

    /// Build a grid by evaluating a function at every (lat, lon) point.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use enso_report::Grid;
    /// use optional::some;
    ///
    /// let grid = Grid::from_fn(vec![-1.0, 0.0, 1.0], vec![10.0, 20.0], |lat, lon| some(lat + lon));
    /// assert_eq!(grid.shape(), (3, 2));
    /// assert_eq!(grid.get(2, 1).unwrap(), 21.0);
    /// ```
    pub fn from_fn<F>(lats: Vec<f64>, lons: Vec<f64>, f: F) -> Self
    where
        F: Fn(f64, f64) -> Optioned<f64>,
    {
        let values = lats
            .iter()
            .flat_map(|&lat| lons.iter().map(move |&lon| (lat, lon)))
            .map(|(lat, lon)| f(lat, lon))
            .collect();

        Grid { lats, lons, values }
    }

    /// A grid with every value missing.
    pub fn missing(lats: Vec<f64>, lons: Vec<f64>) -> Self {
        let values = vec![none(); lats.len() * lons.len()];
        Grid { lats, lons, values }
    }

    /// Latitudes, degrees north.
    #[inline]
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitudes, degrees east.
    #[inline]
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Values, row-major by latitude.
    #[inline]
    pub fn values(&self) -> &[Optioned<f64>] {
        &self.values
    }

    /// (number of latitudes, number of longitudes)
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Value at a latitude index and longitude index.
    #[inline]
    pub fn get(&self, lat_idx: usize, lon_idx: usize) -> Optioned<f64> {
        debug_assert!(lat_idx < self.lats.len() && lon_idx < self.lons.len());
        self.values[lat_idx * self.lons.len() + lon_idx]
    }

    /// One latitude row.
    #[inline]
    pub fn row(&self, lat_idx: usize) -> &[Optioned<f64>] {
        let n = self.lons.len();
        &self.values[lat_idx * n..(lat_idx + 1) * n]
    }

    /// Number of values that are present.
    pub fn count_present(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Apply a function to every present value.
    pub fn map<F>(&self, f: F) -> Grid
    where
        F: Fn(f64) -> f64,
    {
        let values = self
            .values
            .iter()
            .map(|v| Optioned::from(v.map(&f)))
            .collect();
        Grid {
            lats: self.lats.clone(),
            lons: self.lons.clone(),
            values,
        }
    }

    /// Multiply every present value by `factor`.
    pub fn scaled(&self, factor: f64) -> Grid {
        self.map(|v| v * factor)
    }

    /// Unweighted mean of all present values inside the box.
    pub fn area_mean(&self, region: &RegionBox) -> Result<Optioned<f64>> {
        let (lat_idx, lon_idx) = region.select(&self.lats, &self.lons)?;

        let vals: Vec<Optioned<f64>> = lat_idx
            .iter()
            .flat_map(|&i| lon_idx.iter().map(move |&j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .collect();

        Ok(mean_present(&vals))
    }

    /// Mean over the latitudes inside `region`, for each longitude inside `region`.
    ///
    /// Longitudes are returned in the 0..360 convention sorted west to east.
    pub fn lat_band_mean(&self, region: &RegionBox) -> Result<(Vec<f64>, Vec<Optioned<f64>>)> {
        let (lat_idx, mut lon_idx) = region.select(&self.lats, &self.lons)?;
        lon_idx.sort_by(|&a, &b| lon_0_360(self.lons[a]).total_cmp(&lon_0_360(self.lons[b])));

        let lons = lon_idx.iter().map(|&j| lon_0_360(self.lons[j])).collect();
        let means = lon_idx
            .iter()
            .map(|&j| {
                let column: Vec<Optioned<f64>> = lat_idx.iter().map(|&i| self.get(i, j)).collect();
                mean_present(&column)
            })
            .collect();

        Ok((lons, means))
    }

    /// The part of the grid inside a box, keeping the original coordinate order.
    pub fn subset(&self, region: &RegionBox) -> Result<Grid> {
        let (lat_idx, lon_idx) = region.select(&self.lats, &self.lons)?;

        let lats = lat_idx.iter().map(|&i| self.lats[i]).collect();
        let lons = lon_idx.iter().map(|&j| self.lons[j]).collect();
        let values = lat_idx
            .iter()
            .flat_map(|&i| lon_idx.iter().map(move |&j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .collect();

        Ok(Grid { lats, lons, values })
    }

    /// Point by point mean of several grids on the same coordinates. A point missing in any
    /// input is missing in the output.
    // A season needs all three months, so one missing month blanks that point of the composite.
    pub fn mean_of(grids: &[&Grid]) -> Result<Grid> {
        let first = grids
            .first()
            .ok_or_else(|| ReportError::InvalidInput("no grids to average".to_owned()))?;

        if grids
            .iter()
            .any(|g| g.lats != first.lats || g.lons != first.lons)
        {
            return Err(ReportError::ShapeMismatch(
                "grids to average are on different coordinates".to_owned(),
            ));
        }

        let values = (0..first.values.len())
            .map(|k| {
                let at_k: Vec<Optioned<f64>> = grids.iter().map(|g| g.values[k]).collect();
                mean_all(&at_k)
            })
            .collect();

        Ok(Grid {
            lats: first.lats.clone(),
            lons: first.lons.clone(),
            values,
        })
    }

    /// Smallest and largest present values.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter_map(|v| v.into_option())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// A monthly gridded field (time, lat, lon) for one variable, after any vertical level has been
/// selected.
#[derive(Clone, Debug, Default)]
pub struct GriddedField {
    name: String,
    units: Option<String>,
    times: Vec<ForecastMonth>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    // [time][lat][lon]
    values: Vec<Optioned<f64>>,
}

impl GriddedField {
    /// Build a field, checking the number of values against the coordinate axes.
    pub fn new(
        times: Vec<ForecastMonth>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<Optioned<f64>>,
    ) -> Result<Self> {
        if values.len() != times.len() * lats.len() * lons.len() {
            return Err(ReportError::ShapeMismatch(format!(
                "{} values for {} times on a {}x{} grid",
                values.len(),
                times.len(),
                lats.len(),
                lons.len()
            )));
        }

        Ok(GriddedField {
            name: String::new(),
            units: None,
            times,
            lats,
            lons,
            values,
        })
    }

    /// Builder method to set the variable name.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method to set the units.
    #[inline]
    pub fn with_units<S>(mut self, units: S) -> Self
    where
        Option<String>: From<S>,
    {
        self.units = Option::from(units);
        self
    }

    /// Variable name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units, if the dataset supplied them.
    #[inline]
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// The months in this field, in dataset order.
    #[inline]
    pub fn times(&self) -> &[ForecastMonth] {
        &self.times
    }

    /// Latitudes, degrees north.
    #[inline]
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Longitudes, degrees east.
    #[inline]
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Index of a month on the time axis.
    pub fn time_index(&self, month: ForecastMonth) -> Option<usize> {
        self.times.iter().position(|&t| t == month)
    }

    /// The snapshot at a time index.
    pub fn snapshot(&self, time_idx: usize) -> Grid {
        let n = self.lats.len() * self.lons.len();
        Grid {
            lats: self.lats.clone(),
            lons: self.lons.clone(),
            values: self.values[time_idx * n..(time_idx + 1) * n].to_vec(),
        }
    }

    /// The snapshot for a month, or an all-missing grid if the month is not in the field.
    pub fn month_or_missing(&self, month: ForecastMonth) -> Grid {
        match self.time_index(month) {
            Some(t) => self.snapshot(t),
            None => Grid::missing(self.lats.clone(), self.lons.clone()),
        }
    }

    /// Area mean over a box for each requested month. Months not in the field are missing.
    pub fn area_mean_series(
        &self,
        months: &[ForecastMonth],
        region: &RegionBox,
    ) -> Result<Vec<Optioned<f64>>> {
        let (lat_idx, lon_idx) = region.select(&self.lats, &self.lons)?;
        let n_lon = self.lons.len();
        let n_grid = self.lats.len() * n_lon;

        let series = months
            .iter()
            .map(|&m| match self.time_index(m) {
                Some(t) => {
                    let vals: Vec<Optioned<f64>> = lat_idx
                        .iter()
                        .flat_map(|&i| lon_idx.iter().map(move |&j| (i, j)))
                        .map(|(i, j)| self.values[t * n_grid + i * n_lon + j])
                        .collect();
                    mean_present(&vals)
                }
                None => none(),
            })
            .collect();

        Ok(series)
    }

    /// Multiply every present value by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        if (factor - 1.0).abs() > f64::EPSILON {
            self.values
                .iter_mut()
                .for_each(|v| *v = Optioned::from(v.map(|x| x * factor)));
        }
        self
    }

    /// Keep only the latitudes inside `[lat_min, lat_max]`.
    pub fn lat_band(self, lat_min: f64, lat_max: f64) -> Result<Self> {
        let keep: Vec<usize> = self
            .lats
            .iter()
            .enumerate()
            .filter(|(_, &lat)| lat >= lat_min - 1.0e-6 && lat <= lat_max + 1.0e-6)
            .map(|(i, _)| i)
            .collect();

        if keep.is_empty() {
            return Err(ReportError::EmptyRegion(format!(
                "latitude band {}..{}",
                lat_min, lat_max
            )));
        }

        let n_lon = self.lons.len();
        let n_grid = self.lats.len() * n_lon;
        let mut values = Vec::with_capacity(self.times.len() * keep.len() * n_lon);
        for t in 0..self.times.len() {
            for &i in &keep {
                let start = t * n_grid + i * n_lon;
                values.extend_from_slice(&self.values[start..start + n_lon]);
            }
        }

        let lats = keep.iter().map(|&i| self.lats[i]).collect();
        Ok(GriddedField {
            lats,
            values,
            ..self
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::region::NINO34;
    use crate::utility::test_tools::approx_equal;
    use optional::some;

    fn ramp_grid() -> Grid {
        let lats: Vec<f64> = (-10..=10).map(f64::from).collect();
        let lons: Vec<f64> = (0..360).step_by(5).map(f64::from).collect();
        Grid::from_fn(lats, lons, |lat, lon| some(lat + lon / 100.0))
    }

    #[test]
    fn test_new_checks_shape() {
        assert!(Grid::new(vec![0.0, 1.0], vec![0.0], vec![some(1.0)]).is_err());
        assert!(Grid::new(vec![0.0, 1.0], vec![0.0], vec![some(1.0), none()]).is_ok());
    }

    #[test]
    fn test_area_mean() {
        let grid = ramp_grid();
        // Symmetric in latitude, longitudes 190..240 every 5 average to 215
        let mean = grid.area_mean(&NINO34).unwrap().unwrap();
        assert!(approx_equal(mean, 2.15, 1.0e-12));
    }

    #[test]
    fn test_area_mean_skips_missing() {
        let lats = vec![-1.0, 1.0];
        let lons = vec![200.0, 210.0];
        let grid = Grid::new(lats, lons, vec![some(1.0), none(), some(3.0), none()]).unwrap();
        assert!(approx_equal(grid.area_mean(&NINO34).unwrap().unwrap(), 2.0, 1.0e-12));

        let all_missing = Grid::missing(vec![0.0], vec![200.0]);
        assert!(all_missing.area_mean(&NINO34).unwrap().is_none());
    }

    #[test]
    fn test_lat_band_mean_sorts_longitudes() {
        let lats = vec![-1.0, 1.0];
        let lons = vec![-150.0, 170.0];
        let grid = Grid::new(lats, lons, vec![some(1.0), some(2.0), some(3.0), some(4.0)]).unwrap();
        let region = RegionBox::new("band", -5.0, 5.0, 120.0, 280.0);

        let (lons, means) = grid.lat_band_mean(&region).unwrap();
        assert_eq!(lons, vec![170.0, 210.0]);
        assert_eq!(means[0].unwrap(), 3.0);
        assert_eq!(means[1].unwrap(), 2.0);
    }

    #[test]
    fn test_mean_of() {
        let a = ramp_grid();
        let b = a.scaled(3.0);
        let mean = Grid::mean_of(&[&a, &b]).unwrap();
        for (m, v) in mean.values().iter().zip(a.values()) {
            assert!(approx_equal(m.unwrap(), 2.0 * v.unwrap(), 1.0e-9));
        }

        let mut gap = b.clone();
        gap.values[1] = none();
        let mean = Grid::mean_of(&[&a, &gap, &b]).unwrap();
        assert!(mean.values()[1].is_none());
        assert_eq!(mean.count_present(), a.count_present() - 1);

        let other = Grid::missing(vec![0.0], vec![0.0]);
        assert!(Grid::mean_of(&[&a, &other]).is_err());
        assert!(Grid::mean_of(&[]).is_err());
    }

    #[test]
    fn test_field_series_with_gap() {
        let m0 = ForecastMonth::new(2024, 1).unwrap();
        let times = vec![m0, m0.offset(2)];
        let lats = vec![0.0];
        let lons = vec![200.0];
        let field = GriddedField::new(times, lats, lons, vec![some(1.0), some(3.0)]).unwrap();

        let series = field
            .area_mean_series(&[m0, m0.offset(1), m0.offset(2)], &NINO34)
            .unwrap();
        assert_eq!(series[0].unwrap(), 1.0);
        assert!(series[1].is_none());
        assert_eq!(series[2].unwrap(), 3.0);
    }

    #[test]
    fn test_lat_band() {
        let m0 = ForecastMonth::new(2024, 1).unwrap();
        let lats = vec![-80.0, 0.0, 80.0];
        let lons = vec![0.0, 1.0];
        let values = (0..12).map(|v| some(f64::from(v))).collect();
        let field = GriddedField::new(vec![m0, m0.offset(1)], lats, lons, values)
            .unwrap()
            .lat_band(-70.0, 70.0)
            .unwrap();

        assert_eq!(field.lats(), &[0.0]);
        let second = field.snapshot(1);
        assert_eq!(second.values(), &[some(8.0), some(9.0)]);
    }
}
