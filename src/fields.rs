//! Map-ready fields from the ensemble mean forecast: seasonal composites, monthly snapshots and
//! the equatorial section used for the Hovmöller diagram.

use crate::{
    dataset::{Dataset, FieldRequest},
    error::{ReportError, Result},
    field::{Grid, GriddedField},
    indexes::MODEL_SURFACE_LEVEL,
    interpolation::linear_interpolate,
    keys::FieldVariable,
    region::RegionBox,
    time_window::{ForecastMonth, TimeWindow},
};
use optional::Optioned;
use tracing::{debug, warn};

/// Number of months averaged into one seasonal composite.
pub const MONTHS_PER_SEASON: usize = 3;

/// Latitude/longitude box of the equatorial Pacific section.
pub const EQUATORIAL_PACIFIC: RegionBox =
    RegionBox::new("equatorial Pacific", -5.0, 5.0, 120.0, 280.0);

/// A three month mean of the forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalComposite {
    /// The months averaged, in order.
    pub months: [ForecastMonth; MONTHS_PER_SEASON],
    /// Point by point mean of the three monthly snapshots.
    pub grid: Grid,
}

impl SeasonalComposite {
    /// `YYYYMM-YYYYMM` label for the season.
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.months[0].label(),
            self.months[MONTHS_PER_SEASON - 1].label()
        )
    }
}

/// One variable of the ensemble mean forecast over the forecast horizon, in display units.
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    window: TimeWindow,
    variable: FieldVariable,
    field: GriddedField,
}

impl FieldExtractor {
    /// Read the forecast horizon of a variable, optionally at one vertical level and limited to a
    /// latitude band.
    pub fn load(
        window: TimeWindow,
        dataset: &dyn Dataset,
        variable: FieldVariable,
        level: Option<f64>,
        lat_band: Option<(f64, f64)>,
    ) -> Result<Self> {
        let months = window.forecast_months();

        let mut request = FieldRequest::new(variable.dataset_name())
            .with_months(months[0], months[months.len() - 1]);
        if let Some(level) = level {
            request = request.with_level(level);
        }

        debug!(
            variable = variable.dataset_name(),
            ?level,
            source = %dataset.describe(),
            "reading forecast field"
        );

        let mut field = dataset
            .read_field(&request)?
            .scaled(variable.display_scale())
            .with_units(variable.display_units().to_owned());

        if let Some((lat_min, lat_max)) = lat_band {
            field = field.lat_band(lat_min, lat_max)?;
        }

        let found = months
            .iter()
            .filter(|&&m| field.time_index(m).is_some())
            .count();
        if found < months.len() {
            warn!(
                variable = variable.dataset_name(),
                found,
                expected = months.len(),
                "forecast horizon incomplete, missing months are left blank"
            );
        }

        Ok(FieldExtractor {
            window,
            variable,
            field,
        })
    }

    /// The variable held.
    #[inline]
    pub fn variable(&self) -> FieldVariable {
        self.variable
    }

    /// The underlying field.
    #[inline]
    pub fn field(&self) -> &GriddedField {
        &self.field
    }

    /// The first `n` forecast months as individual grids.
    pub fn monthly_snapshots(&self, n: usize) -> Result<Vec<(ForecastMonth, Grid)>> {
        if n > TimeWindow::LOOK_AHEAD {
            return Err(ReportError::InvalidInput(format!(
                "only {} forecast months available, {} requested",
                TimeWindow::LOOK_AHEAD,
                n
            )));
        }

        Ok(self
            .window
            .forecast_months()
            .into_iter()
            .take(n)
            .map(|m| (m, self.field.month_or_missing(m)))
            .collect())
    }

    /// Four non-overlapping three month means covering the forecast horizon.
    pub fn seasonal_composites(&self) -> Result<Vec<SeasonalComposite>> {
        let months = self.window.forecast_months();

        months
            .chunks_exact(MONTHS_PER_SEASON)
            .map(|season| {
                let grids: Vec<Grid> = season
                    .iter()
                    .map(|&m| self.field.month_or_missing(m))
                    .collect();
                let grid_refs: Vec<&Grid> = grids.iter().collect();

                Ok(SeasonalComposite {
                    months: [season[0], season[1], season[2]],
                    grid: Grid::mean_of(&grid_refs)?,
                })
            })
            .collect()
    }
}

/// Latitude averaged sea surface temperature anomaly along the equator, observed history
/// followed by the ensemble mean forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct EquatorialSection {
    /// Longitudes, 0..360 west to east.
    pub lons: Vec<f64>,
    /// The months of each row, oldest first.
    pub months: Vec<ForecastMonth>,
    /// One row per month, one value per longitude.
    pub rows: Vec<Vec<Optioned<f64>>>,
}

impl EquatorialSection {
    /// Number of rows that are observations rather than forecast.
    pub const OBSERVED_ROWS: usize = TimeWindow::LOOK_BACK;
}

/// Build the equatorial section for a window.
///
/// Observed rows are interpolated onto the model longitudes when the two datasets are on
/// different grids.
pub fn equatorial_section(
    window: TimeWindow,
    observed: &dyn Dataset,
    mme: &dyn Dataset,
) -> Result<EquatorialSection> {
    let obs_months = window.observed_months();
    let fcst_months = window.forecast_months();

    let obs_field = observed.read_field(
        &FieldRequest::new(FieldVariable::ObservedSst.dataset_name())
            .with_months(obs_months[0], obs_months[obs_months.len() - 1]),
    )?;
    let mme_field = mme.read_field(
        &FieldRequest::new(FieldVariable::OceanTemperature.dataset_name())
            .with_level(MODEL_SURFACE_LEVEL)
            .with_months(fcst_months[0], fcst_months[fcst_months.len() - 1]),
    )?;

    let mut lons: Option<Vec<f64>> = None;
    let mut rows = Vec::with_capacity(obs_months.len() + fcst_months.len());

    // Model rows first so their longitudes define the section
    let mut mme_rows = Vec::with_capacity(fcst_months.len());
    for &m in &fcst_months {
        let (row_lons, row) = mme_field
            .month_or_missing(m)
            .lat_band_mean(&EQUATORIAL_PACIFIC)?;
        if lons.is_none() {
            lons = Some(row_lons);
        }
        mme_rows.push(row);
    }
    let lons = lons.unwrap_or_default();

    for &m in &obs_months {
        let (obs_lons, row) = obs_field
            .month_or_missing(m)
            .lat_band_mean(&EQUATORIAL_PACIFIC)?;

        if obs_lons == lons {
            rows.push(row);
        } else {
            let xs: Vec<Optioned<f64>> = obs_lons.iter().map(|&x| Optioned::from(x)).collect();
            rows.push(
                lons.iter()
                    .map(|&lon| linear_interpolate(&xs, &row, lon))
                    .collect(),
            );
        }
    }
    rows.extend(mme_rows);

    let months = obs_months.into_iter().chain(fcst_months).collect();

    Ok(EquatorialSection { lons, months, rows })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        dataset::{GriddedVariable, MemoryDataset},
        utility::test_tools::approx_equal,
    };
    use optional::some;

    fn month(y: i32, m: u32) -> ForecastMonth {
        ForecastMonth::new(y, m).unwrap()
    }

    // value = month index + lon / 1000
    fn model(first: ForecastMonth, n_months: usize) -> MemoryDataset {
        let lats = vec![-2.0, 2.0];
        let lons: Vec<f64> = (0..360).step_by(20).map(f64::from).collect();
        let times: Vec<ForecastMonth> = (0..n_months).map(|i| first.offset(i as i32)).collect();
        let values = (0..n_months)
            .flat_map(|t| {
                let lons = lons.clone();
                (0..2).flat_map(move |_| {
                    let lons = lons.clone();
                    lons.into_iter().map(move |lon| some(t as f64 + lon / 1000.0))
                })
            })
            .collect();

        let var = GriddedVariable::with_levels(
            times.clone(),
            vec![MODEL_SURFACE_LEVEL],
            lats.clone(),
            lons.clone(),
            values,
        )
        .unwrap();
        let n_values = n_months * lats.len() * lons.len();
        let prect = GriddedVariable::new(times, lats, lons, vec![some(1.0e-8); n_values])
        .unwrap();
        MemoryDataset::new("model")
            .with_variable("thetao", var)
            .with_variable("PRECT", prect)
    }

    #[test]
    fn test_seasonal_composites_partition_horizon() {
        let anchor = month(2024, 3);
        let ds = model(anchor, 13);
        let fx = FieldExtractor::load(
            TimeWindow::new(anchor),
            &ds,
            FieldVariable::OceanTemperature,
            Some(MODEL_SURFACE_LEVEL),
            None,
        )
        .unwrap();

        let seasons = fx.seasonal_composites().unwrap();
        assert_eq!(seasons.len(), 4);
        for (n, season) in seasons.iter().enumerate() {
            assert_eq!(season.months[0], anchor.offset(3 * n as i32));
            // Mean of month indexes 3n, 3n+1, 3n+2 is 3n+1
            let v = season.grid.get(0, 0).unwrap();
            assert!(approx_equal(v, (3 * n + 1) as f64, 1.0e-9));
        }
        assert_eq!(seasons[0].label(), "202403-202405");
        assert_eq!(seasons[3].label(), "202412-202502");
    }

    #[test]
    fn test_missing_month_blanks_season() {
        let anchor = month(2024, 3);
        // Only 10 of the 12 months are present
        let ds = model(anchor, 10);
        let fx = FieldExtractor::load(
            TimeWindow::new(anchor),
            &ds,
            FieldVariable::OceanTemperature,
            Some(MODEL_SURFACE_LEVEL),
            None,
        )
        .unwrap();

        let seasons = fx.seasonal_composites().unwrap();
        assert_eq!(seasons[2].grid.count_present(), seasons[2].grid.values().len());
        assert_eq!(seasons[3].grid.count_present(), 0);
    }

    #[test]
    fn test_precipitation_scaled() {
        let anchor = month(2024, 3);
        let ds = model(anchor, 12);
        let fx = FieldExtractor::load(
            TimeWindow::new(anchor),
            &ds,
            FieldVariable::Precipitation,
            None,
            Some((-70.0, 70.0)),
        )
        .unwrap();

        let snaps = fx.monthly_snapshots(3).unwrap();
        assert_eq!(snaps.len(), 3);
        assert!(approx_equal(snaps[0].1.get(0, 0).unwrap(), 0.864, 1.0e-9));
        assert!(fx.monthly_snapshots(13).is_err());
    }

    #[test]
    fn test_equatorial_section() {
        let anchor = month(2024, 3);
        let mme = model(anchor, 12);

        let obs_lats = vec![0.0];
        let obs_lons: Vec<f64> = (0..360).step_by(10).map(f64::from).collect();
        let obs_times: Vec<ForecastMonth> = (0..6).map(|i| anchor.offset(i - 6)).collect();
        let obs_values = (0..6)
            .flat_map(|_| obs_lons.iter().map(|&lon| some(lon / 100.0)))
            .collect();
        let obs = MemoryDataset::new("obs").with_variable(
            "sst",
            GriddedVariable::new(obs_times, obs_lats, obs_lons, obs_values).unwrap(),
        );

        let section = equatorial_section(TimeWindow::new(anchor), &obs, &mme).unwrap();
        assert_eq!(section.rows.len(), 18);
        assert_eq!(section.months.len(), 18);
        assert_eq!(section.lons.first(), Some(&120.0));
        assert_eq!(section.lons.last(), Some(&280.0));
        // Observed rows on the model longitudes
        assert_eq!(section.rows[0].len(), section.lons.len());
        assert!(approx_equal(section.rows[0][0].unwrap(), 1.2, 1.0e-9));
        // First forecast row is month index 0
        assert!(approx_equal(section.rows[6][0].unwrap(), 0.12, 1.0e-9));
    }
}
