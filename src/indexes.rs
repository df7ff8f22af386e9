//! Climate index time series from observed and forecast sea surface temperature anomalies.

use crate::{
    dataset::{Dataset, FieldRequest},
    error::{ReportError, Result},
    field::GriddedField,
    keys::{ClimateIndex, FieldVariable, LegendCorner},
    time_window::{ForecastMonth, TimeWindow},
    utility::mean_present,
};
use optional::Optioned;
use tracing::{debug, info};

/// Level of the model ocean temperature used as sea surface temperature (m).
pub const MODEL_SURFACE_LEVEL: f64 = 5.0;

/// One index over a forecast window: observed history, ensemble mean forecast and every member's
/// forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSeries {
    index: ClimateIndex,
    window: TimeWindow,
    observed: Vec<Optioned<f64>>,
    mme: Vec<Optioned<f64>>,
    members: Vec<Vec<Optioned<f64>>>,
}

impl IndexSeries {
    /// Assemble a series, checking the lengths against the window.
    pub fn new(
        index: ClimateIndex,
        window: TimeWindow,
        observed: Vec<Optioned<f64>>,
        mme: Vec<Optioned<f64>>,
        members: Vec<Vec<Optioned<f64>>>,
    ) -> Result<Self> {
        if observed.len() != TimeWindow::LOOK_BACK
            || mme.len() != TimeWindow::LOOK_AHEAD
            || members.iter().any(|m| m.len() != TimeWindow::LOOK_AHEAD)
        {
            return Err(ReportError::ShapeMismatch(format!(
                "{} series needs {} observed and {} forecast points",
                index.plot_name(),
                TimeWindow::LOOK_BACK,
                TimeWindow::LOOK_AHEAD
            )));
        }

        Ok(IndexSeries {
            index,
            window,
            observed,
            mme,
            members,
        })
    }

    /// Which index this is.
    #[inline]
    pub fn index(&self) -> ClimateIndex {
        self.index
    }

    /// The window the series covers.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Observed values, oldest first.
    #[inline]
    pub fn observed(&self) -> &[Optioned<f64>] {
        &self.observed
    }

    /// Ensemble mean forecast, starting at the anchor month.
    #[inline]
    pub fn mme(&self) -> &[Optioned<f64>] {
        &self.mme
    }

    /// Member forecasts, in the order the member datasets were supplied.
    #[inline]
    pub fn members(&self) -> &[Vec<Optioned<f64>>] {
        &self.members
    }

    /// Mean of the observed values that are present.
    pub fn observed_mean(&self) -> Optioned<f64> {
        mean_present(&self.observed)
    }

    /// Put the legend below warm histories and above cool ones.
    pub fn legend_corner(&self) -> LegendCorner {
        match self.observed_mean().into_option() {
            Some(mean) if mean >= 0.0 => LegendCorner::LowerLeft,
            _ => LegendCorner::UpperLeft,
        }
    }
}

/// Holds the observed, ensemble mean, and member fields for a window so every index can be
/// computed without re-reading the datasets.
#[derive(Debug, Clone)]
pub struct IndexExtractor {
    window: TimeWindow,
    observed: GriddedField,
    mme: GriddedField,
    members: Vec<GriddedField>,
}

impl IndexExtractor {
    /// Read the months of the window from each dataset.
    ///
    /// Observed anomalies come from the `sst` variable, forecasts from `thetao` at the surface
    /// level.
    pub fn load(
        window: TimeWindow,
        observed: &dyn Dataset,
        mme: &dyn Dataset,
        members: &[&dyn Dataset],
    ) -> Result<Self> {
        let obs_months = window.observed_months();
        let fcst_months = window.forecast_months();

        let obs_request = FieldRequest::new(FieldVariable::ObservedSst.dataset_name())
            .with_months(obs_months[0], obs_months[obs_months.len() - 1]);
        let fcst_request = FieldRequest::new(FieldVariable::OceanTemperature.dataset_name())
            .with_level(MODEL_SURFACE_LEVEL)
            .with_months(fcst_months[0], fcst_months[fcst_months.len() - 1]);

        debug!(source = %observed.describe(), "reading observed anomalies");
        let observed = observed.read_field(&obs_request)?;
        debug!(source = %mme.describe(), "reading ensemble mean");
        let mme = mme.read_field(&fcst_request)?;
        let members = members
            .iter()
            .map(|ds| {
                debug!(source = %ds.describe(), "reading ensemble member");
                ds.read_field(&fcst_request)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            anchor = %window.anchor(),
            members = members.len(),
            "loaded index inputs"
        );

        Ok(IndexExtractor {
            window,
            observed,
            mme,
            members,
        })
    }

    /// The window this extractor was loaded for.
    #[inline]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Compute one index.
    pub fn extract(&self, index: ClimateIndex) -> Result<IndexSeries> {
        let obs_months = self.window.observed_months();
        let fcst_months = self.window.forecast_months();

        let observed = index_values(&self.observed, &obs_months, index)?;
        let mme = index_values(&self.mme, &fcst_months, index)?;
        let members = self
            .members
            .iter()
            .map(|member| index_values(member, &fcst_months, index))
            .collect::<Result<Vec<_>>>()?;

        IndexSeries::new(index, self.window, observed, mme, members)
    }
}

/// Read everything needed and compute a single index.
pub fn extract_index(
    window: TimeWindow,
    index: ClimateIndex,
    observed: &dyn Dataset,
    mme: &dyn Dataset,
    members: &[&dyn Dataset],
) -> Result<IndexSeries> {
    IndexExtractor::load(window, observed, mme, members)?.extract(index)
}

/// Evaluate an index's weighted box combination for each month.
fn index_values(
    field: &GriddedField,
    months: &[ForecastMonth],
    index: ClimateIndex,
) -> Result<Vec<Optioned<f64>>> {
    let components = index
        .components()
        .iter()
        .map(|(weight, region)| {
            field
                .area_mean_series(months, region)
                .map(|series| (*weight, series))
        })
        .collect::<Result<Vec<_>>>()?;

    let combined = (0..months.len())
        .map(|k| {
            let value = components
                .iter()
                // A missing component makes the whole index missing
                .try_fold(0.0, |acc, (weight, series)| {
                    series[k].into_option().map(|v| acc + weight * v)
                });
            Optioned::from(value)
        })
        .collect();

    Ok(combined)
}

/// Observed and MME values as chart points: x = 1..6 for the history, 7..18 for the forecast.
pub fn chart_positions(
    series: &IndexSeries,
) -> (Vec<(f64, Optioned<f64>)>, Vec<(f64, Optioned<f64>)>) {
    let obs = series
        .observed()
        .iter()
        .enumerate()
        .map(|(i, v)| ((i + 1) as f64, *v))
        .collect();

    let first_fcst = (TimeWindow::LOOK_BACK + 1) as f64;
    let mme = series
        .mme()
        .iter()
        .enumerate()
        .map(|(i, v)| (first_fcst + i as f64, *v))
        .collect();

    (obs, mme)
}
