//! Hindcast skill: anomaly correlation, root mean square error, pattern correlation and the
//! spring predictability barrier.

use crate::{
    error::{ReportError, Result},
    field::Grid,
    time_window::ForecastMonth,
    utility::present_or_none,
};
use itertools::izip;
use optional::Optioned;
use serde::Deserialize;
use std::{collections::HashMap, path::Path};
use tracing::debug;

/// Anomaly correlation coefficient (Pearson correlation) over the pairs where both values are
/// present. `None` with fewer than two pairs or when either side has no variance.
pub fn acc(forecast: &[Optioned<f64>], observed: &[Optioned<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = present_pairs(forecast, observed);
    correlation(&pairs)
}

/// Root mean square error over the pairs where both values are present.
pub fn rmse(forecast: &[Optioned<f64>], observed: &[Optioned<f64>]) -> Option<f64> {
    let pairs = present_pairs(forecast, observed);
    if pairs.is_empty() {
        return None;
    }

    let sum_sq: f64 = pairs.iter().map(|(f, o)| (f - o) * (f - o)).sum();
    Some((sum_sq / pairs.len() as f64).sqrt())
}

/// Centered spatial correlation between two grids on the same coordinates.
pub fn pattern_correlation(forecast: &Grid, observed: &Grid) -> Result<Option<f64>> {
    if forecast.lats() != observed.lats() || forecast.lons() != observed.lons() {
        return Err(ReportError::ShapeMismatch(
            "pattern correlation needs grids on the same coordinates".to_owned(),
        ));
    }

    let pairs = present_pairs(forecast.values(), observed.values());
    Ok(correlation(&pairs))
}

fn present_pairs(a: &[Optioned<f64>], b: &[Optioned<f64>]) -> Vec<(f64, f64)> {
    debug_assert_eq!(a.len(), b.len());

    izip!(a, b)
        .filter_map(|(a, b)| match (a.into_option(), b.into_option()) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .collect()
}

fn correlation(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let (sum_a, sum_b) = pairs
        .iter()
        .fold((0.0, 0.0), |(sa, sb), (a, b)| (sa + a, sb + b));
    let (mean_a, mean_b) = (sum_a / n, sum_b / n);

    let (cov, var_a, var_b) = pairs.iter().fold((0.0, 0.0, 0.0), |(c, va, vb), (a, b)| {
        let (da, db) = (a - mean_a, b - mean_b);
        (c + da * db, va + da * da, vb + db * db)
    });

    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return None;
    }

    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Forecast values of an index for a set of start months and leads.
///
/// Lead 1 is the start month itself, lead `k` verifies `k - 1` months after the start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hindcast {
    starts: Vec<ForecastMonth>,
    // [start][lead - 1]
    values: Vec<Vec<Optioned<f64>>>,
    leads: usize,
}

impl Hindcast {
    /// Build from rows of forecasts, one per start month, all the same length.
    pub fn new(starts: Vec<ForecastMonth>, values: Vec<Vec<Optioned<f64>>>) -> Result<Self> {
        if starts.len() != values.len() {
            return Err(ReportError::ShapeMismatch(format!(
                "{} start months but {} rows",
                starts.len(),
                values.len()
            )));
        }

        let leads = values.first().map(|row| row.len()).unwrap_or(0);
        if values.iter().any(|row| row.len() != leads) {
            return Err(ReportError::ShapeMismatch(
                "hindcast rows have different numbers of leads".to_owned(),
            ));
        }

        Ok(Hindcast {
            starts,
            values,
            leads,
        })
    }

    /// Read a CSV table with a header `start,lead1,...,leadN` and `YYYY-MM` start months. Empty
    /// cells and `NaN` are missing.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingFile(path.to_path_buf()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut starts = Vec::new();
        let mut values = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let start: ForecastMonth = fields
                .next()
                .ok_or_else(|| ReportError::InvalidInput("empty hindcast row".to_owned()))?
                .parse()?;

            starts.push(start);
            values.push(fields.map(parse_cell).collect::<Result<Vec<_>>>()?);
        }

        debug!(path = %path.display(), starts = starts.len(), "loaded hindcast");
        Hindcast::new(starts, values)
    }

    /// The start months.
    pub fn starts(&self) -> &[ForecastMonth] {
        &self.starts
    }

    /// Number of leads per start.
    pub fn leads(&self) -> usize {
        self.leads
    }

    /// Forecasts at one lead (1-based) with the months they verify.
    fn at_lead(
        &self,
        lead: usize,
    ) -> impl Iterator<Item = (ForecastMonth, ForecastMonth, Optioned<f64>)> + '_ {
        izip!(&self.starts, &self.values)
            .map(move |(&start, row)| (start, start.offset(lead as i32 - 1), row[lead - 1]))
    }
}

/// An observed monthly series keyed by month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedSeries {
    values: HashMap<ForecastMonth, f64>,
}

#[derive(Debug, Deserialize)]
struct ObservedRow {
    month: String,
    value: String,
}

impl ObservedSeries {
    /// Build from (month, value) pairs.
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (ForecastMonth, f64)>,
    {
        ObservedSeries {
            values: values.into_iter().collect(),
        }
    }

    /// Read a CSV table with the header `month,value`.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingFile(path.to_path_buf()));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut values: HashMap<ForecastMonth, f64> = HashMap::new();
        for row in reader.deserialize() {
            let row: ObservedRow = row?;
            if let Some(v) = parse_cell(&row.value)?.into_option() {
                let month: ForecastMonth = row.month.parse()?;
                values.insert(month, v);
            }
        }

        Ok(ObservedSeries { values })
    }

    /// The value for a month, if observed.
    pub fn get(&self, month: ForecastMonth) -> Optioned<f64> {
        Optioned::from(self.values.get(&month).copied())
    }
}

fn parse_cell(cell: &str) -> Result<Optioned<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(optional::none());
    }

    cell.parse::<f64>()
        .map(|v| present_or_none(v, None))
        .map_err(|_| ReportError::InvalidInput(format!("`{}` is not a number", cell)))
}

/// Skill of the index at one lead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeadSkill {
    /// Lead, 1-based.
    pub lead: usize,
    /// Anomaly correlation.
    pub acc: Option<f64>,
    /// Root mean square error.
    pub rmse: Option<f64>,
}

/// ACC and RMSE for every lead.
pub fn skill_by_lead(hindcast: &Hindcast, observed: &ObservedSeries) -> Vec<LeadSkill> {
    (1..=hindcast.leads())
        .map(|lead| {
            let (fcst, obs): (Vec<_>, Vec<_>) = hindcast
                .at_lead(lead)
                .map(|(_, valid, v)| (v, observed.get(valid)))
                .unzip();

            LeadSkill {
                lead,
                acc: acc(&fcst, &obs),
                rmse: rmse(&fcst, &obs),
            }
        })
        .collect()
}

/// ACC by calendar month of the start (rows, January first) and lead (columns).
///
/// A drop in skill for forecasts that cross boreal spring shows up as a diagonal band of low
/// values.
pub fn spb_matrix(hindcast: &Hindcast, observed: &ObservedSeries) -> Vec<Vec<Option<f64>>> {
    (1..=12)
        .map(|calendar_month| {
            (1..=hindcast.leads())
                .map(|lead| {
                    let (fcst, obs): (Vec<_>, Vec<_>) = hindcast
                        .at_lead(lead)
                        .filter(|(start, _, _)| start.month() == calendar_month)
                        .map(|(_, valid, v)| (v, observed.get(valid)))
                        .unzip();
                    acc(&fcst, &obs)
                })
                .collect()
        })
        .collect()
}
