//! Access to gridded datasets by variable name, vertical level and month range.
//!
//! The [`Dataset`](trait.Dataset.html) trait is the seam between the extractors and storage. An
//! in-memory implementation is always available, NetCDF files are read when the crate is built
//! with the `netcdf` feature.

use crate::{
    error::{ReportError, Result},
    field::GriddedField,
    time_window::ForecastMonth,
};
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use optional::Optioned;
use std::{collections::HashMap, path::Path};
use tracing::debug;

#[cfg(feature = "netcdf")]
mod netcdf_file;
#[cfg(feature = "netcdf")]
pub use self::netcdf_file::NetCdfDataset;

/// What to read from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRequest {
    variable: String,
    level: Option<f64>,
    months: Option<(ForecastMonth, ForecastMonth)>,
}

impl FieldRequest {
    /// Request every month of a variable.
    pub fn new<S: Into<String>>(variable: S) -> Self {
        FieldRequest {
            variable: variable.into(),
            level: None,
            months: None,
        }
    }

    /// Builder method to select a single vertical level.
    #[inline]
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }

    /// Builder method to restrict the months read, `first` and `last` inclusive.
    #[inline]
    pub fn with_months(mut self, first: ForecastMonth, last: ForecastMonth) -> Self {
        self.months = Some((first, last));
        self
    }

    /// Name of the variable.
    #[inline]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Requested vertical level, if any.
    #[inline]
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Requested month range, if any.
    #[inline]
    pub fn months(&self) -> Option<(ForecastMonth, ForecastMonth)> {
        self.months
    }

    /// Does the request include this month?
    #[inline]
    pub fn wants_month(&self, month: ForecastMonth) -> bool {
        match self.months {
            Some((first, last)) => month >= first && month <= last,
            None => true,
        }
    }
}

/// A source of monthly gridded fields.
pub trait Dataset {
    /// Human readable description, used in logs and error messages.
    fn describe(&self) -> String;

    /// Read a variable, selecting a level and months as requested.
    ///
    /// Months in the requested range that are absent from the dataset are simply absent from
    /// the result. Requesting a level that is not on the level axis is an error, as is asking
    /// for a level of a variable that has none.
    fn read_field(&self, request: &FieldRequest) -> Result<GriddedField>;
}

/// A variable held in memory, (time, [level,] lat, lon).
#[derive(Debug, Clone, Default)]
pub struct GriddedVariable {
    times: Vec<ForecastMonth>,
    levels: Option<Vec<f64>>,
    lats: Vec<f64>,
    lons: Vec<f64>,
    values: Vec<Optioned<f64>>,
    units: Option<String>,
}

impl GriddedVariable {
    /// A variable without a vertical axis.
    pub fn new(
        times: Vec<ForecastMonth>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<Optioned<f64>>,
    ) -> Result<Self> {
        Self::check_len(values.len(), times.len() * lats.len() * lons.len())?;

        Ok(GriddedVariable {
            times,
            levels: None,
            lats,
            lons,
            values,
            units: None,
        })
    }

    /// A variable with a vertical axis, values ordered (time, level, lat, lon).
    pub fn with_levels(
        times: Vec<ForecastMonth>,
        levels: Vec<f64>,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<Optioned<f64>>,
    ) -> Result<Self> {
        Self::check_len(
            values.len(),
            times.len() * levels.len() * lats.len() * lons.len(),
        )?;

        Ok(GriddedVariable {
            times,
            levels: Some(levels),
            lats,
            lons,
            values,
            units: None,
        })
    }

    /// Builder method to set the units.
    pub fn with_units<S: Into<String>>(mut self, units: S) -> Self {
        self.units = Some(units.into());
        self
    }

    fn check_len(actual: usize, expected: usize) -> Result<()> {
        if actual != expected {
            Err(ReportError::ShapeMismatch(format!(
                "expected {} values, got {}",
                expected, actual
            )))
        } else {
            Ok(())
        }
    }

    fn select(&self, request: &FieldRequest) -> Result<GriddedField> {
        let n_grid = self.lats.len() * self.lons.len();

        let (level_idx, n_levels) = match (&self.levels, request.level()) {
            (Some(levels), Some(target)) => {
                (level_index(levels, target, request.variable())?, levels.len())
            }
            (Some(levels), None) if levels.len() == 1 => (0, 1),
            (Some(_), None) => {
                return Err(ReportError::InvalidInput(format!(
                    "`{}` has several levels and none was requested",
                    request.variable()
                )))
            }
            (None, Some(target)) => {
                return Err(ReportError::MissingLevel {
                    variable: request.variable().to_owned(),
                    level: target,
                })
            }
            (None, None) => (0, 1),
        };

        let time_idx = months_in_request(&self.times, request);
        let times = time_idx.iter().map(|&t| self.times[t]).collect();

        let mut values = Vec::with_capacity(time_idx.len() * n_grid);
        for t in time_idx {
            let start = (t * n_levels + level_idx) * n_grid;
            values.extend_from_slice(&self.values[start..start + n_grid]);
        }

        Ok(
            GriddedField::new(times, self.lats.clone(), self.lons.clone(), values)?
                .with_name(request.variable())
                .with_units(self.units.clone()),
        )
    }
}

/// A dataset held in memory, mostly for tests and derived products.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    name: String,
    variables: HashMap<String, GriddedVariable>,
}

impl MemoryDataset {
    /// Create an empty dataset.
    pub fn new<S: Into<String>>(name: S) -> Self {
        MemoryDataset {
            name: name.into(),
            variables: HashMap::new(),
        }
    }

    /// Builder method to add a variable.
    pub fn with_variable<S: Into<String>>(mut self, name: S, variable: GriddedVariable) -> Self {
        self.variables.insert(name.into(), variable);
        self
    }
}

impl Dataset for MemoryDataset {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn read_field(&self, request: &FieldRequest) -> Result<GriddedField> {
        let var = self
            .variables
            .get(request.variable())
            .ok_or_else(|| ReportError::MissingVariable {
                variable: request.variable().to_owned(),
                source_name: self.describe(),
            })?;

        var.select(request)
    }
}

/// Open a dataset file, choosing the reader from the file extension.
///
/// A file that does not exist is a `MissingFile` error whatever the build supports.
pub fn open_dataset(path: &Path) -> Result<Box<dyn Dataset>> {
    if !path.exists() {
        return Err(ReportError::MissingFile(path.to_path_buf()));
    }

    debug!(path = %path.display(), "opening dataset");

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("nc") | Some("nc4") | Some("cdf") => open_netcdf(path),
        _ => Err(ReportError::Unsupported(format!(
            "no reader for {}",
            path.display()
        ))),
    }
}

#[cfg(feature = "netcdf")]
fn open_netcdf(path: &Path) -> Result<Box<dyn Dataset>> {
    Ok(Box::new(NetCdfDataset::open(path)?))
}

#[cfg(not(feature = "netcdf"))]
fn open_netcdf(path: &Path) -> Result<Box<dyn Dataset>> {
    Err(ReportError::Unsupported(format!(
        "{} is NetCDF, rebuild with the `netcdf` feature",
        path.display()
    )))
}

/// Index of `target` on a level axis.
pub(crate) fn level_index(levels: &[f64], target: f64, variable: &str) -> Result<usize> {
    levels
        .iter()
        .position(|&lev| (lev - target).abs() < 1.0e-3)
        .ok_or_else(|| ReportError::MissingLevel {
            variable: variable.to_owned(),
            level: target,
        })
}

/// Time indexes the request asks for, in dataset order.
pub(crate) fn months_in_request(times: &[ForecastMonth], request: &FieldRequest) -> Vec<usize> {
    times
        .iter()
        .enumerate()
        .filter(|(_, &m)| request.wants_month(m))
        .map(|(i, _)| i)
        .collect()
}

/// Decode CF style `"<unit> since <reference>"` time offsets into months.
///
/// Supports days, hours, minutes, seconds and months. The reference may be a date, or a date and
/// time separated by a space or `T`, with or without zero padding.
///
/// # Examples
///
/// ```rust
/// use enso_report::{decode_time_units, ForecastMonth};
///
/// let months = decode_time_units("days since 1870-1-1 0:0:0", &[0.0, 31.0, 59.5]).unwrap();
/// assert_eq!(months[2], ForecastMonth::new(1870, 3).unwrap());
/// ```
pub fn decode_time_units(units: &str, offsets: &[f64]) -> Result<Vec<ForecastMonth>> {
    let bad = || ReportError::TimeUnits(units.to_owned());

    let (unit, reference) = units.split_once(" since ").ok_or_else(bad)?;
    let reference = parse_reference(reference.trim()).ok_or_else(bad)?;

    let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
        "days" | "day" | "d" => Some(86_400.0),
        "hours" | "hour" | "hrs" | "h" => Some(3_600.0),
        "minutes" | "minute" | "mins" | "min" => Some(60.0),
        "seconds" | "second" | "secs" | "sec" | "s" => Some(1.0),
        "months" | "month" => None,
        _ => return Err(bad()),
    };

    offsets
        .iter()
        .map(|&offset| {
            let when = match seconds_per_unit {
                Some(scale) => {
                    let secs = (offset * scale).round() as i64;
                    reference.checked_add_signed(Duration::seconds(secs))
                }
                None => {
                    let whole = offset.round() as i64;
                    if whole >= 0 {
                        reference.checked_add_months(Months::new(whole as u32))
                    } else {
                        reference.checked_sub_months(Months::new((-whole) as u32))
                    }
                }
            };

            when.map(|dt| ForecastMonth::from_date(dt.date()))
                .ok_or_else(bad)
        })
        .collect()
}

fn parse_reference(reference: &str) -> Option<NaiveDateTime> {
    let date_part = reference
        .split(|c: char| c == ' ' || c == 'T')
        .next()?
        .trim();

    let mut parts = date_part.splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next().unwrap_or("1").parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
mod test {
    use super::*;
    use optional::some;

    fn month(y: i32, m: u32) -> ForecastMonth {
        ForecastMonth::new(y, m).unwrap()
    }

    fn layered() -> MemoryDataset {
        let times = vec![month(2024, 1), month(2024, 2), month(2024, 3)];
        let levels = vec![5.0, 15.0];
        let lats = vec![0.0];
        let lons = vec![200.0, 210.0];
        // value = 100 * t + 10 * lev_idx + lon_idx
        let values = (0..3)
            .flat_map(|t| (0..2).flat_map(move |l| (0..2).map(move |j| (t, l, j))))
            .map(|(t, l, j)| some(f64::from(100 * t + 10 * l + j)))
            .collect();

        let var = GriddedVariable::with_levels(times, levels, lats, lons, values).unwrap();
        MemoryDataset::new("layered").with_variable("thetao", var)
    }

    #[test]
    fn test_level_and_month_selection() {
        let ds = layered();
        let req = FieldRequest::new("thetao")
            .with_level(15.0)
            .with_months(month(2024, 2), month(2024, 6));

        let field = ds.read_field(&req).unwrap();
        assert_eq!(field.times(), &[month(2024, 2), month(2024, 3)]);
        assert_eq!(field.snapshot(0).values(), &[some(110.0), some(111.0)]);
        assert_eq!(field.snapshot(1).values(), &[some(210.0), some(211.0)]);
        assert_eq!(field.name(), "thetao");
    }

    #[test]
    fn test_missing_things() {
        let ds = layered();

        let missing_var = ds.read_field(&FieldRequest::new("sst"));
        assert!(matches!(
            missing_var,
            Err(ReportError::MissingVariable { .. })
        ));

        let missing_level = ds.read_field(&FieldRequest::new("thetao").with_level(50.0));
        assert!(matches!(missing_level, Err(ReportError::MissingLevel { .. })));

        let no_level = ds.read_field(&FieldRequest::new("thetao"));
        assert!(matches!(no_level, Err(ReportError::InvalidInput(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let res = open_dataset(Path::new("definitely/not/here.nc"));
        assert!(matches!(res, Err(ReportError::MissingFile(_))));
    }

    #[test]
    fn test_decode_days() {
        let months = decode_time_units(
            "days since 1870-01-01 00:00:00",
            &[0.0, 15.5, 45.0, 365.0],
        )
        .unwrap();
        assert_eq!(
            months,
            vec![month(1870, 1), month(1870, 1), month(1870, 2), month(1871, 1)]
        );
    }

    #[test]
    fn test_decode_hours_and_months() {
        let months = decode_time_units("hours since 2000-1-1", &[24.0 * 31.0]).unwrap();
        assert_eq!(months, vec![month(2000, 2)]);

        let months = decode_time_units("months since 2023-11-01", &[0.0, 1.0, 2.0, -1.0]).unwrap();
        assert_eq!(
            months,
            vec![month(2023, 11), month(2023, 12), month(2024, 1), month(2023, 10)]
        );

        let months = decode_time_units("days since 2024-03-01T00:00:00", &[0.0]).unwrap();
        assert_eq!(months, vec![month(2024, 3)]);
    }

    #[test]
    fn test_decode_bad_units() {
        assert!(decode_time_units("fortnights since 2000-01-01", &[1.0]).is_err());
        assert!(decode_time_units("days after 2000-01-01", &[1.0]).is_err());
        assert!(decode_time_units("days since yesterday", &[1.0]).is_err());
    }
}
