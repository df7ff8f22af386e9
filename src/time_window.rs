//! Calendar months and the fixed observed/forecast window around a forecast start.

use crate::error::{ReportError, Result};
use chrono::{Datelike, NaiveDate};
use std::{fmt, str::FromStr};

/// A calendar month, the time resolution of every dataset handled by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastMonth {
    year: i32,
    month: u32,
}

impl ForecastMonth {
    /// Create a month, validating the month number and keeping the year to four digits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use enso_report::ForecastMonth;
    ///
    /// let m = ForecastMonth::new(2024, 3).unwrap();
    /// assert_eq!(m.to_string(), "2024-03");
    /// assert_eq!(m.label(), "202403");
    /// assert!(ForecastMonth::new(2024, 13).is_err());
    /// ```
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ReportError::InvalidInput(format!(
                "month must be 1-12, got {}",
                month
            )));
        }
        if !(1..=9999).contains(&year) {
            return Err(ReportError::InvalidInput(format!(
                "year must be 1-9999, got {}",
                year
            )));
        }

        Ok(ForecastMonth { year, month })
    }

    /// The month containing this date.
    #[inline]
    pub fn from_date(date: NaiveDate) -> Self {
        ForecastMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year.
    #[inline]
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, 1-12.
    #[inline]
    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month `months` later (or earlier if negative).
    #[inline]
    pub fn offset(self, months: i32) -> Self {
        let idx = self.year * 12 + self.month as i32 - 1 + months;
        ForecastMonth {
            year: idx.div_euclid(12),
            month: idx.rem_euclid(12) as u32 + 1,
        }
    }

    /// Number of months from `self` until `later`, negative if `later` is earlier.
    #[inline]
    pub fn months_until(&self, later: ForecastMonth) -> i32 {
        (later.year - self.year) * 12 + later.month as i32 - self.month as i32
    }

    /// Axis label, `YYYYMM`.
    pub fn label(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    /// Tag used in output file names, `YYYY_MM`.
    pub fn file_tag(&self) -> String {
        format!("{:04}_{:02}", self.year, self.month)
    }
}

impl fmt::Display for ForecastMonth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ForecastMonth {
    type Err = ReportError;

    /// Parse `YYYY-MM`, `YYYY-M` or `YYYYMM`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || ReportError::InvalidInput(format!("unable to parse month from `{}`", s));

        let (year, month) = match s.split_once('-') {
            Some((y, m)) => (y, m),
            None if s.len() == 6 && s.is_char_boundary(4) => s.split_at(4),
            None => return Err(bad()),
        };

        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u32 = month.parse().map_err(|_| bad())?;
        ForecastMonth::new(year, month)
    }
}

/// The observed history and forecast horizon around a forecast start month.
///
/// History covers the 6 months before the anchor, the horizon covers the anchor month and the 11
/// that follow, and chart axes are labelled over 19 consecutive months starting with the first
/// history month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    anchor: ForecastMonth,
}

impl TimeWindow {
    /// Months of observed history before the anchor.
    pub const LOOK_BACK: usize = 6;
    /// Months in the forecast horizon, starting with the anchor.
    pub const LOOK_AHEAD: usize = 12;
    /// Months labelled along chart time axes.
    pub const AXIS_SPAN: usize = 19;

    /// Create a window around a forecast start.
    pub fn new(anchor: ForecastMonth) -> Self {
        TimeWindow { anchor }
    }

    /// The forecast start month.
    #[inline]
    pub fn anchor(&self) -> ForecastMonth {
        self.anchor
    }

    /// The observed months, oldest first. The last one is the month before the anchor.
    pub fn observed_months(&self) -> Vec<ForecastMonth> {
        (0..Self::LOOK_BACK)
            .map(|i| self.anchor.offset(i as i32 - Self::LOOK_BACK as i32))
            .collect()
    }

    /// The forecast months, starting with the anchor.
    pub fn forecast_months(&self) -> Vec<ForecastMonth> {
        (0..Self::LOOK_AHEAD)
            .map(|i| self.anchor.offset(i as i32))
            .collect()
    }

    /// All months labelled along a chart time axis, oldest first.
    pub fn axis_months(&self) -> Vec<ForecastMonth> {
        let start = self.anchor.offset(-(Self::LOOK_BACK as i32));
        (0..Self::AXIS_SPAN)
            .map(|i| start.offset(i as i32))
            .collect()
    }

    /// `YYYYMM` labels for [`axis_months`](#method.axis_months).
    pub fn axis_labels(&self) -> Vec<String> {
        self.axis_months().iter().map(|m| m.label()).collect()
    }
}
