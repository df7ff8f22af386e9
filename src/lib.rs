#![warn(missing_docs)]
//! Charts and slide decks for the monthly ENSO forecast briefing and the hindcast skill report.
//!
//! Observed and forecast sea surface temperature anomalies are reduced to climate indices and
//! map-ready fields, drawn as SVG charts and assembled into presentation decks.

//
// API
//
pub use crate::config::ReportConfig;
pub use crate::dataset::{decode_time_units, open_dataset, Dataset, FieldRequest, MemoryDataset};
pub use crate::deck::SlideDeck;
pub use crate::error::{ReportError, Result};
pub use crate::field::{Grid, GriddedField};
pub use crate::indexes::{IndexExtractor, IndexSeries};
pub use crate::interpolation::linear_interpolate;
pub use crate::keys::{ClimateIndex, FieldVariable, LegendCorner};
pub use crate::region::RegionBox;
pub use crate::time_window::{ForecastMonth, TimeWindow};

pub mod charts;
pub mod config;
pub mod dataset;
pub mod deck;
pub mod field;
pub mod fields;
pub mod indexes;
pub mod interpolation;
pub mod keys;
pub mod mask;
pub mod region;
pub mod render;
pub mod skill;
pub mod time_window;

/// Utility functions for working with missing values and numeric ranges.
pub mod utility;

//
// Internal use only
//
mod error;
