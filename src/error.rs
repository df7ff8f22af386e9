//! Error types for the enso-report crate.
use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Error type for the crate.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An input file that is required for a chart or deck does not exist.
    #[error("missing input file: {}", .0.display())]
    MissingFile(PathBuf),
    /// A dataset does not contain the requested variable.
    #[error("variable `{variable}` not found in {source_name}")]
    MissingVariable {
        /// Name of the variable that was requested.
        variable: String,
        /// Description of the dataset that was searched.
        source_name: String,
    },
    /// A variable lacks one of the dimensions (time, lat, lon) needed for analysis.
    #[error("variable `{variable}` has no `{dimension}` dimension")]
    MissingDimension {
        /// Name of the variable.
        variable: String,
        /// Name of the missing dimension.
        dimension: String,
    },
    /// The requested vertical level is not on the variable's level axis.
    #[error("level {level} not available for `{variable}`")]
    MissingLevel {
        /// Name of the variable.
        variable: String,
        /// Requested level.
        level: f64,
    },
    /// A region selects no grid points at all.
    #[error("region {0} contains no grid points")]
    EmptyRegion(String),
    /// Array sizes do not agree with the coordinate axes.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// Bad or invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A time axis could not be decoded.
    #[error("unable to decode time units `{0}`")]
    TimeUnits(String),

    /// Drawing a chart failed.
    #[error("rendering failed: {0}")]
    Render(String),
    /// Converting a vector image to a raster failed.
    #[error("unable to rasterize {}: {reason}", path.display())]
    Raster {
        /// The image being converted.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// An image expected by a slide deck is not on disk.
    #[error("image required by the slide deck is missing: {}", .0.display())]
    MissingImage(PathBuf),
    /// Writing the presentation container failed.
    #[error("unable to build presentation archive")]
    Archive(#[from] zip::result::ZipError),

    /// Forward an I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error("unable to parse configuration")]
    Config(#[from] toml::de::Error),
    /// A shapefile could not be read.
    #[error("unable to read shapefile")]
    Shapefile(#[from] shapefile::Error),
    /// A CSV table could not be read.
    #[error("unable to read table")]
    Csv(#[from] csv::Error),
    /// Forward an error from the NetCDF library.
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error")]
    NetCdf(#[from] netcdf::Error),
    /// Something was requested that this build does not support.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, ReportError>;

impl<E> From<DrawingAreaErrorKind<E>> for ReportError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ReportError::Render(err.to_string())
    }
}
