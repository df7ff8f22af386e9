use super::{decode_time_units, level_index, Dataset, FieldRequest};
use crate::{
    error::{ReportError, Result},
    field::GriddedField,
    time_window::ForecastMonth,
    utility::present_or_none,
};
use netcdf::{AttributeValue, Extent, Variable};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A NetCDF file opened for reading.
pub struct NetCdfDataset {
    path: PathBuf,
    file: netcdf::File,
}

// Axis roles recognised from dimension names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Time,
    Level,
    Lat,
    Lon,
}

fn axis_role(dim_name: &str) -> Option<Axis> {
    match dim_name.to_lowercase().as_str() {
        "time" | "t" => Some(Axis::Time),
        "lev" | "level" | "plev" | "depth" | "z" => Some(Axis::Level),
        "lat" | "latitude" | "y" => Some(Axis::Lat),
        "lon" | "longitude" | "x" => Some(Axis::Lon),
        _ => None,
    }
}

impl NetCdfDataset {
    /// Open a file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingFile(path.to_path_buf()));
        }

        let file = netcdf::open(path)?;
        Ok(NetCdfDataset {
            path: path.to_path_buf(),
            file,
        })
    }

    fn variable(&self, name: &str) -> Result<Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| ReportError::MissingVariable {
                variable: name.to_owned(),
                source_name: self.describe(),
            })
    }

    fn coordinate(&self, dim_name: &str) -> Result<Vec<f64>> {
        let var = self.variable(dim_name)?;
        Ok(var.get_values::<f64, _>(..)?)
    }

    fn times(&self, dim_name: &str) -> Result<Vec<ForecastMonth>> {
        let var = self.variable(dim_name)?;
        let offsets = var.get_values::<f64, _>(..)?;
        let units = string_attribute(&var, "units")
            .ok_or_else(|| ReportError::TimeUnits(format!("{} has no units", dim_name)))?;

        decode_time_units(&units, &offsets)
    }
}

impl Dataset for NetCdfDataset {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_field(&self, request: &FieldRequest) -> Result<GriddedField> {
        let var = self.variable(request.variable())?;

        let dims: Vec<(String, usize)> = var
            .dimensions()
            .iter()
            .map(|d| (d.name(), d.len()))
            .collect();

        let find = |axis: Axis| {
            dims.iter()
                .position(|(name, _)| axis_role(name) == Some(axis))
        };
        let missing_dim = |name: &str| ReportError::MissingDimension {
            variable: request.variable().to_owned(),
            dimension: name.to_owned(),
        };

        let time_pos = find(Axis::Time).ok_or_else(|| missing_dim("time"))?;
        let lat_pos = find(Axis::Lat).ok_or_else(|| missing_dim("lat"))?;
        let lon_pos = find(Axis::Lon).ok_or_else(|| missing_dim("lon"))?;
        let level_pos = find(Axis::Level);

        let times = self.times(&dims[time_pos].0)?;
        let lats = self.coordinate(&dims[lat_pos].0)?;
        let lons = self.coordinate(&dims[lon_pos].0)?;

        let level_idx = match (level_pos, request.level()) {
            (Some(pos), Some(target)) => {
                let levels = self.coordinate(&dims[pos].0)?;
                Some(level_index(&levels, target, request.variable())?)
            }
            (Some(pos), None) if dims[pos].1 == 1 => Some(0),
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
            (None, None) => None,
        };

        // Read the contiguous span of time steps covering the request, then drop extras.
        let wanted = super::months_in_request(&times, request);
        let (t0, t1) = match (wanted.first(), wanted.last()) {
            (Some(&first), Some(&last)) => (first, last + 1),
            _ => {
                return Ok(GriddedField::new(vec![], lats, lons, vec![])?
                    .with_name(request.variable())
                    .with_units(string_attribute(&var, "units")))
            }
        };

        let extents: Vec<Extent> = dims
            .iter()
            .enumerate()
            .map(|(pos, (_, len))| {
                if pos == time_pos {
                    Extent::from(t0..t1)
                } else if Some(pos) == level_pos {
                    let lev = level_idx.unwrap_or(0);
                    Extent::from(lev..lev + 1)
                } else {
                    Extent::from(0..*len)
                }
            })
            .collect();

        debug!(
            variable = request.variable(),
            file = %self.path.display(),
            steps = t1 - t0,
            "reading hyperslab"
        );

        let raw = var.get_values::<f64, _>(extents)?;
        let fill = numeric_attribute(&var, "_FillValue")
            .or_else(|| numeric_attribute(&var, "missing_value"));

        // Remaining axes after the level is dropped, in file order.
        let lat_first = lat_pos < lon_pos;
        let n_lat = lats.len();
        let n_lon = lons.len();
        let n_grid = n_lat * n_lon;

        let mut values = Vec::with_capacity(wanted.len() * n_grid);
        let mut kept_times = Vec::with_capacity(wanted.len());
        for &t in &wanted {
            let base = (t - t0) * n_grid;
            kept_times.push(times[t]);
            for i in 0..n_lat {
                for j in 0..n_lon {
                    let k = if lat_first { i * n_lon + j } else { j * n_lat + i };
                    values.push(present_or_none(raw[base + k], fill));
                }
            }
        }

        Ok(GriddedField::new(kept_times, lats, lons, values)?
            .with_name(request.variable())
            .with_units(string_attribute(&var, "units")))
    }
}

fn string_attribute(var: &Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn numeric_attribute(var: &Variable, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|&x| f64::from(x)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        _ => None,
    }
}
