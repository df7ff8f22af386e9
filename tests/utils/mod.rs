#![allow(dead_code)]
//! Synthetic datasets shaped like the report inputs.

use enso_report::{
    dataset::GriddedVariable, indexes::MODEL_SURFACE_LEVEL, mask::BoundaryPolygon, ForecastMonth,
    MemoryDataset, TimeWindow,
};
use geo::{LineString, Polygon};
use optional::{some, Optioned};

/// Forecast start used throughout the tests.
pub fn anchor() -> ForecastMonth {
    ForecastMonth::new(2024, 3).unwrap()
}

pub fn window() -> TimeWindow {
    TimeWindow::new(anchor())
}

/// `start, start + step, ...` up to and including `stop`.
pub fn axis(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).round() as usize + 1;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// A smooth anomaly pattern, warm in the eastern Pacific, drifting with time.
pub fn anomaly(lat: f64, lon: f64, step: usize) -> f64 {
    let wave = (lon - 150.0).to_radians().sin();
    let taper = 1.0 - lat.abs() / 90.0;
    wave * taper + 0.1 * step as f64
}

fn values<F>(n_times: usize, levels: &[f64], lats: &[f64], lons: &[f64], f: F) -> Vec<Optioned<f64>>
where
    F: Fn(usize, f64, f64, f64) -> f64,
{
    let mut vals = Vec::with_capacity(n_times * levels.len() * lats.len() * lons.len());
    for t in 0..n_times {
        for &lev in levels {
            for &lat in lats {
                for &lon in lons {
                    vals.push(some(f(t, lev, lat, lon)));
                }
            }
        }
    }
    vals
}

fn months(first: ForecastMonth, n: usize) -> Vec<ForecastMonth> {
    (0..n).map(|i| first.offset(i as i32)).collect()
}

/// Observed `sst` on a 2 degree tropical grid covering a year of history before the anchor.
pub fn observed_dataset(window: TimeWindow) -> MemoryDataset {
    let times = months(window.anchor().offset(-12), 12);
    let lats = axis(-30.0, 30.0, 2.0);
    let lons = axis(0.0, 358.0, 2.0);
    let vals = values(times.len(), &[0.0], &lats, &lons, |t, _, lat, lon| {
        anomaly(lat, lon, t)
    });

    let sst = GriddedVariable::new(times, lats, lons, vals)
        .unwrap()
        .with_units("K");
    MemoryDataset::new("observed").with_variable("sst", sst)
}

/// Model `thetao` at two depths over the forecast horizon, shifted by `bias`.
pub fn ocean_dataset(window: TimeWindow, bias: f64) -> MemoryDataset {
    let times = window.forecast_months();
    let levels = vec![MODEL_SURFACE_LEVEL, 25.0];
    let lats = axis(-30.0, 30.0, 2.0);
    let lons = axis(0.0, 358.0, 2.0);
    let vals = values(times.len(), &levels, &lats, &lons, |t, lev, lat, lon| {
        anomaly(lat, lon, t) * MODEL_SURFACE_LEVEL / lev + bias
    });

    let thetao = GriddedVariable::with_levels(times, levels, lats, lons, vals)
        .unwrap()
        .with_units("K");
    MemoryDataset::new(format!("ocean{:+}", bias)).with_variable("thetao", thetao)
}

/// Height and wind anomalies on the three chart levels, 5 degree global grid.
pub fn atmosphere_4d(window: TimeWindow) -> MemoryDataset {
    let times = window.forecast_months();
    let levels = vec![850.0, 500.0, 200.0];
    let lats = axis(-80.0, 80.0, 5.0);
    let lons = axis(0.0, 355.0, 5.0);

    let var = |scale: f64| {
        let vals = values(times.len(), &levels, &lats, &lons, |t, lev, lat, lon| {
            scale * anomaly(lat, lon, t) * (1000.0 / lev).sqrt()
        });
        GriddedVariable::with_levels(times.clone(), levels.clone(), lats.clone(), lons.clone(), vals)
            .unwrap()
    };

    MemoryDataset::new("atmosphere 4d")
        .with_variable("hgt", var(10.0))
        .with_variable("U", var(2.0))
        .with_variable("V", var(-1.0))
}

/// Precipitation rate (m/s) and surface temperature anomalies, 5 degree global grid.
pub fn atmosphere_3d(window: TimeWindow) -> MemoryDataset {
    let times = window.forecast_months();
    let lats = axis(-80.0, 80.0, 5.0);
    let lons = axis(0.0, 355.0, 5.0);

    let var = |scale: f64| {
        let vals = values(times.len(), &[0.0], &lats, &lons, |t, _, lat, lon| {
            scale * anomaly(lat, lon, t)
        });
        GriddedVariable::new(times.clone(), lats.clone(), lons.clone(), vals).unwrap()
    };

    MemoryDataset::new("atmosphere 3d")
        .with_variable("PRECT", var(1.0e-8))
        .with_variable("ts", var(1.5))
}

/// An axis aligned box as a boundary, longitudes -180..180.
pub fn box_boundary(lon_min: f64, lon_max: f64, lat_min: f64, lat_max: f64) -> BoundaryPolygon {
    let ring = LineString::from(vec![
        (lon_min, lat_min),
        (lon_max, lat_min),
        (lon_max, lat_max),
        (lon_min, lat_max),
        (lon_min, lat_min),
    ]);
    BoundaryPolygon::from_polygons(vec![Polygon::new(ring, vec![])])
}

/// Two continents, one on each side of the date line.
pub fn land() -> BoundaryPolygon {
    let africa = box_boundary(-15.0, 40.0, -30.0, 30.0);
    let americas = box_boundary(-120.0, -70.0, -40.0, 50.0);
    BoundaryPolygon::from_polygons(africa.polygons().chain(americas.polygons()).cloned())
}

/// A rough box around mainland China.
pub fn china() -> BoundaryPolygon {
    box_boundary(75.0, 133.0, 20.0, 52.0)
}

/// A minimal SVG image of the given pixel size.
pub fn tiny_svg(width: u32, height: u32) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}"><rect x="0" y="0" width="{w}" height="{h}" fill="blue"/></svg>"#,
        w = width,
        h = height
    )
}
