mod utils;

use enso_report::{
    fields::{equatorial_section, EquatorialSection, FieldExtractor, MONTHS_PER_SEASON},
    indexes::MODEL_SURFACE_LEVEL,
    interpolation::{add_cyclic_point, regrid_bilinear, TargetGrid},
    region::lon_0_360,
    FieldVariable, Grid, ReportError,
};
use optional::some;

fn surface_extractor() -> FieldExtractor {
    let window = utils::window();
    let mme = utils::ocean_dataset(window, 0.0);
    FieldExtractor::load(
        window,
        &mme,
        FieldVariable::OceanTemperature,
        Some(MODEL_SURFACE_LEVEL),
        None,
    )
    .unwrap()
}

#[test]
fn test_seasonal_composites_partition_horizon() {
    let ext = surface_extractor();
    let seasons = ext.seasonal_composites().unwrap();
    assert_eq!(seasons.len(), 4);

    let covered: Vec<_> = seasons.iter().flat_map(|s| s.months.to_vec()).collect();
    assert_eq!(covered, utils::window().forecast_months());
    assert_eq!(seasons[0].label(), "202403-202405");
    assert_eq!(seasons[3].label(), "202412-202502");

    let snapshots = ext.monthly_snapshots(12).unwrap();
    for (k, season) in seasons.iter().enumerate() {
        let members = &snapshots[k * MONTHS_PER_SEASON..(k + 1) * MONTHS_PER_SEASON];
        for (idx, value) in season.grid.values().iter().enumerate() {
            let expected = members
                .iter()
                .map(|(_, g)| g.values()[idx].unwrap())
                .sum::<f64>()
                / MONTHS_PER_SEASON as f64;
            assert!((value.unwrap() - expected).abs() < 1.0e-9);
        }
    }
}

#[test]
fn test_snapshots_limited_to_horizon() {
    let ext = surface_extractor();
    assert_eq!(ext.monthly_snapshots(3).unwrap().len(), 3);
    assert!(matches!(
        ext.monthly_snapshots(13),
        Err(ReportError::InvalidInput(_))
    ));
}

#[test]
fn test_precipitation_in_display_units() {
    let window = utils::window();
    let atm = utils::atmosphere_3d(window);
    let ext =
        FieldExtractor::load(window, &atm, FieldVariable::Precipitation, None, None).unwrap();

    let (month, grid) = &ext.monthly_snapshots(1).unwrap()[0];
    assert_eq!(*month, utils::anchor());
    let (lat, lon) = (grid.lats()[16], grid.lons()[10]);
    let stored = 1.0e-8 * utils::anomaly(lat, lon, 0);
    let shown = grid.get(16, 10).unwrap();
    assert!((shown - stored * 8.64e7).abs() < 1.0e-9);
}

#[test]
fn test_equatorial_section_rows() {
    let window = utils::window();
    let observed = utils::observed_dataset(window);
    let mme = utils::ocean_dataset(window, 0.0);

    let section = equatorial_section(window, &observed, &mme).unwrap();
    assert_eq!(section.rows.len(), 18);
    assert_eq!(section.months.len(), 18);
    assert_eq!(section.months[EquatorialSection::OBSERVED_ROWS], utils::anchor());
    assert_eq!(section.lons.first().copied(), Some(120.0));
    assert_eq!(section.lons.last().copied(), Some(280.0));
    assert!(section
        .rows
        .iter()
        .all(|row| row.len() == section.lons.len() && row.iter().all(|v| v.is_some())));
}

#[test]
fn test_mask_keeps_inside_blanks_outside() {
    let lats = utils::axis(-40.0, 40.0, 2.0);
    let lons = utils::axis(0.0, 358.0, 2.0);
    let grid = Grid::from_fn(lats, lons, |lat, lon| some(utils::anomaly(lat, lon, 0)));

    let land = utils::land();
    let masked = land.mask_outside(&grid);

    let (n_lat, n_lon) = masked.shape();
    let mut inside = 0;
    for i in 0..n_lat {
        for j in 0..n_lon {
            let (lat, lon) = (masked.lats()[i], masked.lons()[j]);
            assert!((-180.0..180.0).contains(&lon));
            let val = masked.get(i, j);
            if land.contains(lon, lat) {
                inside += 1;
                let expected = utils::anomaly(lat, lon_0_360(lon), 0);
                assert!((val.unwrap() - expected).abs() < 1.0e-9);
            } else {
                assert!(val.is_none());
            }
        }
    }
    assert!(inside > 0);
    assert_eq!(masked.count_present(), inside);
}

#[test]
fn test_regrid_reproduces_linear_field() {
    let lats = utils::axis(2.0, 22.0, 2.0);
    let lons = utils::axis(106.0, 122.0, 2.0);
    let plane = |lat: f64, lon: f64| 0.5 * lat - 0.25 * lon + 3.0;
    let grid = Grid::from_fn(lats, lons, |lat, lon| some(plane(lat, lon)));

    // The target extends past the source on every side
    let target = TargetGrid::SOUTH_CHINA_SEA;
    let fine = regrid_bilinear(&grid, &target).unwrap();
    assert_eq!(fine.lats().len(), target.lats().len());
    assert_eq!(fine.lons().len(), target.lons().len());

    for (i, &lat) in fine.lats().iter().enumerate() {
        for (j, &lon) in fine.lons().iter().enumerate() {
            assert!((fine.get(i, j).unwrap() - plane(lat, lon)).abs() < 1.0e-9);
        }
    }
}

#[test]
fn test_cyclic_point_closes_globe() {
    let lons = utils::axis(0.0, 355.0, 5.0);
    let grid = Grid::from_fn(vec![0.0, 5.0], lons, |lat, lon| some(lat + lon));
    let closed = add_cyclic_point(&grid);

    assert_eq!(closed.lons().len(), 73);
    assert_eq!(closed.lons()[72], 360.0);
    assert_eq!(closed.get(1, 72), closed.get(1, 0));
}
