mod utils;

use enso_report::{
    charts::{self, ChartSet, ChinaShapes},
    mask::Outline,
    render::chart_path,
    skill::{Hindcast, ObservedSeries},
    ClimateIndex, ForecastMonth, IndexExtractor, ReportConfig, ReportError,
};
use optional::some;
use std::{fs, path::Path};

fn assert_svg(path: &Path, needle: &str) {
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.starts_with("<svg"), "{} is not an SVG", path.display());
    assert!(
        contents.contains(needle),
        "{} does not contain {}",
        path.display(),
        needle
    );
}

#[test]
fn test_index_charts() {
    let dir = tempfile::tempdir().unwrap();
    let window = utils::window();
    let observed = utils::observed_dataset(window);
    let mme = utils::ocean_dataset(window, 0.0);
    let member = utils::ocean_dataset(window, 0.3);
    let ext = IndexExtractor::load(window, &observed, &mme, &[&member]).unwrap();

    let written = charts::index_charts(dir.path(), &ext, &ClimateIndex::NINO, "FGOALS-g3").unwrap();
    assert_eq!(written.len(), 4);
    assert_eq!(written[0], dir.path().join("nino34_2024_03.svg"));
    for path in &written {
        assert_svg(path, "FGOALS-g3");
    }

    let written =
        charts::index_charts(dir.path(), &ext, &ClimateIndex::CP_IOD, "FGOALS-g3").unwrap();
    let names: Vec<_> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    for name in ["emi_2024_03.svg", "wio_2024_03.svg", "eio_2024_03.svg", "dmi_2024_03.svg"] {
        assert!(names.iter().any(|n| n == name), "missing {}", name);
    }
}

#[test]
fn test_ssta_charts() {
    let dir = tempfile::tempdir().unwrap();
    let window = utils::window();
    let observed = utils::observed_dataset(window);
    let mme = utils::ocean_dataset(window, 0.0);

    let section = charts::ssta_evolution(dir.path(), window, &observed, &mme, "FGOALS-g3").unwrap();
    assert_svg(&section, "OBS");

    let global = charts::ssta_global(dir.path(), window, &mme, &utils::land()).unwrap();
    assert_eq!(global, chart_path(dir.path(), "ssta_global", utils::anchor()));
    assert_svg(&global, "202403-202405");
}

#[test]
fn test_atmosphere_charts() {
    let dir = tempfile::tempdir().unwrap();
    let window = utils::window();
    let land = utils::land();
    let coast = Outline::from_boundary(&land);
    let tibet = Outline::from_boundary(&utils::box_boundary(78.0, 103.0, 27.0, 38.0));

    let hgt = charts::hgt_uv(
        dir.path(),
        window,
        &utils::atmosphere_4d(window),
        &coast,
        &tibet,
    )
    .unwrap();
    assert_eq!(hgt.len(), 3);
    assert!(hgt[1].ends_with("hgtuv500_global_2024_03.svg"));

    let atm = utils::atmosphere_3d(window);
    let land_maps = charts::precip_temp_land(dir.path(), window, &atm, &land).unwrap();
    assert_eq!(land_maps.len(), 3);
    for path in &land_maps {
        assert_svg(path, "202412-202502");
    }

    let china = utils::china();
    let shapes = ChinaShapes {
        outline: Outline::from_boundary(&china),
        boundary: china,
        coast,
    };
    let china_maps = charts::precip_temp_china(dir.path(), window, &atm, &shapes).unwrap();
    assert_eq!(china_maps.len(), 2);
    assert!(china_maps[0].ends_with("precip_china_2024_03.svg"));
    assert_svg(&china_maps[1], "202405");
}

#[test]
fn test_skill_charts() {
    let dir = tempfile::tempdir().unwrap();
    let first = ForecastMonth::new(1990, 1).unwrap();

    let truth = |m: ForecastMonth| (m.months_until(first) as f64 * 0.7).sin();
    let observed = ObservedSeries::new((0..400).map(|i| {
        let m = first.offset(i);
        (m, truth(m))
    }));

    let starts: Vec<ForecastMonth> = (0..360).map(|i| first.offset(i)).collect();
    let values = starts
        .iter()
        .map(|&s| {
            (0..12)
                .map(|lead| some(truth(s.offset(lead)) + 0.05 * lead as f64))
                .collect()
        })
        .collect();
    let hindcast = Hindcast::new(starts, values).unwrap();

    let written = charts::skill_charts_from(dir.path(), &hindcast, &observed).unwrap();
    assert_eq!(written.len(), 2);
    assert_svg(&written[0], "RMSE");
    assert_svg(&written[1], "Jan");
}

#[test]
fn test_missing_inputs_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ReportConfig::default();
    config.inputs.observed_sst = dir.path().join("absent.nc");
    config.output.pic_dir = dir.path().to_path_buf();

    match ChartSet::Nino.render(&config, utils::anchor()) {
        Err(ReportError::MissingFile(path)) => assert!(path.ends_with("absent.nc")),
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}
