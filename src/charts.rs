//! The report charts. Each function reads what it needs, draws one or more figures and returns
//! the paths written.
//!
//! The functions taking `&dyn Dataset` do the work and can be fed in-memory data. [`ChartSet`]
//! ties them to the files named in a [`ReportConfig`].

use crate::{
    config::ReportConfig,
    dataset::{open_dataset, Dataset},
    error::Result,
    field::Grid,
    fields::{equatorial_section, FieldExtractor},
    indexes::IndexExtractor,
    interpolation::{regrid_bilinear, TargetGrid},
    keys::{ClimateIndex, FieldVariable},
    mask::{BoundaryPolygon, Outline},
    render::{
        chart_path, draw_colorbar, draw_hovmoller, draw_index_panel, lat_label, lon_label,
        map_panel::MapExtent,
        skill_panel::{draw_lead_skill, draw_spb},
        style::{BLUE_WHITE_RED, BROWN_WHITE_GREEN, RAINBOW},
        draw_svg, Area, ColorScale, MapPanel, Orientation, Ticks, VectorLayer,
    },
    skill::{skill_by_lead, spb_matrix, Hindcast, ObservedSeries},
    time_window::{ForecastMonth, TimeWindow},
    utility::stepped_range,
};
use metfor::{HectoPascal, Quantity};
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use strum_macros::EnumIter;
use tracing::info;

/// Latitude band of the global maps.
const GLOBAL_LATS: (f64, f64) = (-70.0, 70.0);

const INDEX_SIZE: (u32, u32) = (640, 480);
const SECTION_SIZE: (u32, u32) = (500, 600);
const GLOBAL_SIZE: (u32, u32) = (900, 640);
const CHINA_SIZE: (u32, u32) = (900, 500);
const SKILL_SIZE: (u32, u32) = (640, 480);

/// Height of the strip under a multi-panel figure that holds the colorbar.
const COLORBAR_STRIP: i32 = 64;

const TIBET_GREY: RGBColor = RGBColor(128, 128, 128);

/// Groups of charts that are produced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ChartSet {
    /// nino34, nino3, nino4, nino12
    Nino,
    /// emi, wio, eio, dmi
    CpIod,
    /// ssta_evolution
    SstaEvolution,
    /// ssta_global
    SstaGlobal,
    /// hgtuv850_global, hgtuv500_global, hgtuv200_global
    HgtUv,
    /// precip_ocean, precip_land, temp_land
    PrecipTempLand,
    /// precip_china, temp_china
    PrecipTempChina,
}

impl ChartSet {
    /// Read the inputs named in `config` and draw this set for `anchor` into the picture
    /// directory.
    pub fn render(self, config: &ReportConfig, anchor: ForecastMonth) -> Result<Vec<PathBuf>> {
        let window = TimeWindow::new(anchor);
        let pic_dir = config.output.pic_dir.as_path();
        let model = config.model.name.as_str();
        let inputs = &config.inputs;
        let shapes = &config.shapes;

        info!(set = ?self, %anchor, "drawing charts");

        match self {
            ChartSet::Nino | ChartSet::CpIod => {
                let observed = open_dataset(&inputs.observed_sst)?;
                let mme = open_dataset(&inputs.ocean_mme)?;
                let members = inputs
                    .ensemble_members
                    .iter()
                    .map(|p| open_dataset(p))
                    .collect::<Result<Vec<_>>>()?;
                let member_refs: Vec<&dyn Dataset> = members.iter().map(|m| m.as_ref()).collect();

                let extractor =
                    IndexExtractor::load(window, observed.as_ref(), mme.as_ref(), &member_refs)?;
                let indices = if self == ChartSet::Nino {
                    ClimateIndex::NINO
                } else {
                    ClimateIndex::CP_IOD
                };
                index_charts(pic_dir, &extractor, &indices, model)
            }
            ChartSet::SstaEvolution => {
                let observed = open_dataset(&inputs.observed_sst)?;
                let mme = open_dataset(&inputs.ocean_mme)?;
                Ok(vec![ssta_evolution(
                    pic_dir,
                    window,
                    observed.as_ref(),
                    mme.as_ref(),
                    model,
                )?])
            }
            ChartSet::SstaGlobal => {
                let mme = open_dataset(&inputs.ocean_mme)?;
                let land = BoundaryPolygon::from_shapefile(&shapes.land)?;
                Ok(vec![ssta_global(pic_dir, window, mme.as_ref(), &land)?])
            }
            ChartSet::HgtUv => {
                let atm = open_dataset(&inputs.atmosphere_4d)?;
                let land = Outline::from_shapefile(&shapes.land)?;
                let tibet = Outline::from_shapefile(&shapes.tibet)?;
                hgt_uv(pic_dir, window, atm.as_ref(), &land, &tibet)
            }
            ChartSet::PrecipTempLand => {
                let atm = open_dataset(&inputs.atmosphere_3d)?;
                let land = BoundaryPolygon::from_shapefile(&shapes.land)?;
                precip_temp_land(pic_dir, window, atm.as_ref(), &land)
            }
            ChartSet::PrecipTempChina => {
                let atm = open_dataset(&inputs.atmosphere_3d)?;
                let china = ChinaShapes {
                    boundary: BoundaryPolygon::from_shapefile(&shapes.china)?,
                    outline: Outline::from_shapefile(&shapes.china_outline)?,
                    coast: Outline::from_shapefile(&shapes.land)?,
                };
                precip_temp_china(pic_dir, window, atm.as_ref(), &china)
            }
        }
    }
}

/// Draw every chart of the realtime report.
pub fn all(config: &ReportConfig, anchor: ForecastMonth) -> Result<Vec<PathBuf>> {
    use strum::IntoEnumIterator;

    let mut written = vec![];
    for set in ChartSet::iter() {
        written.extend(set.render(config, anchor)?);
    }
    Ok(written)
}

/// One line chart per index.
pub fn index_charts(
    pic_dir: &Path,
    extractor: &IndexExtractor,
    indices: &[ClimateIndex],
    model: &str,
) -> Result<Vec<PathBuf>> {
    let anchor = extractor.window().anchor();

    indices
        .iter()
        .map(|&index| {
            let series = extractor.extract(index)?;
            let path = chart_path(pic_dir, index.plot_name(), anchor);
            draw_svg(&path, INDEX_SIZE, |root| draw_index_panel(root, &series, model))?;
            Ok(path)
        })
        .collect()
}

/// The equatorial Pacific longitude-time section.
pub fn ssta_evolution(
    pic_dir: &Path,
    window: TimeWindow,
    observed: &dyn Dataset,
    mme: &dyn Dataset,
    model: &str,
) -> Result<PathBuf> {
    let section = equatorial_section(window, observed, mme)?;
    let path = chart_path(pic_dir, "ssta_evolution", window.anchor());
    draw_svg(&path, SECTION_SIZE, |root| {
        draw_hovmoller(root, &section, window.anchor(), model)
    })?;
    Ok(path)
}

/// Seasonal sea surface temperature anomaly forecast with land blanked.
pub fn ssta_global(
    pic_dir: &Path,
    window: TimeWindow,
    mme: &dyn Dataset,
    land: &BoundaryPolygon,
) -> Result<PathBuf> {
    let extractor = FieldExtractor::load(
        window,
        mme,
        FieldVariable::OceanTemperature,
        Some(crate::indexes::MODEL_SURFACE_LEVEL),
        Some(GLOBAL_LATS),
    )?;
    let seasons = extractor.seasonal_composites()?;
    let scale = ColorScale::symmetric(3.6, 0.2, RAINBOW)?.with_tick_step(0.6);

    let path = chart_path(pic_dir, "ssta_global", window.anchor());
    draw_svg(&path, GLOBAL_SIZE, |root| {
        four_panels(root, &scale, FieldVariable::OceanTemperature.display_units(), |k, area| {
            let season = &seasons[k];
            MapPanel::new(
                format!("SSTA {} forecast", season.label()),
                MapExtent::PACIFIC_CENTERED,
                &scale,
            )
            .with_field(&season.grid)
            .with_land_fill(land)
            .with_ticks(global_lon_ticks(), global_lat_ticks())
            .draw(area)
        })
    })?;
    Ok(path)
}

/// Geopotential height and wind at one pressure level: color levels, arrow scale (m/s per map
/// width) and key arrow speed.
struct HgtUvStyle {
    level: HectoPascal,
    limit: f64,
    step: f64,
    tick: f64,
    arrow_scale: f64,
    reference: f64,
}

const HGT_UV_LEVELS: [HgtUvStyle; 3] = [
    HgtUvStyle {
        level: HectoPascal(850.0),
        limit: 30.0,
        step: 3.0,
        tick: 6.0,
        arrow_scale: 25.0,
        reference: 1.0,
    },
    HgtUvStyle {
        level: HectoPascal(500.0),
        limit: 30.0,
        step: 3.0,
        tick: 6.0,
        arrow_scale: 45.0,
        reference: 2.0,
    },
    HgtUvStyle {
        level: HectoPascal(200.0),
        limit: 40.0,
        step: 4.0,
        tick: 8.0,
        arrow_scale: 65.0,
        reference: 3.0,
    },
];

/// Seasonal height and wind anomalies at 850, 500 and 200 hPa.
pub fn hgt_uv(
    pic_dir: &Path,
    window: TimeWindow,
    atm: &dyn Dataset,
    land: &Outline,
    tibet: &Outline,
) -> Result<Vec<PathBuf>> {
    HGT_UV_LEVELS
        .iter()
        .map(|style| {
            let level = style.level.unpack();
            let load = |var| FieldExtractor::load(window, atm, var, Some(level), Some(GLOBAL_LATS));

            let hgt = load(FieldVariable::Height)?.seasonal_composites()?;
            let u = load(FieldVariable::UWind)?.seasonal_composites()?;
            let v = load(FieldVariable::VWind)?.seasonal_composites()?;

            let last = hgt.len().saturating_sub(1);
            let vectors = u
                .iter()
                .zip(&v)
                .enumerate()
                .map(|(k, (u, v))| {
                    let layer = VectorLayer::new(u.grid.clone(), v.grid.clone())?
                        .with_scale(style.arrow_scale);
                    // Only the last panel carries the key arrow
                    Ok(if k == last {
                        layer.with_reference(style.reference)
                    } else {
                        layer
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let scale = ColorScale::symmetric(style.limit, style.step, BLUE_WHITE_RED)?
                .with_tick_step(style.tick);

            let plot_name = format!("hgtuv{:.0}_global", level);
            let path = chart_path(pic_dir, &plot_name, window.anchor());
            draw_svg(&path, GLOBAL_SIZE, |root| {
                four_panels(root, &scale, FieldVariable::Height.display_units(), |k, area| {
                    MapPanel::new(
                        format!("HGT&UV{:.0} {} forecast", level, hgt[k].label()),
                        MapExtent::PACIFIC_CENTERED,
                        &scale,
                    )
                    .with_field(&hgt[k].grid)
                    .with_outline(land, BLACK)
                    .with_outline(tibet, TIBET_GREY)
                    .with_vectors(&vectors[k])
                    .with_ticks(global_lon_ticks(), global_lat_ticks())
                    .draw(area)
                })
            })?;
            Ok(path)
        })
        .collect()
}

/// Seasonal precipitation over the ocean, and precipitation and surface temperature over land.
pub fn precip_temp_land(
    pic_dir: &Path,
    window: TimeWindow,
    atm: &dyn Dataset,
    land: &BoundaryPolygon,
) -> Result<Vec<PathBuf>> {
    let precip = FieldExtractor::load(
        window,
        atm,
        FieldVariable::Precipitation,
        None,
        Some(GLOBAL_LATS),
    )?
    .seasonal_composites()?;
    let temp = FieldExtractor::load(
        window,
        atm,
        FieldVariable::SurfaceTemperature,
        None,
        Some(GLOBAL_LATS),
    )?
    .seasonal_composites()?;
    let coast = Outline::from_boundary(land);

    let mut written = vec![];

    let ocean_scale = ColorScale::symmetric(2.0, 0.2, BROWN_WHITE_GREEN)?.with_tick_step(0.4);
    let path = chart_path(pic_dir, "precip_ocean", window.anchor());
    draw_svg(&path, GLOBAL_SIZE, |root| {
        four_panels(root, &ocean_scale, FieldVariable::Precipitation.display_units(), |k, area| {
            MapPanel::new(
                format!("Precip. {} forecast", precip[k].label()),
                MapExtent::PACIFIC_CENTERED,
                &ocean_scale,
            )
            .with_field(&precip[k].grid)
            .with_land_fill(land)
            .with_ticks(global_lon_ticks(), global_lat_ticks())
            .draw(area)
        })
    })?;
    written.push(path);

    let land_maps = [
        (
            "precip_land",
            "Precip.",
            &precip,
            ColorScale::symmetric(1.0, 0.1, BROWN_WHITE_GREEN)?.with_tick_step(0.2),
            FieldVariable::Precipitation,
        ),
        (
            "temp_land",
            "Temp.",
            &temp,
            ColorScale::symmetric(2.0, 0.2, BLUE_WHITE_RED)?.with_tick_step(0.4),
            FieldVariable::SurfaceTemperature,
        ),
    ];

    for (plot_name, label, seasons, scale, variable) in land_maps.iter() {
        let masked: Vec<Grid> = seasons.iter().map(|s| land.mask_outside(&s.grid)).collect();

        let path = chart_path(pic_dir, plot_name, window.anchor());
        draw_svg(&path, GLOBAL_SIZE, |root| {
            four_panels(root, scale, variable.display_units(), |k, area| {
                MapPanel::new(
                    format!("{} {} forecast", label, seasons[k].label()),
                    MapExtent::GREENWICH_CENTERED,
                    scale,
                )
                .with_field(&masked[k])
                .with_outline(&coast, BLACK)
                .with_ticks(global_lon_ticks(), global_lat_ticks())
                .draw(area)
            })
        })?;
        written.push(path);
    }

    Ok(written)
}

/// Shapes drawn on the China maps.
#[derive(Debug, Clone)]
pub struct ChinaShapes {
    /// Boundary the fields are masked to.
    pub boundary: BoundaryPolygon,
    /// Province and border outline.
    pub outline: Outline,
    /// Coastlines.
    pub coast: Outline,
}

/// Precipitation and surface temperature over China for the first three forecast months, each
/// with a South China Sea inset.
pub fn precip_temp_china(
    pic_dir: &Path,
    window: TimeWindow,
    atm: &dyn Dataset,
    shapes: &ChinaShapes,
) -> Result<Vec<PathBuf>> {
    let maps = [
        (
            "precip_china",
            "Precip.",
            FieldVariable::Precipitation,
            ColorScale::symmetric(1.0, 0.1, BROWN_WHITE_GREEN)?.with_tick_step(0.2),
        ),
        (
            "temp_china",
            "Temp.",
            FieldVariable::SurfaceTemperature,
            ColorScale::symmetric(4.0, 0.4, BLUE_WHITE_RED)?.with_tick_step(0.8),
        ),
    ];

    let mut written = vec![];
    for (plot_name, label, variable, scale) in maps.iter() {
        let months = FieldExtractor::load(window, atm, *variable, None, None)?.monthly_snapshots(3)?;

        let mut panels = Vec::with_capacity(months.len());
        for (month, grid) in &months {
            let main = shapes
                .boundary
                .mask_outside(&regrid_bilinear(grid, &TargetGrid::CHINA)?);
            let inset = shapes
                .boundary
                .mask_outside(&regrid_bilinear(grid, &TargetGrid::SOUTH_CHINA_SEA)?);
            panels.push((*month, main, inset));
        }

        let path = chart_path(pic_dir, plot_name, window.anchor());
        draw_svg(&path, CHINA_SIZE, |root| {
            let (width, height) = root.dim_in_pixel();
            let (width, height) = (width as i32, height as i32);
            let (maps_area, bar_area) = root.split_vertically((height - COLORBAR_STRIP).max(0));

            for ((month, main, inset), area) in panels.iter().zip(maps_area.split_evenly((1, 3))) {
                MapPanel::new(
                    format!("{} {} forecast", label, month.label()),
                    MapExtent::CHINA,
                    scale,
                )
                .with_field(main)
                .with_outline(&shapes.coast, BLACK)
                .with_outline(&shapes.outline, BLACK)
                .with_ticks(china_lon_ticks(), china_lat_ticks())
                .draw(&area)?;

                // Inset in the lower right corner of the map frame
                let (w, h) = area.dim_in_pixel();
                let (w, h) = (w as i32, h as i32);
                let (iw, ih) = (w * 22 / 100, h * 30 / 100);
                let inset_area = area.shrink(((w - iw - 13).max(0), (h - ih - 25).max(0)), (iw, ih));
                inset_area.fill(&WHITE)?;
                MapPanel::new("", MapExtent::SOUTH_CHINA_SEA, scale)
                    .with_field(inset)
                    .with_outline(&shapes.coast, BLACK)
                    .with_outline(&shapes.outline, BLACK)
                    .draw(&inset_area)?;
            }

            let bar_area = bar_area.margin(0, 0, width / 6, width / 6);
            draw_colorbar(
                &bar_area,
                scale,
                Orientation::Horizontal,
                Some(variable.display_units()),
            )
        })?;
        written.push(path);
    }

    Ok(written)
}

/// ACC and RMSE by lead and the spring predictability barrier of the Niño3.4 hindcasts, written
/// to the skill result directory.
pub fn skill_charts(config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let hindcast = Hindcast::from_csv(&config.skill.hindcast)?;
    let observed = ObservedSeries::from_csv(&config.skill.observed)?;
    skill_charts_from(&config.skill.result_dir, &hindcast, &observed)
}

/// Skill charts from tables already in memory.
pub fn skill_charts_from(
    result_dir: &Path,
    hindcast: &Hindcast,
    observed: &ObservedSeries,
) -> Result<Vec<PathBuf>> {
    let by_lead = skill_by_lead(hindcast, observed);
    let spb = spb_matrix(hindcast, observed);

    let acc_rmse = result_dir.join("f4_ACC_RMSE_nino34.svg");
    draw_svg(&acc_rmse, SKILL_SIZE, |root| {
        draw_lead_skill(root, &by_lead, "ACC & RMSE of Niño3.4 index")
    })?;

    let barrier = result_dir.join("f10_Nino34_SPB.svg");
    draw_svg(&barrier, SKILL_SIZE, |root| {
        draw_spb(root, &spb, "SPB of Niño3.4 index")
    })?;

    Ok(vec![acc_rmse, barrier])
}

// 2 x 2 panels above a horizontal colorbar.
fn four_panels<F>(root: &Area, scale: &ColorScale, units: &str, draw_panel: F) -> Result<()>
where
    F: Fn(usize, &Area) -> Result<()>,
{
    let (width, height) = root.dim_in_pixel();
    let (width, height) = (width as i32, height as i32);
    let (maps_area, bar_area) = root.split_vertically((height - COLORBAR_STRIP).max(0));

    for (k, area) in maps_area.split_evenly((2, 2)).iter().enumerate() {
        draw_panel(k, area)?;
    }

    let bar_area = bar_area.margin(0, 0, width * 15 / 100, width * 15 / 100);
    draw_colorbar(&bar_area, scale, Orientation::Horizontal, Some(units))
}

fn global_lon_ticks() -> Ticks {
    Ticks::at(&stepped_range(-180.0, 420.0, 60.0), lon_label)
        .with_minor(stepped_range(-180.0, 420.0, 20.0))
}

fn global_lat_ticks() -> Ticks {
    Ticks::at(&stepped_range(-60.0, 60.0, 30.0), lat_label)
        .with_minor(stepped_range(-60.0, 60.0, 15.0))
}

fn china_lon_ticks() -> Ticks {
    Ticks::at(&stepped_range(70.0, 140.0, 15.0), lon_label)
}

fn china_lat_ticks() -> Ticks {
    Ticks::at(&stepped_range(10.0, 60.0, 10.0), lat_label)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hgt_uv_styles() {
        let names: Vec<String> = HGT_UV_LEVELS
            .iter()
            .map(|s| format!("hgtuv{:.0}_global", s.level.unpack()))
            .collect();
        assert_eq!(names, vec!["hgtuv850_global", "hgtuv500_global", "hgtuv200_global"]);

        for style in &HGT_UV_LEVELS {
            let scale = ColorScale::symmetric(style.limit, style.step, BLUE_WHITE_RED).unwrap();
            assert_eq!(scale.levels().len(), 21);
            assert!(style.reference < style.arrow_scale);
        }
    }

    #[test]
    fn test_global_ticks() {
        let ticks = global_lon_ticks();
        let labels: Vec<&str> = ticks.major.iter().map(|(_, l)| l.as_str()).collect();
        assert!(labels.contains(&"120°E"));
        assert!(labels.contains(&"180°"));
        assert!(labels.contains(&"60°W"));
        assert_eq!(global_lat_ticks().major.len(), 5);
    }

    #[test]
    fn test_chart_sets_cover_every_index() {
        use strum::IntoEnumIterator;

        assert_eq!(ChartSet::iter().count(), 7);
        let charted: Vec<ClimateIndex> = ClimateIndex::NINO
            .iter()
            .chain(ClimateIndex::CP_IOD.iter())
            .copied()
            .collect();
        for idx in ClimateIndex::iter() {
            assert!(charted.contains(&idx));
        }
    }
}
