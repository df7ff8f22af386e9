//! Drawing on the SVG backend: shared axes, ticks and text helpers, plus the panels the report
//! charts are composed of.

use crate::{
    error::Result,
    region::lon_180,
    time_window::ForecastMonth,
};
use optional::Optioned;
use plotters::{
    coord::{types::RangedCoordf64, Shift},
    prelude::*,
    style::{
        text_anchor::{HPos, Pos, VPos},
        FontStyle,
    },
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub mod colorbar;
pub mod contour;
pub mod hovmoller;
pub mod line_panel;
pub mod map_panel;
pub mod skill_panel;
pub mod style;

pub use colorbar::{draw_colorbar, Orientation};
pub use contour::contour_segments;
pub use hovmoller::draw_hovmoller;
pub use line_panel::draw_index_panel;
pub use map_panel::{MapPanel, VectorLayer};
pub use style::ColorScale;

/// A drawing area on the SVG backend.
pub type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// A chart with floating point axes on the SVG backend.
pub type Chart<'a, 'b> =
    ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Font family for every label.
pub const FONT: &str = "sans-serif";

/// `<plot>_<YYYY>_<MM>.svg` in `dir`.
pub fn chart_path(dir: &Path, plot_name: &str, month: ForecastMonth) -> PathBuf {
    dir.join(format!("{}_{}.svg", plot_name, month.file_tag()))
}

/// Create an SVG file of the given size, fill it white, and hand the root area to `draw`.
///
/// The parent directory is created when needed. The file is only complete once `draw` returns
/// successfully.
pub fn draw_svg<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&Area) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;

    info!(path = %path.display(), "wrote chart");
    Ok(())
}

/// Major ticks with labels and unlabelled minor ticks along one axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticks {
    /// Position and label of each major tick.
    pub major: Vec<(f64, String)>,
    /// Positions of the minor ticks.
    pub minor: Vec<f64>,
}

impl Ticks {
    /// Major ticks at the given positions, labelled by `fmt`.
    pub fn at<F>(positions: &[f64], fmt: F) -> Self
    where
        F: Fn(f64) -> String,
    {
        Ticks {
            major: positions.iter().map(|&p| (p, fmt(p))).collect(),
            minor: vec![],
        }
    }

    /// Add minor ticks.
    pub fn with_minor(mut self, positions: Vec<f64>) -> Self {
        self.minor = positions;
        self
    }
}

/// Label a longitude the way maps do: `120°E`, `180°`, `60°W`, `0°`.
pub fn lon_label(lon: f64) -> String {
    let lon = lon_180(lon);
    let deg = lon.abs().round();
    if deg == 0.0 || deg == 180.0 {
        format!("{}°", deg)
    } else if lon > 0.0 {
        format!("{}°E", deg)
    } else {
        format!("{}°W", deg)
    }
}

/// Label a latitude: `30°N`, `0°`, `15°S`.
pub fn lat_label(lat: f64) -> String {
    let deg = lat.abs().round();
    if deg == 0.0 {
        "0°".to_owned()
    } else if lat > 0.0 {
        format!("{}°N", deg)
    } else {
        format!("{}°S", deg)
    }
}

/// Translate an absolute backend coordinate into one relative to `area`.
pub(crate) fn local(area: &Area, abs: (i32, i32)) -> (i32, i32) {
    let (x0, y0) = area.get_base_pixel();
    (abs.0 - x0, abs.1 - y0)
}

/// Draw text anchored at a point of `area`.
pub(crate) fn draw_label(
    area: &Area,
    text: &str,
    pos: (i32, i32),
    size: u32,
    anchor: (HPos, VPos),
) -> Result<()> {
    let style = TextStyle::from((FONT, size).into_font())
        .color(&BLACK)
        .pos(Pos::new(anchor.0, anchor.1));
    area.draw(&Text::new(text.to_owned(), pos, style))?;
    Ok(())
}

/// Titles above a panel: one flush left and an optional one flush right, both bold.
pub(crate) fn draw_titles(area: &Area, left: &str, right: Option<&str>, size: u32) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let font = (FONT, size).into_font().style(FontStyle::Bold);

    let left_style = TextStyle::from(font.clone())
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Top));
    area.draw(&Text::new(left.to_owned(), (4, 4), left_style))?;

    if let Some(right) = right {
        let right_style = TextStyle::from(font)
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Top));
        area.draw(&Text::new(right.to_owned(), (width as i32 - 4, 4), right_style))?;
    }

    Ok(())
}

/// Draw the frame of a chart with outward ticks on the bottom and left edges.
pub(crate) fn draw_frame(
    area: &Area,
    chart: &Chart,
    x_ticks: &Ticks,
    y_ticks: &Ticks,
    label_size: u32,
) -> Result<()> {
    const MAJOR: i32 = 5;
    const MINOR: i32 = 3;

    let xr = chart.x_range();
    let yr = chart.y_range();
    let at = |x: f64, y: f64| local(area, chart.backend_coord(&(x, y)));

    let corners = vec![
        at(xr.start, yr.start),
        at(xr.end, yr.start),
        at(xr.end, yr.end),
        at(xr.start, yr.end),
        at(xr.start, yr.start),
    ];
    area.draw(&PathElement::new(corners, BLACK.stroke_width(1)))?;

    let in_x = |x: f64| x >= xr.start.min(xr.end) - 1.0e-9 && x <= xr.start.max(xr.end) + 1.0e-9;
    let in_y = |y: f64| y >= yr.start.min(yr.end) - 1.0e-9 && y <= yr.start.max(yr.end) + 1.0e-9;

    for &x in x_ticks.minor.iter().filter(|&&x| in_x(x)) {
        let (px, py) = at(x, yr.start);
        area.draw(&PathElement::new(vec![(px, py), (px, py + MINOR)], BLACK))?;
    }
    for (x, label) in x_ticks.major.iter().filter(|(x, _)| in_x(*x)) {
        let (px, py) = at(*x, yr.start);
        area.draw(&PathElement::new(vec![(px, py), (px, py + MAJOR)], BLACK))?;
        draw_label(area, label, (px, py + MAJOR + 2), label_size, (HPos::Center, VPos::Top))?;
    }

    for &y in y_ticks.minor.iter().filter(|&&y| in_y(y)) {
        let (px, py) = at(xr.start, y);
        area.draw(&PathElement::new(vec![(px, py), (px - MINOR, py)], BLACK))?;
    }
    for (y, label) in y_ticks.major.iter().filter(|(y, _)| in_y(*y)) {
        let (px, py) = at(xr.start, *y);
        area.draw(&PathElement::new(vec![(px, py), (px - MAJOR, py)], BLACK))?;
        draw_label(area, label, (px - MAJOR - 3, py), label_size, (HPos::Right, VPos::Center))?;
    }

    Ok(())
}

/// Split a series into runs of consecutive present values, so gaps break the line.
pub fn present_runs(points: &[(f64, Optioned<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = vec![];
    let mut current = vec![];

    for &(x, y) in points {
        match y.into_option() {
            Some(y) => current.push((x, y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Break the straight line from `from` to `to` into `n` dashes.
pub fn dashes(from: (f64, f64), to: (f64, f64), n: usize) -> Vec<[(f64, f64); 2]> {
    let n = n.max(1);
    // Each dash is followed by an equal gap, except the last
    let pieces = 2 * n - 1;
    let lerp = |k: usize| {
        let t = k as f64 / pieces as f64;
        (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
    };

    (0..n).map(|i| [lerp(2 * i), lerp(2 * i + 1)]).collect()
}
