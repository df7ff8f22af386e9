//! The index time series panel: observed history, ensemble members and the ensemble mean.

use super::{dashes, draw_frame, draw_titles, present_runs, Area, Ticks, FONT};
use crate::{
    error::Result,
    indexes::{chart_positions, IndexSeries},
    keys::LegendCorner,
    time_window::TimeWindow,
    utility::stepped_range,
};
use plotters::{chart::SeriesLabelPosition, prelude::*};

const X_RANGE: (f64, f64) = (0.0, 21.0);
const Y_RANGE: (f64, f64) = (-3.5, 3.5);

const MEMBER_GREY: RGBColor = RGBColor(128, 128, 128);

/// Draw one index chart filling `area`.
pub fn draw_index_panel(area: &Area, series: &IndexSeries, model: &str) -> Result<()> {
    let window = series.window();
    draw_titles(
        area,
        series.index().title(),
        Some(&format!("Pred. from {}", window.anchor())),
        16,
    )?;

    let mut chart = ChartBuilder::on(area)
        .margin_top(34)
        .margin_right(16)
        .margin_left(8)
        .margin_bottom(8)
        .x_label_area_size(36)
        .y_label_area_size(44)
        .build_cartesian_2d(X_RANGE.0..X_RANGE.1, Y_RANGE.0..Y_RANGE.1)?;

    let labels = window.axis_labels();
    let x_ticks = Ticks {
        major: (0..TimeWindow::AXIS_SPAN)
            .step_by(3)
            .map(|i| ((i + 1) as f64, labels[i].clone()))
            .collect(),
        minor: (1..=TimeWindow::AXIS_SPAN).map(|i| i as f64).collect(),
    };
    let y_ticks = Ticks::at(&stepped_range(-3.0, 3.0, 1.0), |v| format!("{:.0}", v))
        .with_minor(stepped_range(-3.5, 3.5, 0.5));

    // Zero line
    chart.draw_series(
        dashes((X_RANGE.0, 0.0), (X_RANGE.1, 0.0), 42)
            .into_iter()
            .map(|seg| PathElement::new(seg.to_vec(), BLACK.stroke_width(1))),
    )?;

    let (obs, mme) = chart_positions(series);
    let first_fcst = (TimeWindow::LOOK_BACK + 1) as f64;

    for member in series.members() {
        let pts: Vec<_> = member
            .iter()
            .enumerate()
            .map(|(i, &v)| (first_fcst + i as f64, v))
            .collect();
        for run in present_runs(&pts) {
            chart.draw_series(LineSeries::new(run, MEMBER_GREY.stroke_width(1)))?;
        }
    }

    // Bridge from the last observation to the first forecast
    if let (Some(&(x0, y0)), Some(&(x1, y1))) = (obs.last(), mme.first()) {
        if let (Some(y0), Some(y1)) = (y0.into_option(), y1.into_option()) {
            chart.draw_series(
                dashes((x0, y0), (x1, y1), 3)
                    .into_iter()
                    .map(|seg| PathElement::new(seg.to_vec(), BLACK.stroke_width(2))),
            )?;
        }
    }

    for run in present_runs(&obs) {
        chart.draw_series(LineSeries::new(run, BLACK.stroke_width(2)))?;
    }

    for run in present_runs(&mme) {
        chart.draw_series(LineSeries::new(run.clone(), RED.stroke_width(3)))?;
        chart.draw_series(run.iter().map(|&pt| Circle::new(pt, 4, WHITE.filled())))?;
        chart.draw_series(run.iter().map(|&pt| Circle::new(pt, 4, RED.stroke_width(2))))?;
    }

    // Legend entries are attached to empty series so they show whatever the data looks like
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label("OBS")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(2)));
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label(format!("{} members", series.members().len()))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MEMBER_GREY));
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label(format!("{} (MME)", model))
        .legend(|(x, y)| {
            EmptyElement::at((x, y))
                + PathElement::new(vec![(0, 0), (20, 0)], RED.stroke_width(3))
                + Circle::new((10, 0), 4, WHITE.filled())
                + Circle::new((10, 0), 4, RED.stroke_width(2))
        });

    let position = match series.legend_corner() {
        LegendCorner::LowerLeft => SeriesLabelPosition::LowerLeft,
        LegendCorner::UpperLeft => SeriesLabelPosition::UpperLeft,
    };
    chart
        .configure_series_labels()
        .position(position)
        .label_font((FONT, 13))
        .border_style(TRANSPARENT)
        .background_style(TRANSPARENT)
        .draw()?;

    draw_frame(area, &chart, &x_ticks, &y_ticks, 12)?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{keys::ClimateIndex, render::draw_svg, time_window::ForecastMonth};
    use optional::{none, some};
    use std::fs;

    #[test]
    fn test_index_panel_svg() {
        let window = TimeWindow::new(ForecastMonth::new(2024, 3).unwrap());
        let mut observed = vec![some(0.8); 6];
        observed[2] = none();
        let series = IndexSeries::new(
            ClimateIndex::Nino34,
            window,
            observed,
            (0..12).map(|i| some(1.0 - 0.1 * f64::from(i))).collect(),
            vec![vec![some(0.5); 12]; 8],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nino34_2024_03.svg");
        draw_svg(&path, (600, 500), |root| draw_index_panel(root, &series, "FGOALS-g3")).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Niño3.4 index"));
        assert!(svg.contains("Pred. from 2024-03"));
        assert!(svg.contains("8 members"));
        assert!(svg.contains("FGOALS-g3 (MME)"));
        assert!(svg.contains("202309"));
        assert!(svg.contains("202503"));
    }
}
