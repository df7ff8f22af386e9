//! Longitude-time section of equatorial sea surface temperature anomalies.

use super::{
    colorbar::{draw_colorbar, Orientation},
    contour::{contour_segments, filled_bands},
    draw_frame, draw_label, draw_titles, local, lon_label,
    style::{ColorScale, RAINBOW},
    Area, Ticks,
};
use crate::{
    error::Result,
    fields::EquatorialSection,
    time_window::{ForecastMonth, TimeWindow},
    utility::stepped_range,
};
use plotters::{
    prelude::*,
    style::text_anchor::{HPos, VPos},
};

/// Color levels of the section, K.
pub fn section_scale() -> Result<ColorScale> {
    Ok(ColorScale::symmetric(3.6, 0.3, RAINBOW)?.with_tick_step(0.6))
}

/// Draw the section filling `area`: the filled field with contours, a separator between the
/// observed and forecast rows, and a vertical colorbar on the right.
pub fn draw_hovmoller(
    area: &Area,
    section: &EquatorialSection,
    anchor: ForecastMonth,
    model: &str,
) -> Result<()> {
    let scale = section_scale()?;
    let window = TimeWindow::new(anchor);

    draw_titles(area, &format!("Pred. from {}", anchor), None, 15)?;

    let (width, height) = area.dim_in_pixel();
    let (width, height) = (width as i32, height as i32);
    let (main, bar) = area.split_horizontally((width - 80).max(0));
    let bar = bar.margin(height / 6, height / 6, 0, 0);

    let (lon_min, lon_max) = (120.0, 280.0);
    let (y_min, y_max) = (1.0, TimeWindow::AXIS_SPAN as f64);

    let mut chart = ChartBuilder::on(&main)
        .margin_top(30)
        .margin_right(10)
        .margin_bottom(6)
        .x_label_area_size(26)
        .y_label_area_size(60)
        .build_cartesian_2d(lon_min..lon_max, y_min..y_max)?;

    let ys: Vec<f64> = (1..=section.rows.len()).map(|k| k as f64).collect();
    let colors = scale.colors();
    chart.draw_series(
        filled_bands(&section.lons, &ys, &section.rows, scale.levels())
            .into_iter()
            .map(|(band, ring)| Polygon::new(ring, colors[band].filled())),
    )?;

    for level in stepped_range(-3.6, 3.6, 0.6) {
        let segments = contour_segments(&section.lons, &ys, &section.rows, level);
        chart.draw_series(
            segments
                .into_iter()
                .map(|seg| PathElement::new(seg.to_vec(), BLACK.stroke_width(1))),
        )?;
    }

    // Observed rows end at y = 6, forecast rows start at y = 7
    let separator = (EquatorialSection::OBSERVED_ROWS + 1) as f64;
    chart.draw_series(std::iter::once(PathElement::new(
        vec![(lon_min, separator), (lon_max, separator)],
        BLACK.stroke_width(1),
    )))?;

    let obs_at = local(&main, chart.backend_coord(&(125.0, separator - 1.0)));
    draw_label(&main, "OBS", obs_at, 12, (HPos::Left, VPos::Bottom))?;
    let model_at = local(&main, chart.backend_coord(&(125.0, separator + 0.5)));
    draw_label(&main, model, model_at, 12, (HPos::Left, VPos::Bottom))?;

    let labels = window.axis_labels();
    let x_ticks = Ticks::at(&stepped_range(120.0, 280.0, 40.0), lon_label)
        .with_minor(stepped_range(120.0, 280.0, 20.0));
    let y_ticks = Ticks {
        major: (0..TimeWindow::AXIS_SPAN)
            .step_by(3)
            .map(|i| ((i + 1) as f64, labels[i].clone()))
            .collect(),
        minor: ys.clone(),
    };
    draw_frame(&main, &chart, &x_ticks, &y_ticks, 12)?;

    draw_colorbar(&bar, &scale, Orientation::Vertical, Some("K"))?;

    Ok(())
}
