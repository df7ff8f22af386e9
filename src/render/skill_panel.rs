//! Hindcast skill panels: ACC and RMSE by lead, and ACC by start month and lead.

use super::{
    colorbar::{draw_colorbar, format_tick, Orientation},
    dashes, draw_frame, draw_titles, present_runs,
    style::{ColorScale, RAINBOW},
    Area, Ticks, FONT,
};
use crate::{error::Result, skill::LeadSkill, utility::stepped_range};
use optional::Optioned;
use plotters::{chart::SeriesLabelPosition, prelude::*};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// ACC at or above this is counted as a useful forecast.
pub const USEFUL_ACC: f64 = 0.6;

/// ACC and RMSE against lead time, with a dashed line at the useful-skill threshold.
pub fn draw_lead_skill(area: &Area, skill: &[LeadSkill], title: &str) -> Result<()> {
    draw_titles(area, title, None, 16)?;

    let max_lead = skill.iter().map(|s| s.lead).max().unwrap_or(1) as f64;
    let y_max = skill
        .iter()
        .filter_map(|s| s.rmse)
        .fold(1.0_f64, f64::max)
        .ceil();

    let mut chart = ChartBuilder::on(area)
        .margin_top(34)
        .margin_right(16)
        .margin_left(8)
        .margin_bottom(8)
        .x_label_area_size(36)
        .y_label_area_size(44)
        .build_cartesian_2d(0.5..(max_lead + 0.5), 0.0..y_max)?;

    let x_ticks = Ticks::at(
        &(1..=max_lead as usize).map(|l| l as f64).collect::<Vec<_>>(),
        |v| format!("{:.0}", v),
    );
    let y_ticks = Ticks::at(&stepped_range(0.0, y_max, 0.2), format_tick)
        .with_minor(stepped_range(0.0, y_max, 0.1));

    chart.draw_series(
        dashes((0.5, USEFUL_ACC), (max_lead + 0.5, USEFUL_ACC), 30)
            .into_iter()
            .map(|seg| PathElement::new(seg.to_vec(), BLACK.stroke_width(1))),
    )?;

    let as_points = |f: fn(&LeadSkill) -> Option<f64>| -> Vec<(f64, Optioned<f64>)> {
        skill
            .iter()
            .map(|s| (s.lead as f64, Optioned::from(f(s))))
            .collect()
    };

    for run in present_runs(&as_points(|s| s.acc)) {
        chart.draw_series(LineSeries::new(run.clone(), RED.stroke_width(2)))?;
        chart.draw_series(run.iter().map(|&pt| Circle::new(pt, 3, RED.filled())))?;
    }
    for run in present_runs(&as_points(|s| s.rmse)) {
        chart.draw_series(LineSeries::new(run.clone(), BLUE.stroke_width(2)))?;
        chart.draw_series(run.iter().map(|&pt| Circle::new(pt, 3, BLUE.filled())))?;
    }

    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label("ACC")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label("RMSE")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font((FONT, 13))
        .border_style(TRANSPARENT)
        .background_style(TRANSPARENT)
        .draw()?;

    draw_frame(area, &chart, &x_ticks, &y_ticks, 12)?;

    Ok(())
}

/// Color levels for the spring barrier matrix.
pub fn spb_scale() -> Result<ColorScale> {
    Ok(ColorScale::new(stepped_range(0.0, 1.0, 0.1), RAINBOW)?.with_tick_step(0.2))
}

/// ACC by start calendar month (rows, January at the top) and lead (columns) with a colorbar
/// along the bottom.
pub fn draw_spb(area: &Area, matrix: &[Vec<Option<f64>>], title: &str) -> Result<()> {
    let scale = spb_scale()?;
    draw_titles(area, title, None, 16)?;

    let (_, height) = area.dim_in_pixel();
    let (main, bar) = area.split_vertically((height as i32 - 60).max(0));
    let bar = bar.margin(0, 0, 40, 40);

    let leads = matrix.iter().map(Vec::len).max().unwrap_or(0).max(1);

    let mut chart = ChartBuilder::on(&main)
        .margin_top(34)
        .margin_right(16)
        .margin_left(8)
        .x_label_area_size(30)
        .y_label_area_size(44)
        .build_cartesian_2d(0.5..(leads as f64 + 0.5), 0.5..12.5)?;

    // Row 0 (January) is drawn at the top
    let row_y = |row: usize| 12.0 - row as f64;

    let mut cells = vec![];
    for (row, vals) in matrix.iter().enumerate().take(12) {
        let y = row_y(row);
        for (col, &val) in vals.iter().enumerate() {
            if let Some(color) = scale.color_of(Optioned::from(val)) {
                let x = (col + 1) as f64;
                cells.push(Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    color.filled(),
                ));
            }
        }
    }
    chart.draw_series(cells)?;

    let x_ticks = Ticks::at(
        &(1..=leads).map(|l| l as f64).collect::<Vec<_>>(),
        |v| format!("{:.0}", v),
    );
    let y_ticks = Ticks {
        major: MONTH_NAMES
            .iter()
            .enumerate()
            .map(|(row, name)| (row_y(row), (*name).to_owned()))
            .collect(),
        minor: vec![],
    };
    draw_frame(&main, &chart, &x_ticks, &y_ticks, 12)?;

    draw_colorbar(&bar, &scale, Orientation::Horizontal, Some("ACC"))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::render::draw_svg;
    use std::fs;

    #[test]
    fn test_lead_skill_svg() {
        let skill: Vec<LeadSkill> = (1..=12)
            .map(|lead| LeadSkill {
                lead,
                acc: if lead == 5 {
                    None
                } else {
                    Some(1.0 - 0.05 * lead as f64)
                },
                rmse: Some(0.2 + 0.06 * lead as f64),
            })
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acc_rmse.svg");
        draw_svg(&path, (600, 450), |root| {
            draw_lead_skill(root, &skill, "ACC & RMSE of Niño3.4 index")
        })
        .unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("ACC &amp; RMSE") || svg.contains("ACC & RMSE"));
        assert!(svg.contains("RMSE"));
        assert!(svg.contains(">12<"));
    }

    #[test]
    fn test_spb_svg() {
        let matrix: Vec<Vec<Option<f64>>> = (0..12)
            .map(|m| {
                (0..9)
                    .map(|l| {
                        if m == 0 && l == 0 {
                            None
                        } else {
                            Some(0.95 - 0.03 * (m + l) as f64)
                        }
                    })
                    .collect()
            })
            .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spb.svg");
        draw_svg(&path, (600, 600), |root| {
            draw_spb(root, &matrix, "SPB of Niño3.4 index")
        })
        .unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Jan"));
        assert!(svg.contains("Dec"));
        assert!(svg.contains("<rect"));
    }
}
