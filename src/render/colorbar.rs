//! Colorbars with triangular ends for the extended bins.

use super::{draw_label, style::ColorScale, Area};
use crate::error::Result;
use plotters::{
    prelude::*,
    style::text_anchor::{HPos, VPos},
};

/// Which way the bar runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Low values on the left.
    Horizontal,
    /// Low values at the bottom.
    Vertical,
}

/// Fill `area` with a colorbar for `scale`, ticks labelled with `scale.ticks()`.
pub fn draw_colorbar(
    area: &Area,
    scale: &ColorScale,
    orientation: Orientation,
    units: Option<&str>,
) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let (w, h) = (w as f64, h as f64);
    let levels = scale.levels();
    let colors = scale.colors();
    let (lo, hi) = (levels[0], levels[levels.len() - 1]);

    // Bar geometry along its length (t) and across it (s), in pixels.
    let (len_start, len_end, across_start, across_end) = match orientation {
        Orientation::Horizontal => (0.08 * w, 0.92 * w, 0.1 * h, 0.45 * h),
        Orientation::Vertical => (0.92 * h, 0.08 * h, 0.1 * w, 0.35 * w),
    };
    let tri = ((len_end - len_start) / (levels.len() - 1) as f64).abs();
    let dir = (len_end - len_start).signum();
    let along = |v: f64| len_start + (v - lo) / (hi - lo) * (len_end - len_start);
    let px = |t: f64, s: f64| -> (i32, i32) {
        match orientation {
            Orientation::Horizontal => (t.round() as i32, s.round() as i32),
            Orientation::Vertical => (s.round() as i32, t.round() as i32),
        }
    };
    let mid = (across_start + across_end) / 2.0;

    for (k, pair) in levels.windows(2).enumerate() {
        let (t0, t1) = (along(pair[0]), along(pair[1]));
        area.draw(&Rectangle::new(
            [px(t0, across_start), px(t1, across_end)],
            colors[k + 1].filled(),
        ))?;
    }

    let low_tip = len_start - tri * dir;
    let high_tip = len_end + tri * dir;
    let low = vec![px(len_start, across_start), px(low_tip, mid), px(len_start, across_end)];
    let high = vec![px(len_end, across_start), px(high_tip, mid), px(len_end, across_end)];
    area.draw(&Polygon::new(low.clone(), colors[0].filled()))?;
    area.draw(&Polygon::new(high.clone(), colors[colors.len() - 1].filled()))?;

    let outline = vec![
        low[0],
        low[1],
        low[2],
        high[2],
        high[1],
        high[0],
        low[0],
    ];
    area.draw(&PathElement::new(outline, BLACK.stroke_width(1)))?;

    for &tick in scale.ticks() {
        let t = along(tick);
        let text = format_tick(tick);
        match orientation {
            Orientation::Horizontal => {
                let (x, y) = px(t, across_end);
                area.draw(&PathElement::new(vec![(x, y), (x, y - 3)], BLACK))?;
                draw_label(area, &text, (x, y + 3), 11, (HPos::Center, VPos::Top))?;
            }
            Orientation::Vertical => {
                let (x, y) = px(t, across_end);
                area.draw(&PathElement::new(vec![(x, y), (x - 3, y)], BLACK))?;
                draw_label(area, &text, (x + 4, y), 11, (HPos::Left, VPos::Center))?;
            }
        }
    }

    if let Some(units) = units {
        let pos = match orientation {
            Orientation::Horizontal => px(high_tip + 6.0, mid),
            Orientation::Vertical => px(high_tip - 6.0, mid),
        };
        let anchor = match orientation {
            Orientation::Horizontal => (HPos::Left, VPos::Center),
            Orientation::Vertical => (HPos::Center, VPos::Bottom),
        };
        draw_label(area, units, pos, 11, anchor)?;
    }

    Ok(())
}

/// Tick labels drop trailing zeros: `-3.6`, `0`, `12`.
pub(crate) fn format_tick(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_owned();
    }
    let text = format!("{:.2}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}
