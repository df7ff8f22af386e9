//! Color scales for filled maps.

use crate::{
    error::{ReportError, Result},
    utility::stepped_range,
};
use optional::Optioned;
use plotters::style::RGBColor;

/// Blue through white to red, for temperature and height anomalies.
pub const BLUE_WHITE_RED: &[RGBColor] = &[
    RGBColor(5, 48, 97),
    RGBColor(33, 102, 172),
    RGBColor(67, 147, 195),
    RGBColor(146, 197, 222),
    RGBColor(209, 229, 240),
    RGBColor(255, 255, 255),
    RGBColor(253, 219, 199),
    RGBColor(244, 165, 130),
    RGBColor(214, 96, 77),
    RGBColor(178, 24, 43),
    RGBColor(103, 0, 31),
];

/// Brown through white to green, for precipitation anomalies.
pub const BROWN_WHITE_GREEN: &[RGBColor] = &[
    RGBColor(84, 48, 5),
    RGBColor(140, 81, 10),
    RGBColor(191, 129, 45),
    RGBColor(223, 194, 125),
    RGBColor(246, 232, 195),
    RGBColor(255, 255, 255),
    RGBColor(199, 234, 229),
    RGBColor(128, 205, 193),
    RGBColor(53, 151, 143),
    RGBColor(1, 102, 94),
    RGBColor(0, 60, 48),
];

/// A rainbow running from deep blue to dark red, for the equatorial section.
pub const RAINBOW: &[RGBColor] = &[
    RGBColor(48, 18, 59),
    RGBColor(65, 69, 171),
    RGBColor(70, 117, 237),
    RGBColor(57, 162, 252),
    RGBColor(27, 207, 212),
    RGBColor(36, 236, 166),
    RGBColor(97, 252, 108),
    RGBColor(164, 252, 59),
    RGBColor(209, 232, 52),
    RGBColor(243, 198, 58),
    RGBColor(254, 155, 45),
    RGBColor(243, 99, 21),
    RGBColor(217, 56, 6),
    RGBColor(177, 25, 1),
    RGBColor(122, 4, 2),
];

/// Sample a piecewise linear palette at `t` in 0..=1.
pub fn sample_palette(anchors: &[RGBColor], t: f64) -> RGBColor {
    match anchors.len() {
        0 => RGBColor(0, 0, 0),
        1 => anchors[0],
        n => {
            let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = (pos.floor() as usize).min(n - 2);
            let frac = pos - lower as f64;

            let RGBColor(r0, g0, b0) = anchors[lower];
            let RGBColor(r1, g1, b1) = anchors[lower + 1];
            let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * frac).round() as u8;

            RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
        }
    }
}

/// Discrete colors for filled contours, extended at both ends.
///
/// `n` levels divide the number line into `n + 1` bins: below the first level, between each
/// pair of levels, and at or above the last level.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    levels: Vec<f64>,
    colors: Vec<RGBColor>,
    ticks: Vec<f64>,
}

impl ColorScale {
    /// Build a scale from increasing levels, spreading the palette evenly over the bins.
    pub fn new(levels: Vec<f64>, palette: &[RGBColor]) -> Result<Self> {
        if levels.len() < 2 || levels.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ReportError::InvalidInput(
                "color levels must be at least two increasing values".to_owned(),
            ));
        }

        let n_bins = levels.len() + 1;
        let colors = (0..n_bins)
            .map(|i| sample_palette(palette, i as f64 / (n_bins - 1) as f64))
            .collect();

        Ok(ColorScale {
            ticks: levels.clone(),
            levels,
            colors,
        })
    }

    /// Levels from `-limit` to `limit` every `step`.
    pub fn symmetric(limit: f64, step: f64, palette: &[RGBColor]) -> Result<Self> {
        Self::new(stepped_range(-limit, limit, step), palette)
    }

    /// Label the colorbar every `step` from the first level instead of at every level.
    pub fn with_tick_step(mut self, step: f64) -> Self {
        let first = self.levels[0];
        let last = self.levels[self.levels.len() - 1];
        self.ticks = stepped_range(first, last, step);
        self
    }

    /// The level boundaries.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// One color per bin, `levels().len() + 1` of them.
    pub fn colors(&self) -> &[RGBColor] {
        &self.colors
    }

    /// Values labelled on the colorbar.
    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    /// The bin a value falls in.
    pub fn bin_of(&self, value: Optioned<f64>) -> Option<usize> {
        let v = value.into_option()?;
        if v.is_nan() {
            return None;
        }
        Some(self.levels.partition_point(|&l| l <= v))
    }

    /// The fill color of a value, `None` for missing values.
    pub fn color_of(&self, value: Optioned<f64>) -> Option<RGBColor> {
        self.bin_of(value).map(|b| self.colors[b])
    }
}
