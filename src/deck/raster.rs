//! SVG to PNG conversion.

use crate::error::{ReportError, Result};
use resvg::{tiny_skia, usvg};
use std::{fs, path::Path};
use tracing::debug;

/// SVG user units are CSS pixels, 96 to the inch.
const SVG_DPI: f64 = 96.0;

/// A PNG encoded image and its size in pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// PNG bytes.
    pub png: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Render an SVG file at `dpi` on a white background.
pub fn rasterize(path: &Path, dpi: f64) -> Result<RasterImage> {
    let fail = |reason: String| ReportError::Raster {
        path: path.to_path_buf(),
        reason,
    };

    if !path.is_file() {
        return Err(ReportError::MissingImage(path.to_path_buf()));
    }
    let data = fs::read(path)?;

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(&data, &options).map_err(|err| fail(err.to_string()))?;

    let scale = (dpi / SVG_DPI) as f32;
    let size = tree.size();
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| fail(format!("invalid raster size {}x{}", width, height)))?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let png = pixmap.encode_png().map_err(|err| fail(err.to_string()))?;
    debug!(path = %path.display(), width, height, "rasterized image");

    Ok(RasterImage { png, width, height })
}
