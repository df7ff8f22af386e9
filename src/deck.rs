//! Slide decks built from rendered charts and fixed narrative text.
//!
//! A [`SlideDeck`] is a plain description of slides. Writing it rasterizes every picture first,
//! so a missing or broken image stops the build before any output file is created.

use crate::error::{ReportError, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub mod pptx;
pub mod raster;
pub mod templates;

pub use templates::{realtime_deck, realtime_deck_path, skill_deck, skill_deck_path};

/// Width of a slide.
pub const SLIDE_WIDTH: Inches = Inches(10.0);
/// Height of a slide.
pub const SLIDE_HEIGHT: Inches = Inches(7.5);
/// Resolution pictures are rasterized at.
pub const RASTER_DPI: f64 = 350.0;

/// A length on the slide.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Inches(pub f64);

impl Inches {
    /// English metric units, the integer length unit of the presentation format.
    pub fn emu(self) -> i64 {
        (self.0 * 914_400.0).round() as i64
    }
}

/// A box on the slide, measured from the top left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Distance from the left edge.
    pub left: Inches,
    /// Distance from the top edge.
    pub top: Inches,
    /// Width.
    pub width: Inches,
    /// Height.
    pub height: Inches,
}

impl Rect {
    /// Build a box from lengths in inches.
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Rect {
            left: Inches(left),
            top: Inches(top),
            width: Inches(width),
            height: Inches(height),
        }
    }
}

/// Horizontal alignment of text in a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Flush left.
    Left,
    /// Centered.
    Center,
}

/// A text box. Each line of `text` becomes a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Position and size.
    pub rect: Rect,
    /// The text, lines separated by `\n`.
    pub text: String,
    /// Font size in points.
    pub size_pt: f64,
    /// Bold face.
    pub bold: bool,
    /// Font color, black if not set.
    pub color: Option<(u8, u8, u8)>,
    /// Alignment of every paragraph.
    pub align: Align,
    /// Line spacing as a multiple of single spacing.
    pub line_spacing: Option<f64>,
}

impl TextBox {
    /// Plain left aligned text.
    pub fn new<S: Into<String>>(rect: Rect, text: S, size_pt: f64) -> Self {
        TextBox {
            rect,
            text: text.into(),
            size_pt,
            bold: false,
            color: None,
            align: Align::Left,
            line_spacing: None,
        }
    }

    /// Set the face to bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Set the font color.
    pub fn with_color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.color = Some((red, green, blue));
        self
    }

    /// Center each paragraph.
    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    /// Set the line spacing.
    pub fn with_line_spacing(mut self, spacing: f64) -> Self {
        self.line_spacing = Some(spacing);
        self
    }
}

/// Where a picture's top left corner goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Horizontally centered on the slide at the given distance from the top.
    Centered {
        /// Distance from the top edge.
        top: Inches,
    },
    /// At a fixed position.
    At {
        /// Distance from the left edge.
        left: Inches,
        /// Distance from the top edge.
        top: Inches,
    },
}

/// A vector image placed on a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    /// The SVG file.
    pub path: PathBuf,
    /// Where it goes.
    pub placement: Placement,
    /// Width on the slide.
    pub width: Inches,
    /// Height on the slide. When not set it follows from the width and the image's aspect.
    pub height: Option<Inches>,
}

impl Picture {
    /// A picture centered at 1 inch from the top.
    pub fn centered<P: Into<PathBuf>>(path: P, width: f64) -> Self {
        Picture {
            path: path.into(),
            placement: Placement::Centered { top: Inches(1.0) },
            width: Inches(width),
            height: None,
        }
    }

    /// Fix the height instead of keeping the aspect ratio.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(Inches(height));
        self
    }

    /// Place the top left corner at a fixed position.
    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.placement = Placement::At {
            left: Inches(left),
            top: Inches(top),
        };
        self
    }

    /// The box the picture occupies given the raster's pixel size.
    pub fn rect(&self, pixels: (u32, u32)) -> Rect {
        let height = self.height.unwrap_or_else(|| {
            let (w, h) = pixels;
            if w == 0 {
                self.width
            } else {
                Inches(self.width.0 * f64::from(h) / f64::from(w))
            }
        });

        let (left, top) = match self.placement {
            Placement::Centered { top } => (Inches((SLIDE_WIDTH.0 - self.width.0) / 2.0), top),
            Placement::At { left, top } => (left, top),
        };

        Rect {
            left,
            top,
            width: self.width,
            height,
        }
    }
}

/// One slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slide {
    /// Title in the top left corner.
    pub title: Option<String>,
    /// At most one picture.
    pub picture: Option<Picture>,
    /// Text explaining the picture.
    pub caption: Option<TextBox>,
    /// Number shown in the bottom right corner.
    pub page_number: Option<usize>,
    /// Free text, used on title and closing pages.
    pub texts: Vec<TextBox>,
}

impl Slide {
    /// The title box.
    pub fn title_box(&self) -> Option<TextBox> {
        self.title
            .as_ref()
            .map(|t| TextBox::new(Rect::new(0.1, 0.0, 8.0, 0.5), t.clone(), 22.0).bold())
    }

    /// The page number box.
    pub fn page_box(&self) -> Option<TextBox> {
        self.page_number
            .map(|n| TextBox::new(Rect::new(9.6, 6.85, 1.0, 1.0), n.to_string(), 12.0))
    }

    /// Every text box on the slide, in drawing order.
    pub fn text_boxes(&self) -> Vec<TextBox> {
        self.title_box()
            .into_iter()
            .chain(self.texts.iter().cloned())
            .chain(self.caption.iter().cloned())
            .chain(self.page_box())
            .collect()
    }
}

/// An ordered list of slides with document properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideDeck {
    title: String,
    author: String,
    slides: Vec<Slide>,
}

impl SlideDeck {
    /// An empty deck.
    pub fn new<S: Into<String>>(title: S) -> Self {
        SlideDeck {
            title: title.into(),
            author: String::new(),
            slides: vec![],
        }
    }

    /// Set the author recorded in the document properties.
    pub fn with_author<S: Into<String>>(mut self, author: S) -> Self {
        self.author = author.into();
        self
    }

    /// Append a slide.
    pub fn push(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// The slides in order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// True if there are no slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Document title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Document author.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Every image the deck needs, in slide order.
    pub fn images(&self) -> Vec<&Path> {
        self.slides
            .iter()
            .filter_map(|s| s.picture.as_ref())
            .map(|p| p.path.as_path())
            .collect()
    }

    /// Check that every image exists.
    pub fn verify_images(&self) -> Result<()> {
        for path in self.images() {
            if !path.is_file() {
                return Err(ReportError::MissingImage(path.to_path_buf()));
            }
        }
        Ok(())
    }

    /// Rasterize every picture and write the presentation to `path`.
    ///
    /// Nothing is written unless every image is present and converts.
    pub fn write(&self, path: &Path) -> Result<()> {
        self.verify_images()?;

        let rasters = self
            .slides
            .iter()
            .map(|slide| {
                slide
                    .picture
                    .as_ref()
                    .map(|pic| raster::rasterize(&pic.path, RASTER_DPI))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(images = self.images().len(), "rasterized deck images");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Build next to the target and move into place so a failure leaves nothing behind
        let partial = path.with_extension("pptx.part");
        let written = fs::File::create(&partial)
            .map_err(ReportError::from)
            .and_then(|file| pptx::write_package(file, self, &rasters));
        if let Err(err) = written {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }
        fs::rename(&partial, path)?;

        info!(path = %path.display(), slides = self.len(), "wrote slide deck");
        Ok(())
    }
}
