//! Typography for poster captions.
//!
//! Captions are short Latin runs (a city name, a country, a coordinate
//! line), so no shaping engine is involved: characters map to glyphs
//! through the font's character map and advance one by one. Glyph
//! outlines are extracted with skrifa and collected into a single filled
//! path, which keeps every export backend font-free.
//!
//! Faces come from the system font database. When no usable sans-serif
//! face exists, the renderer drops the captions and keeps the geometry.

use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use skrifa::instance::{LocationRef, Size};
use skrifa::outline::{DrawSettings, OutlinePen};
use skrifa::{FontRef, MetadataProvider};
use tracing::warn;

use crate::geom::{Path, PathBuilder, Transform};

/// Preferred families, most specific first.
const FAMILIES: [Family; 7] = [
    Family::Name("Helvetica Neue"),
    Family::Name("Helvetica"),
    Family::Name("Arial"),
    Family::Name("DejaVu Sans"),
    Family::Name("Liberation Sans"),
    Family::Name("Noto Sans"),
    Family::SansSerif,
];

static DATABASE: Lazy<Database> = Lazy::new(|| {
    let mut db = Database::new();
    db.load_system_fonts();
    db
});

static TYPOGRAPHY: Lazy<Typography> = Lazy::new(|| {
    let typography = Typography {
        title: query_face(&DATABASE, Weight::BOLD),
        body: query_face(&DATABASE, Weight::NORMAL),
    };
    if typography.body.is_none() {
        warn!("no usable sans-serif face found, posters will carry no captions");
    }
    typography
});

/// The process-wide typography, resolved once and read-only afterwards.
pub fn typography() -> &'static Typography {
    &TYPOGRAPHY
}

/// The faces used on a poster.
pub struct Typography {
    /// Bold face for the city title.
    pub title: Option<Typeface>,
    /// Regular face for everything else.
    pub body: Option<Typeface>,
}

impl Typography {
    /// The title face, falling back to the body face.
    pub fn title_face(&self) -> Option<&Typeface> {
        self.title.as_ref().or(self.body.as_ref())
    }

    /// The body face.
    pub fn body_face(&self) -> Option<&Typeface> {
        self.body.as_ref()
    }
}

fn query_face(db: &Database, weight: Weight) -> Option<Typeface> {
    let id = db.query(&Query {
        families: &FAMILIES,
        weight,
        stretch: Stretch::Normal,
        style: Style::Normal,
    })?;

    db.with_face_data(id, |data, index| Typeface {
        data: Arc::new(data.to_vec()),
        index,
    })
}

/// One loaded font face.
#[derive(Clone)]
pub struct Typeface {
    data: Arc<Vec<u8>>,
    index: u32,
}

impl Typeface {
    /// Load a face from raw font data.
    pub fn from_data(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Typeface { data: Arc::new(data), index };
        face.font_ref()?;
        Some(face)
    }

    fn font_ref(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(self.data.as_ref(), self.index).ok()
    }

    /// Lay out `text` at `size` points.
    ///
    /// The returned line has its baseline at y = 0 and starts at x = 0,
    /// with y growing downwards to match the canvas orientation. Characters
    /// without a glyph advance by a quarter em and draw nothing.
    pub fn line(&self, text: &str, size: f32) -> Option<TextLine> {
        let font = self.font_ref()?;
        let charmap = font.charmap();
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let glyph_metrics = font.glyph_metrics(Size::unscaled(), LocationRef::default());
        let outlines = font.outline_glyphs();

        let upem = metrics.units_per_em as f32;
        if upem <= 0.0 {
            return None;
        }
        let scale = size / upem;

        let mut builder = PathBuilder::new();
        let mut pen_x = 0.0f32;

        for ch in text.chars() {
            let Some(glyph) = charmap.map(ch) else {
                pen_x += upem * 0.25 * scale;
                continue;
            };

            if let Some(outline) = outlines.get(glyph) {
                let mut pen = GlyphPen::new();
                let settings = DrawSettings::unhinted(Size::unscaled(), LocationRef::default());
                if outline.draw(settings, &mut pen).is_ok() {
                    if let Some(path) = pen.finish() {
                        // Glyph outlines are y-up; the canvas is y-down.
                        let placed =
                            path.transform(Transform::from_row(scale, 0.0, 0.0, -scale, pen_x, 0.0));
                        if let Some(placed) = placed {
                            builder.push_path(&placed);
                        }
                    }
                }
            }

            pen_x += glyph_metrics
                .advance_width(glyph)
                .unwrap_or(upem * 0.25)
                * scale;
        }

        Some(TextLine {
            path: builder.finish(),
            width: pen_x,
        })
    }
}

/// A laid-out caption line.
pub struct TextLine {
    /// The filled outline path; `None` for all-whitespace lines.
    pub path: Option<Path>,
    /// The advance width of the whole line in points.
    pub width: f32,
}

/// A wrapper struct for implementing the `OutlinePen` trait.
struct GlyphPen(PathBuilder);

impl GlyphPen {
    fn new() -> Self {
        Self(PathBuilder::new())
    }

    fn finish(self) -> Option<Path> {
        self.0.finish()
    }
}

impl OutlinePen for GlyphPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.0.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.0.cubic_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.0.close()
    }
}
