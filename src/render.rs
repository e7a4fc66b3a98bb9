//! The layered renderer.
//!
//! [`render`] turns fetched geometry plus a theme into an owned
//! [`Figure`]: an ordered display list replayed by each export backend.
//! The stacking order is fixed — background, water, parks, roads from the
//! least to the most prominent class, then the edge fades and the
//! typography. Identical inputs always produce an identical list; there
//! is no randomness and no ambient drawing state anywhere in the
//! pipeline.

use tracing::{debug, info};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::geo::{Area, Coordinates, GeoLayers, Polyline};
use crate::geom::{NormalizedF32, Path, PathBuilder, Rect, Transform};
use crate::text::{typography, Typeface};
use crate::theme::{RoadClass, Theme};

/// Canvas height in points (a 16in tall figure).
pub const CANVAS_HEIGHT_PT: f32 = 1152.0;

/// Default width/height ratio when no page spec drives the figure.
pub const DEFAULT_ASPECT: f32 = 0.75;

/// Fraction of the canvas height covered by the top fade.
const TOP_FADE: f32 = 0.08;
/// Fraction of the canvas height covered by the bottom fade.
const BOTTOM_FADE: f32 = 0.20;

/// Stroke width for open waterways, in canvas points.
const WATERWAY_WIDTH: f32 = 2.0;

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// One poster to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// City name; also drives the title and the output filename.
    pub city: String,
    /// Optional country, used for geocoding and the subtitle.
    pub country: Option<String>,
    /// Theme identifier resolved through the theme store.
    pub theme: String,
    /// Search radius around the city center, in meters.
    pub radius_m: f64,
    /// Raster output resolution in dots per inch.
    pub dpi: u32,
}

impl RenderRequest {
    /// Check the request invariants: radius and DPI must be positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.radius_m > 0.0) {
            return Err(Error::InvalidRequest(format!(
                "radius must be positive, got {}",
                self.radius_m
            )));
        }
        if self.dpi == 0 {
            return Err(Error::InvalidRequest("dpi must be positive".into()));
        }
        Ok(())
    }
}

/// The edge a fade is opaque at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeEdge {
    /// Opaque at the top, transparent towards the bottom.
    Top,
    /// Opaque at the bottom, transparent towards the top.
    Bottom,
}

/// The fill rule used when filling a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// The `non-zero` fill rule.
    #[default]
    NonZero,
    /// The `even-odd` fill rule.
    EvenOdd,
}

/// One drawing command of a figure.
#[derive(Debug, Clone)]
pub enum DisplayItem {
    /// Fill a path with a solid color.
    Fill {
        /// The path to fill.
        path: Path,
        /// The fill color.
        color: Color,
        /// The fill opacity.
        opacity: NormalizedF32,
        /// The fill rule.
        rule: FillRule,
    },
    /// Stroke a path with a solid color and round caps.
    Stroke {
        /// The path to stroke.
        path: Path,
        /// The stroke color.
        color: Color,
        /// The stroke width in canvas points.
        width: f32,
        /// The stroke opacity.
        opacity: NormalizedF32,
    },
    /// A gradient fade from an opaque edge towards full transparency.
    Fade {
        /// The covered region in canvas points.
        rect: Rect,
        /// The fade color.
        color: Color,
        /// Which edge of the rect is opaque.
        edge: FadeEdge,
    },
}

/// A rendered poster: canvas size, background and the ordered display
/// list. The figure owns all of its drawing state.
#[derive(Debug, Clone)]
pub struct Figure {
    width: f32,
    height: f32,
    background: Color,
    items: Vec<DisplayItem>,
}

impl Figure {
    /// Canvas width in points.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Canvas height in points.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Width/height ratio of the canvas.
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    /// The background color.
    pub fn background(&self) -> Color {
        self.background
    }

    /// The display list, bottom to top.
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }
}

/// Maps (lon, lat) pairs onto the canvas.
///
/// Equirectangular approximation around the request center, uniformly
/// scaled so half the canvas height spans the request radius. Fine for
/// city-sized windows; nobody prints a poster of a hemisphere.
struct Projection {
    center: Coordinates,
    cos_lat: f64,
    half_width: f32,
    half_height: f32,
    pt_per_m: f64,
}

impl Projection {
    fn new(center: Coordinates, radius_m: f64, width: f32, height: f32) -> Self {
        Self {
            center,
            cos_lat: center.lat.to_radians().cos(),
            half_width: width / 2.0,
            half_height: height / 2.0,
            pt_per_m: (height / 2.0) as f64 / radius_m,
        }
    }

    fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let dx = (lon - self.center.lon).to_radians() * EARTH_RADIUS_M * self.cos_lat;
        let dy = (lat - self.center.lat).to_radians() * EARTH_RADIUS_M;
        (
            self.half_width + (dx * self.pt_per_m) as f32,
            self.half_height - (dy * self.pt_per_m) as f32,
        )
    }

    fn polyline_path(&self, line: &Polyline) -> Option<Path> {
        if line.points.len() < 2 {
            return None;
        }

        let mut builder = PathBuilder::new();
        let mut first = true;
        for &(lon, lat) in &line.points {
            let (x, y) = self.project(lon, lat);
            if first {
                builder.move_to(x, y);
                first = false;
            } else {
                builder.line_to(x, y);
            }
        }
        builder.finish()
    }

    fn area_path(&self, area: &Area) -> Option<Path> {
        if area.outer.len() < 3 {
            return None;
        }

        let mut builder = PathBuilder::new();
        self.push_ring(&mut builder, &area.outer);
        for hole in &area.holes {
            if hole.len() >= 3 {
                self.push_ring(&mut builder, hole);
            }
        }
        builder.finish()
    }

    fn push_ring(&self, builder: &mut PathBuilder, ring: &[(f64, f64)]) {
        for (i, &(lon, lat)) in ring.iter().enumerate() {
            let (x, y) = self.project(lon, lat);
            if i == 0 {
                builder.move_to(x, y);
            } else {
                builder.line_to(x, y);
            }
        }
        builder.close();
    }
}

/// Render geometry layers into a figure.
///
/// `aspect` is the width/height ratio of the canvas; use
/// [`DEFAULT_ASPECT`] for the plain poster and
/// [`crate::page::PageSpec::aspect_ratio`] when the figure is headed for
/// a composed page. Sparse or entirely empty layers render fine — the
/// result is background, fades and typography only.
pub fn render(
    layers: &GeoLayers,
    theme: &Theme,
    request: &RenderRequest,
    center: Coordinates,
    aspect: f32,
) -> Figure {
    let height = CANVAS_HEIGHT_PT;
    let width = height * aspect;
    let projection = Projection::new(center, request.radius_m, width, height);

    let mut items = Vec::new();

    // Water below parks below roads.
    for area in &layers.water {
        if let Some(path) = projection.area_path(area) {
            items.push(DisplayItem::Fill {
                path,
                color: theme.water,
                opacity: NormalizedF32::ONE,
                rule: FillRule::EvenOdd,
            });
        }
    }
    for line in &layers.waterways {
        if let Some(path) = projection.polyline_path(line) {
            items.push(DisplayItem::Stroke {
                path,
                color: theme.water,
                width: WATERWAY_WIDTH,
                opacity: NormalizedF32::ONE,
            });
        }
    }

    for area in &layers.parks {
        if let Some(path) = projection.area_path(area) {
            items.push(DisplayItem::Fill {
                path,
                color: theme.parks,
                opacity: NormalizedF32::ONE,
                rule: FillRule::EvenOdd,
            });
        }
    }

    for class in RoadClass::DRAW_ORDER {
        for road in layers.roads.iter().filter(|r| r.class == class) {
            if let Some(path) = projection.polyline_path(&road.line) {
                items.push(DisplayItem::Stroke {
                    path,
                    color: theme.road_color(class),
                    width: class.stroke_width(),
                    opacity: NormalizedF32::ONE,
                });
            }
        }
    }

    debug!(items = items.len(), "geometry layers drawn");

    if let Some(rect) = Rect::from_xywh(0.0, 0.0, width, height * TOP_FADE) {
        items.push(DisplayItem::Fade {
            rect,
            color: theme.gradient_color,
            edge: FadeEdge::Top,
        });
    }
    if let Some(rect) = Rect::from_xywh(
        0.0,
        height * (1.0 - BOTTOM_FADE),
        width,
        height * BOTTOM_FADE,
    ) {
        items.push(DisplayItem::Fade {
            rect,
            color: theme.gradient_color,
            edge: FadeEdge::Bottom,
        });
    }

    caption_items(&mut items, theme, request, center, width, height);

    info!(
        city = %request.city,
        theme = %theme.name,
        "figure rendered"
    );

    Figure {
        width,
        height,
        background: theme.bg,
        items,
    }
}

/// Vertical anchors as fractions of the canvas height, measured from the
/// bottom edge like the original poster layout.
const TITLE_Y: f32 = 0.14;
const RULE_Y: f32 = 0.125;
const COUNTRY_Y: f32 = 0.10;
const COORDS_Y: f32 = 0.07;

fn caption_items(
    items: &mut Vec<DisplayItem>,
    theme: &Theme,
    request: &RenderRequest,
    center: Coordinates,
    width: f32,
    height: f32,
) {
    let typography = typography();

    // Divider rule between title and country.
    let mut rule = PathBuilder::new();
    rule.move_to(width * 0.35, height * (1.0 - RULE_Y));
    rule.line_to(width * 0.65, height * (1.0 - RULE_Y));
    if let Some(path) = rule.finish() {
        items.push(DisplayItem::Stroke {
            path,
            color: theme.text,
            width: 1.0,
            opacity: NormalizedF32::ONE,
        });
    }

    let title = letter_spaced(&request.city);
    if let Some(face) = typography.title_face() {
        push_caption(
            items,
            face,
            &title,
            28.0,
            Anchor::Center(width / 2.0),
            height * (1.0 - TITLE_Y),
            theme.text,
            1.0,
        );
    }

    if let Some(face) = typography.body_face() {
        if let Some(country) = &request.country {
            push_caption(
                items,
                face,
                &country.to_uppercase(),
                12.0,
                Anchor::Center(width / 2.0),
                height * (1.0 - COUNTRY_Y),
                theme.text,
                1.0,
            );
        }

        push_caption(
            items,
            face,
            &center.caption(),
            10.0,
            Anchor::Center(width / 2.0),
            height * (1.0 - COORDS_Y),
            theme.text,
            0.7,
        );

        push_caption(
            items,
            face,
            "© OpenStreetMap",
            6.0,
            Anchor::Right(width * 0.98),
            height * 0.98,
            theme.text,
            0.5,
        );
    }
}

enum Anchor {
    Center(f32),
    Right(f32),
}

#[allow(clippy::too_many_arguments)]
fn push_caption(
    items: &mut Vec<DisplayItem>,
    face: &Typeface,
    text: &str,
    size: f32,
    anchor: Anchor,
    center_y: f32,
    color: Color,
    opacity: f32,
) {
    let Some(line) = face.line(text, size) else {
        return;
    };
    let Some(path) = line.path else {
        return;
    };

    let x = match anchor {
        Anchor::Center(cx) => cx - line.width / 2.0,
        Anchor::Right(rx) => rx - line.width,
    };
    // Optical vertical centering around the anchor.
    let baseline = center_y + size * 0.35;

    if let Some(placed) = path.transform(Transform::from_translate(x, baseline)) {
        items.push(DisplayItem::Fill {
            path: placed,
            color,
            opacity: NormalizedF32::new(opacity),
            rule: FillRule::NonZero,
        });
    }
}

/// Uppercase and spread a title: `"Frankfurt"` becomes
/// `"F  R  A  N  K  F  U  R  T"`.
fn letter_spaced(text: &str) -> String {
    let mut out = String::new();
    for (i, ch) in text.to_uppercase().chars().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push(ch);
    }
    out
}
