//! Raster backend: replays a figure into a tiny-skia pixmap.

use tiny_skia::{
    FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, Pixmap, SpreadMode,
    Stroke,
};

use crate::error::{Error, Result};
use crate::geom::{Point, Transform};
use crate::render::{self, DisplayItem, FadeEdge, Figure};

/// Rasterize and PNG-encode a figure.
///
/// The pixel size is the canvas point size scaled by `dpi / 72`. Returns
/// the encoded bytes together with the pixel dimensions. Identical
/// figures encode to identical bytes.
pub fn encode(figure: &Figure, dpi: u32) -> Result<(Vec<u8>, u32, u32)> {
    let scale = dpi as f32 / 72.0;
    let width = (figure.width() * scale).round().max(1.0) as u32;
    let height = (figure.height() * scale).round().max(1.0) as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Render(format!("cannot allocate {width}x{height} pixmap")))?;

    let bg = figure.background();
    pixmap.fill(bg.to_tiny_skia(1.0));

    let ts = Transform::from_scale(scale, scale);

    for item in figure.items() {
        match item {
            DisplayItem::Fill { path, color, opacity, rule } => {
                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.set_color(color.to_tiny_skia(opacity.get()));

                let rule = match rule {
                    render::FillRule::NonZero => FillRule::Winding,
                    render::FillRule::EvenOdd => FillRule::EvenOdd,
                };
                pixmap.fill_path(path, &paint, rule, ts, None);
            }
            DisplayItem::Stroke { path, color, width, opacity } => {
                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.set_color(color.to_tiny_skia(opacity.get()));

                let stroke = Stroke {
                    width: *width,
                    line_cap: LineCap::Round,
                    line_join: LineJoin::Round,
                    ..Stroke::default()
                };
                pixmap.stroke_path(path, &paint, &stroke, ts, None);
            }
            DisplayItem::Fade { rect, color, edge } => {
                let (start, end) = match edge {
                    FadeEdge::Top => (
                        Point::from_xy(rect.x(), rect.top()),
                        Point::from_xy(rect.x(), rect.bottom()),
                    ),
                    FadeEdge::Bottom => (
                        Point::from_xy(rect.x(), rect.bottom()),
                        Point::from_xy(rect.x(), rect.top()),
                    ),
                };

                let stops = vec![
                    GradientStop::new(0.0, color.to_tiny_skia(1.0)),
                    GradientStop::new(1.0, color.to_tiny_skia(0.0)),
                ];

                let Some(shader) =
                    LinearGradient::new(start, end, stops, SpreadMode::Pad, Transform::identity())
                else {
                    continue;
                };

                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.shader = shader;
                pixmap.fill_rect(*rect, &paint, ts, None);
            }
        }
    }

    let bytes = pixmap
        .encode_png()
        .map_err(|err| Error::Render(format!("png encoding failed: {err}")))?;

    Ok((bytes, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geo::{Coordinates, GeoLayers};
    use crate::render::{render, RenderRequest, DEFAULT_ASPECT};
    use crate::theme::Theme;

    fn figure(bg: &str) -> Figure {
        let theme: Theme = serde_json::from_str(&format!(
            r##"{{
                "name": "t",
                "bg": "{bg}",
                "text": "#EEEEEE",
                "gradient_color": "{bg}",
                "water": "#203050",
                "parks": "#203020",
                "road_motorway": "#F0F0F0",
                "road_primary": "#D0D0D0",
                "road_secondary": "#B0B0B0",
                "road_tertiary": "#909090",
                "road_residential": "#707070",
                "road_default": "#505050"
            }}"##
        ))
        .unwrap();
        let request = RenderRequest {
            city: "T".into(),
            country: None,
            theme: "t".into(),
            radius_m: 1000.0,
            dpi: 72,
        };
        render(
            &GeoLayers::default(),
            &theme,
            &request,
            Coordinates { lat: 0.0, lon: 0.0 },
            DEFAULT_ASPECT,
        )
    }

    #[test]
    fn pixel_size_follows_dpi() {
        let figure = figure("#102030");
        let (_, w72, h72) = encode(&figure, 72).unwrap();
        let (_, w144, h144) = encode(&figure, 144).unwrap();
        assert_eq!((w144, h144), (w72 * 2, h72 * 2));
    }

    #[test]
    fn background_dominates_empty_posters() {
        let bg = Color::new(0x10, 0x20, 0x30);
        let (bytes, w, h) = encode(&figure("#102030"), 72).unwrap();

        let pixmap = Pixmap::decode_png(&bytes).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (w, h));

        let matching = pixmap
            .pixels()
            .iter()
            .filter(|p| p.red() == bg.red() && p.green() == bg.green() && p.blue() == bg.blue())
            .count();
        assert!(matching * 2 > pixmap.pixels().len());
    }

    #[test]
    fn encoding_is_deterministic() {
        let (a, ..) = encode(&figure("#102030"), 150).unwrap();
        let (b, ..) = encode(&figure("#102030"), 150).unwrap();
        assert_eq!(a, b);
    }
}
