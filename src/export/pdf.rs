//! Vector backend: writes a composed page as a single-page PDF.
//!
//! The page records the full set of geometry boxes (media, trim, bleed,
//! art) so prepress tooling sees the same layout the composer computed.
//! The figure's display list is replayed into the content stream under
//! one transform; translucency goes through named ExtGState entries and
//! fades are decomposed into constant-alpha strips.

use std::collections::BTreeSet;

use pdf_writer::types::LineCapStyle;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, TextStr};

use crate::export::{emit_path, PathSink, FADE_STRIPS};
use crate::geom::mm_to_pt;
use crate::page::{ComposedPage, MmRect};
use crate::render::{DisplayItem, FadeEdge, FillRule};

/// Quantized alpha in 1/255 steps; the key for ExtGState dedup.
type AlphaKey = u8;

fn alpha_key(alpha: f32) -> AlphaKey {
    (alpha.clamp(0.0, 1.0) * 255.0).round() as AlphaKey
}

/// Encode a composed page to PDF bytes. Infallible and deterministic:
/// the same page always serializes to the same bytes.
pub fn encode(page: &ComposedPage) -> Vec<u8> {
    let layout = page.layout();
    let figure = page.figure();

    let page_w = mm_to_pt(layout.page.0);
    let page_h = mm_to_pt(layout.page.1);

    // y-down millimeters to y-up PDF points.
    let to_pdf_rect = |r: &MmRect| {
        Rect::new(
            mm_to_pt(r.x),
            page_h - mm_to_pt(r.y + r.h),
            mm_to_pt(r.x + r.w),
            page_h - mm_to_pt(r.y),
        )
    };

    // Every alpha used by the content stream, opaque included, gets one
    // graphics state entry.
    let mut alphas: BTreeSet<AlphaKey> = BTreeSet::new();
    alphas.insert(alpha_key(1.0));
    for item in figure.items() {
        match item {
            DisplayItem::Fill { opacity, .. } | DisplayItem::Stroke { opacity, .. } => {
                alphas.insert(alpha_key(opacity.get()));
            }
            DisplayItem::Fade { .. } => {
                for i in 0..FADE_STRIPS {
                    alphas.insert(alpha_key(1.0 - (i as f32 + 0.5) / FADE_STRIPS as f32));
                }
            }
        }
    }

    let mut alloc = Ref::new(1);
    let catalog_ref = alloc.bump();
    let page_tree_ref = alloc.bump();
    let page_ref = alloc.bump();
    let content_ref = alloc.bump();
    let info_ref = alloc.bump();
    let gs_entries: Vec<(AlphaKey, String, Ref)> = alphas
        .iter()
        .map(|&key| (key, format!("G{key}"), alloc.bump()))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_ref).pages(page_tree_ref);
    pdf.pages(page_tree_ref).kids([page_ref]).count(1);

    {
        let mut obj = pdf.page(page_ref);
        obj.parent(page_tree_ref);
        obj.media_box(Rect::new(0.0, 0.0, page_w, page_h));
        obj.trim_box(to_pdf_rect(&layout.trim));
        if let Some(bleed) = &layout.bleed {
            obj.bleed_box(to_pdf_rect(bleed));
        }
        obj.art_box(to_pdf_rect(&layout.artwork));
        obj.contents(content_ref);

        let mut resources = obj.resources();
        let mut states = resources.ext_g_states();
        for (_, name, gs_ref) in &gs_entries {
            states.pair(Name(name.as_bytes()), *gs_ref);
        }
        states.finish();
        resources.finish();
    }

    for (key, _, gs_ref) in &gs_entries {
        let alpha = *key as f32 / 255.0;
        pdf.ext_graphics(*gs_ref)
            .non_stroking_alpha(alpha)
            .stroking_alpha(alpha);
    }

    let content = content_stream(page, page_h, &gs_entries);
    pdf.stream(content_ref, &content.finish());

    let title = format!("{} {} poster", page.spec().paper, page.spec().orientation);
    pdf.document_info(info_ref)
        .title(TextStr(&title))
        .producer(TextStr(concat!("plakat ", env!("CARGO_PKG_VERSION"))));

    pdf.finish()
}

fn content_stream(
    page: &ComposedPage,
    page_h: f32,
    gs_entries: &[(AlphaKey, String, Ref)],
) -> Content {
    let layout = page.layout();
    let figure = page.figure();
    let art = &layout.artwork;

    let gs_name = |alpha: f32| -> &str {
        let key = alpha_key(alpha);
        &gs_entries
            .iter()
            .find(|(k, ..)| *k == key)
            .expect("alpha registered upfront")
            .1
    };

    let mut content = Content::new();
    content.save_state();

    // Clip everything the figure paints to the artwork box.
    let art_x = mm_to_pt(art.x);
    let art_y = page_h - mm_to_pt(art.y + art.h);
    let art_w = mm_to_pt(art.w);
    let art_h = mm_to_pt(art.h);
    content.rect(art_x, art_y, art_w, art_h);
    content.clip_nonzero();
    content.end_path();

    // Map figure coordinates (y down) into the artwork box (y up).
    let sx = art_w / figure.width();
    let sy = art_h / figure.height();
    content.transform([sx, 0.0, 0.0, -sy, art_x, art_y + art_h]);
    content.set_line_cap(LineCapStyle::RoundCap);

    let bg = figure.background().to_pdf_color();
    content.set_parameters(Name(gs_name(1.0).as_bytes()));
    content.set_fill_rgb(bg[0], bg[1], bg[2]);
    content.rect(0.0, 0.0, figure.width(), figure.height());
    content.fill_nonzero();

    for item in figure.items() {
        match item {
            DisplayItem::Fill { path, color, opacity, rule } => {
                let [r, g, b] = color.to_pdf_color();
                content.set_parameters(Name(gs_name(opacity.get()).as_bytes()));
                content.set_fill_rgb(r, g, b);
                emit_path(path, &mut ContentSink(&mut content));
                match rule {
                    FillRule::NonZero => content.fill_nonzero(),
                    FillRule::EvenOdd => content.fill_even_odd(),
                };
            }
            DisplayItem::Stroke { path, color, width, opacity } => {
                let [r, g, b] = color.to_pdf_color();
                content.set_parameters(Name(gs_name(opacity.get()).as_bytes()));
                content.set_stroke_rgb(r, g, b);
                content.set_line_width(*width);
                emit_path(path, &mut ContentSink(&mut content));
                content.stroke();
            }
            DisplayItem::Fade { rect, color, edge } => {
                let [r, g, b] = color.to_pdf_color();
                content.set_fill_rgb(r, g, b);

                let strip_h = rect.height() / FADE_STRIPS as f32;
                for i in 0..FADE_STRIPS {
                    let from_top = (i as f32 + 0.5) / FADE_STRIPS as f32;
                    let alpha = match edge {
                        FadeEdge::Top => 1.0 - from_top,
                        FadeEdge::Bottom => from_top,
                    };
                    content.set_parameters(Name(gs_name(alpha).as_bytes()));
                    content.rect(
                        rect.x(),
                        rect.top() + i as f32 * strip_h,
                        rect.width(),
                        strip_h,
                    );
                    content.fill_nonzero();
                }
            }
        }
    }

    content.restore_state();

    // Crop marks live outside the clipped artwork, in page space.
    if !layout.crop_marks.is_empty() {
        content.save_state();
        content.set_stroke_rgb(0.0, 0.0, 0.0);
        content.set_line_width(0.5);
        content.set_line_cap(LineCapStyle::ButtCap);
        for mark in &layout.crop_marks {
            content.move_to(mm_to_pt(mark.x1), page_h - mm_to_pt(mark.y1));
            content.line_to(mm_to_pt(mark.x2), page_h - mm_to_pt(mark.y2));
            content.stroke();
        }
        content.restore_state();
    }

    content
}

/// `PathSink` over a PDF content stream.
struct ContentSink<'a>(&'a mut Content);

impl PathSink for ContentSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.line_to(x, y);
    }

    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.0.close_path();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coordinates, GeoLayers};
    use crate::page::{compose, Orientation, PageSpec, PaperSize};
    use crate::render::{render, RenderRequest};
    use crate::theme::Theme;

    fn composed(print_ready: bool) -> ComposedPage {
        let theme: Theme = serde_json::from_str(
            r##"{
                "name": "t",
                "bg": "#112233",
                "text": "#EEEEEE",
                "gradient_color": "#112233",
                "water": "#203050",
                "parks": "#203020",
                "road_motorway": "#F0F0F0",
                "road_primary": "#D0D0D0",
                "road_secondary": "#B0B0B0",
                "road_tertiary": "#909090",
                "road_residential": "#707070",
                "road_default": "#505050"
            }"##,
        )
        .unwrap();
        let request = RenderRequest {
            city: "T".into(),
            country: None,
            theme: "t".into(),
            radius_m: 1000.0,
            dpi: 300,
        };
        let spec = PageSpec {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            print_ready,
        };
        let figure = render(
            &GeoLayers::default(),
            &theme,
            &request,
            Coordinates { lat: 0.0, lon: 0.0 },
            spec.aspect_ratio(),
        );
        compose(figure, &spec)
    }

    #[test]
    fn output_is_a_pdf() {
        let bytes = encode(&composed(false));
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(encode(&composed(true)), encode(&composed(true)));
    }

    #[test]
    fn print_ready_records_geometry_boxes() {
        let bytes = encode(&composed(true));
        for marker in [&b"/TrimBox"[..], &b"/BleedBox"[..], &b"/ArtBox"[..]] {
            assert!(
                bytes.windows(marker.len()).any(|w| w == marker),
                "missing {}",
                String::from_utf8_lossy(marker)
            );
        }
    }

    #[test]
    fn home_variant_has_no_bleed_box() {
        let bytes = encode(&composed(false));
        assert!(!bytes.windows(9).any(|w| w == b"/BleedBox"));
    }
}
