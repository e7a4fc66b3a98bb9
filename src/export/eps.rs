//! Vector backend: writes a composed page as Encapsulated PostScript.
//!
//! PostScript has no transparency model, so translucent items and fade
//! strips are composited against the figure's background color before
//! their `setrgbcolor` is emitted. Everything else mirrors the PDF
//! backend: one transform for the artwork, crop marks in page space.

use std::fmt::Write as _;

use crate::color::Color;
use crate::export::{emit_path, PathSink, FADE_STRIPS};
use crate::geom::mm_to_pt;
use crate::page::ComposedPage;
use crate::render::{DisplayItem, FadeEdge, FillRule};

/// Encode a composed page to EPS bytes. Deterministic: the same page
/// always serializes to the same bytes.
pub fn encode(page: &ComposedPage) -> Vec<u8> {
    let layout = page.layout();
    let figure = page.figure();

    let page_w = mm_to_pt(layout.page.0);
    let page_h = mm_to_pt(layout.page.1);

    let mut ps = String::new();
    let _ = writeln!(ps, "%!PS-Adobe-3.0 EPSF-3.0");
    let _ = writeln!(ps, "%%BoundingBox: 0 0 {} {}", page_w.ceil() as i32, page_h.ceil() as i32);
    let _ = writeln!(ps, "%%HiResBoundingBox: 0 0 {page_w:.3} {page_h:.3}");
    let _ = writeln!(ps, "%%Creator: plakat {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(ps, "%%Pages: 1");
    let _ = writeln!(ps, "%%EndComments");
    let _ = writeln!(ps, "%%Page: 1 1");

    let bg = figure.background();

    // Paper behind the artwork (only visible on print-ready margins).
    let _ = writeln!(ps, "gsave");
    set_color(&mut ps, Color::white());
    let _ = writeln!(ps, "0 0 {page_w:.3} {page_h:.3} rectfill");
    let _ = writeln!(ps, "grestore");

    let art = &layout.artwork;
    let art_x = mm_to_pt(art.x);
    let art_y = page_h - mm_to_pt(art.y + art.h);
    let art_w = mm_to_pt(art.w);
    let art_h = mm_to_pt(art.h);

    let _ = writeln!(ps, "gsave");
    let _ = writeln!(ps, "{art_x:.3} {art_y:.3} {art_w:.3} {art_h:.3} rectclip");

    // Figure coordinates (y down) into the artwork box (y up).
    let sx = art_w / figure.width();
    let sy = art_h / figure.height();
    let _ = writeln!(
        ps,
        "[{sx:.6} 0 0 {:.6} {art_x:.3} {:.3}] concat",
        -sy,
        art_y + art_h
    );
    let _ = writeln!(ps, "1 setlinecap 1 setlinejoin");

    set_color(&mut ps, bg);
    let _ = writeln!(ps, "0 0 {:.3} {:.3} rectfill", figure.width(), figure.height());

    for item in figure.items() {
        match item {
            DisplayItem::Fill { path, color, opacity, rule } => {
                set_color(&mut ps, color.over(bg, opacity.get()));
                emit_path(path, &mut PsSink::new(&mut ps));
                let _ = writeln!(
                    ps,
                    "{}",
                    match rule {
                        FillRule::NonZero => "fill",
                        FillRule::EvenOdd => "eofill",
                    }
                );
            }
            DisplayItem::Stroke { path, color, width, opacity } => {
                set_color(&mut ps, color.over(bg, opacity.get()));
                let _ = writeln!(ps, "{width:.3} setlinewidth");
                emit_path(path, &mut PsSink::new(&mut ps));
                let _ = writeln!(ps, "stroke");
            }
            DisplayItem::Fade { rect, color, edge } => {
                let strip_h = rect.height() / FADE_STRIPS as f32;
                for i in 0..FADE_STRIPS {
                    let from_top = (i as f32 + 0.5) / FADE_STRIPS as f32;
                    let alpha = match edge {
                        FadeEdge::Top => 1.0 - from_top,
                        FadeEdge::Bottom => from_top,
                    };
                    set_color(&mut ps, color.over(bg, alpha));
                    let _ = writeln!(
                        ps,
                        "{:.3} {:.3} {:.3} {:.3} rectfill",
                        rect.x(),
                        rect.top() + i as f32 * strip_h,
                        rect.width(),
                        strip_h
                    );
                }
            }
        }
    }

    let _ = writeln!(ps, "grestore");

    if !layout.crop_marks.is_empty() {
        let _ = writeln!(ps, "gsave");
        set_color(&mut ps, Color::black());
        let _ = writeln!(ps, "0.5 setlinewidth 0 setlinecap");
        for mark in &layout.crop_marks {
            let _ = writeln!(
                ps,
                "newpath {:.3} {:.3} moveto {:.3} {:.3} lineto stroke",
                mm_to_pt(mark.x1),
                page_h - mm_to_pt(mark.y1),
                mm_to_pt(mark.x2),
                page_h - mm_to_pt(mark.y2)
            );
        }
        let _ = writeln!(ps, "grestore");
    }

    let _ = writeln!(ps, "showpage");
    let _ = writeln!(ps, "%%EOF");

    ps.into_bytes()
}

fn set_color(ps: &mut String, color: Color) {
    let [r, g, b] = color.to_pdf_color();
    let _ = writeln!(ps, "{r:.4} {g:.4} {b:.4} setrgbcolor");
}

/// `PathSink` emitting PostScript path operators. `newpath` is written
/// once per path, not per subpath, so rings and glyph holes stay in one
/// path and fill correctly.
struct PsSink<'a> {
    ps: &'a mut String,
    started: bool,
}

impl<'a> PsSink<'a> {
    fn new(ps: &'a mut String) -> Self {
        Self { ps, started: false }
    }
}

impl PathSink for PsSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        if !self.started {
            let _ = writeln!(self.ps, "newpath");
            self.started = true;
        }
        let _ = writeln!(self.ps, "{x:.3} {y:.3} moveto");
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let _ = writeln!(self.ps, "{x:.3} {y:.3} lineto");
    }

    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let _ = writeln!(self.ps, "{x1:.3} {y1:.3} {x2:.3} {y2:.3} {x:.3} {y:.3} curveto");
    }

    fn close(&mut self) {
        let _ = writeln!(self.ps, "closepath");
    }
}
