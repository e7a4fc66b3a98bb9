//! Page composition for print export.
//!
//! A [`PageSpec`] picks a physical paper size, an orientation and one of
//! two variants. The Home variant scales the artwork to exactly fill the
//! trim size. The Print-Ready variant surrounds the trim box with a 3mm
//! bleed the artwork has to cover, and places corner crop marks outside
//! the bleed so they never touch the artwork. All layout happens in
//! millimeters with the origin at the page's top-left corner; the
//! composer never touches color, only geometry and placement.

use std::fmt;
use std::str::FromStr;

use crate::render::Figure;

/// Bleed added around the trim box of print-ready pages, in mm.
pub const BLEED_MM: f32 = 3.0;
/// Length of each crop-mark hairline, in mm.
pub const CROP_MARK_LEN_MM: f32 = 5.0;
/// Gap between the trim edge and the start of a crop mark, in mm.
pub const CROP_MARK_OFFSET_MM: f32 = 3.0;

/// Page margin around the trim box of print-ready pages. Wide enough for
/// the bleed and the full extent of the crop marks.
const PAGE_MARGIN_MM: f32 = BLEED_MM + CROP_MARK_OFFSET_MM + CROP_MARK_LEN_MM;

/// A physical paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperSize {
    /// ISO A3, 297×420mm.
    A3,
    /// ISO A4, 210×297mm.
    A4,
    /// ISO A5, 148×210mm.
    A5,
}

impl PaperSize {
    /// Portrait (width, height) in millimeters.
    pub fn portrait_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
            PaperSize::A5 => "A5",
        })
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a3" => Ok(PaperSize::A3),
            "a4" => Ok(PaperSize::A4),
            "a5" => Ok(PaperSize::A5),
            _ => Err(format!("unknown paper size `{s}`, expected A3, A4 or A5")),
        }
    }
}

/// How the paper is turned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Taller than wide.
    Portrait,
    /// Wider than tall.
    Landscape,
    /// Both dimensions clamped to the paper's short edge.
    Square,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
            Orientation::Square => "square",
        })
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            "square" => Ok(Orientation::Square),
            _ => Err(format!(
                "unknown orientation `{s}`, expected portrait, landscape or square"
            )),
        }
    }
}

/// A page-formatted export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    /// The paper size.
    pub paper: PaperSize,
    /// The orientation.
    pub orientation: Orientation,
    /// Print-Ready (bleed and crop marks) instead of Home.
    pub print_ready: bool,
}

impl PageSpec {
    /// The trim size in millimeters: the paper table with orientation
    /// applied, square taking the short edge for both dimensions.
    pub fn trim_mm(&self) -> (f32, f32) {
        let (w, h) = self.paper.portrait_mm();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
            Orientation::Square => {
                let edge = w.min(h);
                (edge, edge)
            }
        }
    }

    /// The width/height ratio the artwork must be rendered at so it
    /// covers the full artwork box (including bleed for Print-Ready)
    /// without distortion.
    pub fn aspect_ratio(&self) -> f32 {
        let (w, h) = self.artwork_mm();
        w / h
    }

    fn artwork_mm(&self) -> (f32, f32) {
        let (w, h) = self.trim_mm();
        if self.print_ready {
            (w + 2.0 * BLEED_MM, h + 2.0 * BLEED_MM)
        } else {
            (w, h)
        }
    }
}

/// An axis-aligned rectangle in page millimeters, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl MmRect {
    fn inflate(&self, d: f32) -> MmRect {
        MmRect {
            x: self.x - d,
            y: self.y - d,
            w: self.w + 2.0 * d,
            h: self.h + 2.0 * d,
        }
    }

    /// True if the open interior of `self` contains (x, y).
    pub fn contains_inside(&self, x: f32, y: f32) -> bool {
        x > self.x && x < self.x + self.w && y > self.y && y < self.y + self.h
    }
}

/// A straight hairline in page millimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmLine {
    /// Start x.
    pub x1: f32,
    /// Start y.
    pub y1: f32,
    /// End x.
    pub x2: f32,
    /// End y.
    pub y2: f32,
}

impl MmLine {
    /// The line's length in mm.
    pub fn len(&self) -> f32 {
        ((self.x2 - self.x1).powi(2) + (self.y2 - self.y1).powi(2)).sqrt()
    }
}

/// The resolved geometry of a composed page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Physical page (media box) size in mm.
    pub page: (f32, f32),
    /// Position of the trim box on the page.
    pub trim: MmRect,
    /// The bleed box; `None` for the Home variant.
    pub bleed: Option<MmRect>,
    /// Where the artwork is placed; the figure is scaled to exactly fill
    /// this rectangle.
    pub artwork: MmRect,
    /// Crop-mark hairlines, empty for the Home variant.
    pub crop_marks: Vec<MmLine>,
}

/// A figure placed onto a resolved page, ready for a vector backend.
#[derive(Debug, Clone)]
pub struct ComposedPage {
    figure: Figure,
    spec: PageSpec,
    layout: PageLayout,
}

impl ComposedPage {
    /// The composed figure.
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// The page spec this was composed for.
    pub fn spec(&self) -> &PageSpec {
        &self.spec
    }

    /// The resolved page geometry.
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }
}

/// Compose a rendered figure onto a page.
pub fn compose(figure: Figure, spec: &PageSpec) -> ComposedPage {
    let (trim_w, trim_h) = spec.trim_mm();

    let layout = if spec.print_ready {
        let m = PAGE_MARGIN_MM;
        let trim = MmRect { x: m, y: m, w: trim_w, h: trim_h };
        let bleed = trim.inflate(BLEED_MM);

        PageLayout {
            page: (trim_w + 2.0 * m, trim_h + 2.0 * m),
            crop_marks: crop_marks(&trim),
            artwork: bleed,
            bleed: Some(bleed),
            trim,
        }
    } else {
        let trim = MmRect { x: 0.0, y: 0.0, w: trim_w, h: trim_h };
        PageLayout {
            page: (trim_w, trim_h),
            crop_marks: Vec::new(),
            artwork: trim,
            bleed: None,
            trim,
        }
    };

    ComposedPage {
        figure,
        spec: *spec,
        layout,
    }
}

/// Two hairlines per corner, sitting on the extensions of the trim edges,
/// starting [`CROP_MARK_OFFSET_MM`] outside the trim and running
/// [`CROP_MARK_LEN_MM`] outwards.
fn crop_marks(trim: &MmRect) -> Vec<MmLine> {
    let (x0, y0) = (trim.x, trim.y);
    let (x1, y1) = (trim.x + trim.w, trim.y + trim.h);
    let near = CROP_MARK_OFFSET_MM;
    let far = CROP_MARK_OFFSET_MM + CROP_MARK_LEN_MM;

    vec![
        // Top-left corner.
        MmLine { x1: x0 - far, y1: y0, x2: x0 - near, y2: y0 },
        MmLine { x1: x0, y1: y0 - far, x2: x0, y2: y0 - near },
        // Top-right corner.
        MmLine { x1: x1 + near, y1: y0, x2: x1 + far, y2: y0 },
        MmLine { x1: x1, y1: y0 - far, x2: x1, y2: y0 - near },
        // Bottom-left corner.
        MmLine { x1: x0 - far, y1: y1, x2: x0 - near, y2: y1 },
        MmLine { x1: x0, y1: y1 + near, x2: x0, y2: y1 + far },
        // Bottom-right corner.
        MmLine { x1: x1 + near, y1: y1, x2: x1 + far, y2: y1 },
        MmLine { x1: x1, y1: y1 + near, x2: x1, y2: y1 + far },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::geo::{Coordinates, GeoLayers};
    use crate::render::{render, RenderRequest, DEFAULT_ASPECT};
    use crate::theme::Theme;
    use float_cmp::assert_approx_eq;

    fn figure() -> Figure {
        let theme: Theme = serde_json::from_str(
            r##"{
                "name": "flat",
                "bg": "#101010",
                "text": "#EEEEEE",
                "gradient_color": "#101010",
                "water": "#202040",
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
            city: "X".into(),
            country: None,
            theme: "flat".into(),
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

    fn spec(paper: PaperSize, orientation: Orientation, print_ready: bool) -> PageSpec {
        PageSpec { paper, orientation, print_ready }
    }

    #[test]
    fn paper_table() {
        let cases = [
            (PaperSize::A3, Orientation::Portrait, (297.0, 420.0)),
            (PaperSize::A3, Orientation::Landscape, (420.0, 297.0)),
            (PaperSize::A3, Orientation::Square, (297.0, 297.0)),
            (PaperSize::A4, Orientation::Portrait, (210.0, 297.0)),
            (PaperSize::A4, Orientation::Landscape, (297.0, 210.0)),
            (PaperSize::A4, Orientation::Square, (210.0, 210.0)),
            (PaperSize::A5, Orientation::Portrait, (148.0, 210.0)),
            (PaperSize::A5, Orientation::Landscape, (210.0, 148.0)),
            (PaperSize::A5, Orientation::Square, (148.0, 148.0)),
        ];

        for (paper, orientation, expected) in cases {
            assert_eq!(
                spec(paper, orientation, false).trim_mm(),
                expected,
                "{paper} {orientation}"
            );
        }
    }

    #[test]
    fn home_variant_is_bare_trim() {
        let page = compose(figure(), &spec(PaperSize::A4, Orientation::Portrait, false));
        let layout = page.layout();

        assert_eq!(layout.page, (210.0, 297.0));
        assert_eq!(layout.trim, layout.artwork);
        assert_eq!(layout.bleed, None);
        assert!(layout.crop_marks.is_empty());
    }

    #[test]
    fn print_ready_adds_exact_bleed() {
        let home = compose(figure(), &spec(PaperSize::A4, Orientation::Landscape, false));
        let print = compose(figure(), &spec(PaperSize::A4, Orientation::Landscape, true));

        // Trim dimensions never change between the variants.
        assert_eq!(
            (home.layout().trim.w, home.layout().trim.h),
            (print.layout().trim.w, print.layout().trim.h)
        );
        assert_eq!((print.layout().trim.w, print.layout().trim.h), (297.0, 210.0));

        let bleed = print.layout().bleed.unwrap();
        assert_approx_eq!(f32, bleed.w, 303.0);
        assert_approx_eq!(f32, bleed.h, 216.0);
        assert_approx_eq!(f32, print.layout().trim.x - bleed.x, BLEED_MM);
        assert_approx_eq!(f32, print.layout().trim.y - bleed.y, BLEED_MM);

        // The artwork has to cover the whole bleed box.
        assert_eq!(print.layout().artwork, bleed);
    }

    #[test]
    fn crop_marks_sit_outside_the_bleed() {
        let page = compose(figure(), &spec(PaperSize::A4, Orientation::Landscape, true));
        let layout = page.layout();
        let bleed = layout.bleed.unwrap();

        assert_eq!(layout.crop_marks.len(), 8);
        for mark in &layout.crop_marks {
            assert_approx_eq!(f32, mark.len(), CROP_MARK_LEN_MM);
            for (x, y) in [(mark.x1, mark.y1), (mark.x2, mark.y2)] {
                assert!(
                    !bleed.contains_inside(x, y),
                    "mark endpoint ({x}, {y}) inside bleed"
                );
                // And still on the page.
                assert!(x >= 0.0 && x <= layout.page.0);
                assert!(y >= 0.0 && y <= layout.page.1);
            }
        }

        // Each mark starts exactly at the offset distance from a trim edge.
        let trim = layout.trim;
        for mark in &layout.crop_marks {
            let d = if mark.y1 == mark.y2 {
                // Horizontal mark: gap to the nearest vertical trim edge.
                let near_x = if mark.x1 < trim.x { mark.x2 } else { mark.x1 };
                (near_x - trim.x).abs().min((near_x - (trim.x + trim.w)).abs())
            } else {
                let near_y = if mark.y1 < trim.y { mark.y2 } else { mark.y1 };
                (near_y - trim.y).abs().min((near_y - (trim.y + trim.h)).abs())
            };
            assert_approx_eq!(f32, d, CROP_MARK_OFFSET_MM);
        }
    }

    #[test]
    fn aspect_covers_bleed_for_print_ready() {
        let home = spec(PaperSize::A4, Orientation::Portrait, false);
        let print = spec(PaperSize::A4, Orientation::Portrait, true);

        assert_approx_eq!(f32, home.aspect_ratio(), 210.0 / 297.0);
        assert_approx_eq!(f32, print.aspect_ratio(), 216.0 / 303.0);
    }

    #[test]
    fn parsing_round_trips() {
        for s in ["A3", "A4", "A5"] {
            assert_eq!(s.parse::<PaperSize>().unwrap().to_string(), s);
        }
        for s in ["portrait", "landscape", "square"] {
            assert_eq!(s.parse::<Orientation>().unwrap().to_string(), s);
        }
        assert!("letter".parse::<PaperSize>().is_err());
        assert!("diagonal".parse::<Orientation>().is_err());
    }
}
