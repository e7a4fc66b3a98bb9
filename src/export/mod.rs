//! Serializing figures and composed pages to files.
//!
//! The exporter owns the output directory, the filename scheme and the
//! write discipline: every artifact is encoded in memory, written to a
//! temporary file in the target directory and renamed into place, so a
//! failed export never leaves a truncated file behind.

mod eps;
mod pdf;
mod png;

pub use png::encode as encode_png;

use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Utc;
use tracing::info;

use crate::error::{Error, Result};
use crate::geom::Path;
use crate::page::ComposedPage;
use crate::render::Figure;

/// A supported output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Raster PNG, sized by the request DPI.
    Png,
    /// Vector PDF with page geometry boxes.
    Pdf,
    /// Vector Encapsulated PostScript.
    Eps,
}

impl OutputFormat {
    /// The file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Eps => "eps",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Pdf => "PDF",
            OutputFormat::Eps => "EPS",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            "eps" => Ok(OutputFormat::Eps),
            _ => Err(format!("unknown format `{s}`, expected png, pdf or eps")),
        }
    }
}

/// The dimensions an artifact was produced at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimensions {
    /// Raster output.
    Pixels {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Vector output.
    Millimeters {
        /// Page width in mm.
        width: f32,
        /// Page height in mm.
        height: f32,
    },
}

/// A written output file. Ownership of the file transfers to the caller.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Where the file landed.
    pub path: PathBuf,
    /// The format it was written in.
    pub format: OutputFormat,
    /// The physical dimensions used.
    pub dimensions: Dimensions,
}

/// Writes artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    /// Create an exporter for `output_dir`. The directory is created on
    /// the first write.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write a figure as a timestamped PNG poster.
    pub fn write_poster(
        &self,
        figure: &Figure,
        dpi: u32,
        city: &str,
        theme: &str,
    ) -> Result<Artifact> {
        let (bytes, width, height) = png::encode(figure, dpi)?;
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{theme}_{timestamp}.png", slug(city));
        let path = self.commit(&filename, &bytes)?;

        info!(path = %path.display(), width, height, "poster written");

        Ok(Artifact {
            path,
            format: OutputFormat::Png,
            dimensions: Dimensions::Pixels { width, height },
        })
    }

    /// Write a composed page as PDF or EPS.
    ///
    /// The raster-only [`OutputFormat::Png`] is rejected here; DPI plays
    /// no role on this surface.
    pub fn write_page(
        &self,
        page: &ComposedPage,
        format: OutputFormat,
        city: &str,
        theme: &str,
    ) -> Result<Artifact> {
        let bytes = match format {
            OutputFormat::Pdf => pdf::encode(page),
            OutputFormat::Eps => eps::encode(page),
            OutputFormat::Png => return Err(Error::UnsupportedFormat { format }),
        };

        let spec = page.spec();
        let suffix = if spec.print_ready { "_printready" } else { "" };
        let filename = format!(
            "{}_{theme}_{}_{}{suffix}.{}",
            slug(city),
            spec.paper,
            spec.orientation,
            format.extension(),
        );
        let path = self.commit(&filename, &bytes)?;

        let (width, height) = page.layout().page;
        info!(path = %path.display(), width, height, "page written");

        Ok(Artifact {
            path,
            format,
            dimensions: Dimensions::Millimeters { width, height },
        })
    }

    /// Temp-file-then-rename write into the output directory.
    fn commit(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|err| Error::write(&self.output_dir, err))?;

        let path = self.output_dir.join(filename);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.output_dir)
            .map_err(|err| Error::write(&path, err))?;
        tmp.write_all(bytes).map_err(|err| Error::write(&path, err))?;
        tmp.persist(&path)
            .map_err(|err| Error::write(&path, err.error))?;

        Ok(path)
    }
}

/// Filename form of a city name: spaces become underscores, case stays.
fn slug(city: &str) -> String {
    city.trim().replace(char::is_whitespace, "_")
}

/// A receiver for path segments, implemented by the vector backends.
pub(crate) trait PathSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    fn close(&mut self);
}

/// Replay a path into a sink, lowering quadratic segments to cubics
/// (neither PDF nor PostScript has a quadratic operator).
pub(crate) fn emit_path(path: &Path, sink: &mut impl PathSink) {
    use tiny_skia_path::PathSegment;

    let mut current = (0.0f32, 0.0f32);
    let mut start = (0.0f32, 0.0f32);

    for segment in path.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                sink.move_to(p.x, p.y);
                current = (p.x, p.y);
                start = current;
            }
            PathSegment::LineTo(p) => {
                sink.line_to(p.x, p.y);
                current = (p.x, p.y);
            }
            PathSegment::QuadTo(q, p) => {
                let c1 = (
                    current.0 + 2.0 / 3.0 * (q.x - current.0),
                    current.1 + 2.0 / 3.0 * (q.y - current.1),
                );
                let c2 = (
                    p.x + 2.0 / 3.0 * (q.x - p.x),
                    p.y + 2.0 / 3.0 * (q.y - p.y),
                );
                sink.cubic_to(c1.0, c1.1, c2.0, c2.1, p.x, p.y);
                current = (p.x, p.y);
            }
            PathSegment::CubicTo(p1, p2, p) => {
                sink.cubic_to(p1.x, p1.y, p2.x, p2.y, p.x, p.y);
                current = (p.x, p.y);
            }
            PathSegment::Close => {
                sink.close();
                current = start;
            }
        }
    }
}

/// Number of constant-alpha strips a fade is decomposed into by the
/// vector backends.
pub(crate) const FADE_STRIPS: usize = 24;
