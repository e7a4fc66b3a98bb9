//! The poster pipeline.
//!
//! One request runs strictly in sequence: validate, load the theme (before
//! any network traffic), geocode, fetch geometry, render, write. Failures
//! propagate immediately; nothing is retried and nothing partial lands on
//! disk.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::export::{Artifact, Exporter, OutputFormat};
use crate::geo::{Coordinates, GeoProvider};
use crate::page::{compose, PageSpec};
use crate::render::{render, Figure, RenderRequest, DEFAULT_ASPECT};
use crate::theme::ThemeStore;

/// Render a figure for a request, at an explicit aspect ratio.
///
/// The theme is loaded and validated first so a bad theme identifier
/// fails before any network call is made. Returns the figure together
/// with the resolved center coordinates (they feed the caption and, for
/// callers, the artifact metadata).
pub fn render_figure<P: GeoProvider>(
    provider: &P,
    store: &ThemeStore,
    request: &RenderRequest,
    aspect: f32,
) -> Result<(Figure, Coordinates)> {
    request.validate()?;
    let theme = store.load(&request.theme)?;

    info!(city = %request.city, theme = %theme.name, "creating poster");

    let center = provider.geocode(&request.city, request.country.as_deref())?;
    info!(lat = center.lat, lon = center.lon, "coordinates resolved");

    let layers = provider.layers(center, request.radius_m)?;
    info!(
        roads = layers.roads.len(),
        water = layers.water.len() + layers.waterways.len(),
        parks = layers.parks.len(),
        "geometry fetched"
    );

    Ok((render(&layers, &theme, request, center, aspect), center))
}

/// Create a PNG poster: the full fetch → render → write pipeline.
pub fn create_poster<P: GeoProvider>(
    provider: &P,
    store: &ThemeStore,
    request: &RenderRequest,
    output_dir: impl AsRef<Path>,
) -> Result<Artifact> {
    let (figure, _) = render_figure(provider, store, request, DEFAULT_ASPECT)?;
    Exporter::new(output_dir.as_ref()).write_poster(&figure, request.dpi, &request.city, &request.theme)
}

/// Create a page-formatted poster (PDF or EPS) in one go.
///
/// The figure is rendered at the page's aspect ratio so the artwork
/// covers the full artwork box, bleed included.
pub fn create_page_poster<P: GeoProvider>(
    provider: &P,
    store: &ThemeStore,
    request: &RenderRequest,
    spec: &PageSpec,
    format: OutputFormat,
    output_dir: impl AsRef<Path>,
) -> Result<Artifact> {
    let (figure, _) = render_figure(provider, store, request, spec.aspect_ratio())?;
    export_page(figure, &request.city, &request.theme, spec, format, output_dir)
}

/// Export an already-rendered figure as a composed page.
pub fn export_page(
    figure: Figure,
    city: &str,
    theme: &str,
    spec: &PageSpec,
    format: OutputFormat,
    output_dir: impl AsRef<Path>,
) -> Result<Artifact> {
    let page = compose(figure, spec);
    Exporter::new(output_dir.as_ref()).write_page(&page, format, city, theme)
}
