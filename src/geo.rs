//! Geometry layers and the data provider seam.
//!
//! The renderer consumes three collections of vector geometry: road
//! polylines tagged with a [`RoadClass`], water geometry, and park
//! polygons. Where they come from is hidden behind [`GeoProvider`]; the
//! production implementation lives in [`crate::osm`], tests substitute
//! fixtures.

use crate::error::Result;
use crate::theme::RoadClass;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl Coordinates {
    /// The poster caption form, e.g. `50.11°N / 8.68°E`.
    pub fn caption(&self) -> String {
        format!(
            "{:.2}°{} / {:.2}°{}",
            self.lat.abs(),
            if self.lat >= 0.0 { 'N' } else { 'S' },
            self.lon.abs(),
            if self.lon >= 0.0 { 'E' } else { 'W' },
        )
    }
}

/// An open sequence of (lon, lat) vertices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    /// The vertices in draw order.
    pub points: Vec<(f64, f64)>,
}

/// One street segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    /// The segment's hierarchy level.
    pub class: RoadClass,
    /// The segment's geometry.
    pub line: Polyline,
}

/// A filled region: an outer ring with optional holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Area {
    /// The outer ring, (lon, lat) vertices.
    pub outer: Vec<(f64, f64)>,
    /// Inner rings punched out of the outer ring.
    pub holes: Vec<Vec<(f64, f64)>>,
}

/// Everything the renderer needs for one poster, fetched per request and
/// dropped once the figure is produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLayers {
    /// Water polygons (lakes, basins, closed riverbanks).
    pub water: Vec<Area>,
    /// Open waterways (rivers, canals) drawn as strokes.
    pub waterways: Vec<Polyline>,
    /// Park polygons.
    pub parks: Vec<Area>,
    /// Street segments.
    pub roads: Vec<RoadSegment>,
}

impl GeoLayers {
    /// True if no layer carries any geometry.
    pub fn is_empty(&self) -> bool {
        self.water.is_empty()
            && self.waterways.is_empty()
            && self.parks.is_empty()
            && self.roads.is_empty()
    }
}

/// Resolves place names and fetches vector geometry.
///
/// Calls may block on the network; implementations should impose their own
/// timeouts since both methods sit on the user-facing request path.
pub trait GeoProvider {
    /// Resolve a city (and optional country) to coordinates.
    ///
    /// Fails with [`crate::Error::GeocodeNotFound`] when the query
    /// matches nothing.
    fn geocode(&self, city: &str, country: Option<&str>) -> Result<Coordinates>;

    /// Fetch all geometry layers within `radius_m` meters of `center`.
    ///
    /// An empty region is not an error; sparse [`GeoLayers`] render fine.
    fn layers(&self, center: Coordinates, radius_m: f64) -> Result<GeoLayers>;
}
