//! OpenStreetMap-backed geometry provider.
//!
//! Geocoding goes through Nominatim, geometry through the Overpass API:
//! one search request and one query per poster, blocking, with an
//! agent-level timeout and no retries. Response decoding is split from
//! transport so the parsers can be exercised against fixtures.
//!
//! Multipolygon relations are not assembled; only ways are kept.
// TODO: assemble multipolygon relations so large riverbanks keep their holes.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{Area, Coordinates, GeoLayers, GeoProvider, Polyline, RoadSegment};
use crate::theme::RoadClass;

const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const OVERPASS_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";
const USER_AGENT: &str = concat!("plakat/", env!("CARGO_PKG_VERSION"));

/// A [`GeoProvider`] over the public OSM services.
pub struct OsmProvider {
    agent: ureq::Agent,
    nominatim: String,
    overpass: String,
}

impl Default for OsmProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OsmProvider {
    /// Create a provider against the public endpoints with a 60s timeout.
    pub fn new() -> Self {
        Self::with_endpoints(NOMINATIM_ENDPOINT, OVERPASS_ENDPOINT)
    }

    /// Create a provider against custom endpoints (mirrors, test servers).
    pub fn with_endpoints(nominatim: impl Into<String>, overpass: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(60))
            .user_agent(USER_AGENT)
            .build();

        Self {
            agent,
            nominatim: nominatim.into(),
            overpass: overpass.into(),
        }
    }
}

impl GeoProvider for OsmProvider {
    fn geocode(&self, city: &str, country: Option<&str>) -> Result<Coordinates> {
        let query = match country {
            Some(country) => format!("{city}, {country}"),
            None => city.to_string(),
        };

        let response = self
            .agent
            .get(&self.nominatim)
            .query("q", &query)
            .query("format", "json")
            .query("limit", "1")
            .call()
            .map_err(|err| Error::DataFetch(err.to_string()))?;

        let places: Vec<Place> = response
            .into_json()
            .map_err(|err| Error::DataFetch(err.to_string()))?;

        place_to_coordinates(places, &query)
    }

    fn layers(&self, center: Coordinates, radius_m: f64) -> Result<GeoLayers> {
        let query = overpass_query(center, radius_m);
        debug!(radius_m, "querying overpass");

        let response = self
            .agent
            .post(&self.overpass)
            .send_form(&[("data", query.as_str())])
            .map_err(|err| Error::DataFetch(err.to_string()))?;

        let decoded: OverpassResponse = response
            .into_json()
            .map_err(|err| Error::DataFetch(err.to_string()))?;

        Ok(layers_from_elements(decoded.elements))
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn place_to_coordinates(places: Vec<Place>, query: &str) -> Result<Coordinates> {
    let place = places.into_iter().next().ok_or_else(|| Error::GeocodeNotFound {
        query: query.to_string(),
    })?;

    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| Error::DataFetch(format!("geocoder returned malformed coordinate `{s}`")))
    };

    Ok(Coordinates {
        lat: parse(&place.lat)?,
        lon: parse(&place.lon)?,
    })
}

fn overpass_query(center: Coordinates, radius_m: f64) -> String {
    let around = format!("(around:{:.0},{:.6},{:.6})", radius_m, center.lat, center.lon);
    format!(
        "[out:json][timeout:60];\n(\n  \
         way[\"highway\"]{around};\n  \
         way[\"natural\"~\"^(water|bay)$\"]{around};\n  \
         way[\"waterway\"]{around};\n  \
         way[\"leisure\"=\"park\"]{around};\n  \
         way[\"landuse\"~\"^(grass|forest)$\"]{around};\n\
         );\nout tags geom;"
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Element {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    #[serde(default)]
    geometry: Vec<Vertex>,
}

#[derive(Debug, Deserialize)]
struct Vertex {
    lat: f64,
    lon: f64,
}

/// Sort fetched ways into the renderer's layers.
///
/// Water and park tags win over `highway` so a tagged towpath does not
/// double as a road. Closed water ways become polygons, open ones are kept
/// as stroked waterways; park ways are treated as implicitly closed.
pub(crate) fn layers_from_elements(elements: Vec<Element>) -> GeoLayers {
    let mut layers = GeoLayers::default();

    for element in elements {
        if element.kind != "way" || element.geometry.len() < 2 {
            continue;
        }

        let points: Vec<(f64, f64)> = element
            .geometry
            .iter()
            .map(|v| (v.lon, v.lat))
            .collect();
        let closed = points.len() > 3 && points.first() == points.last();

        let natural_water = element
            .tags
            .get("natural")
            .is_some_and(|v| v == "water" || v == "bay");
        let waterway = element.tags.contains_key("waterway");
        let park = element.tags.get("leisure").is_some_and(|v| v == "park")
            || element
                .tags
                .get("landuse")
                .is_some_and(|v| v == "grass" || v == "forest");

        if natural_water || waterway {
            if closed && points.len() >= 4 {
                layers.water.push(Area { outer: points, holes: Vec::new() });
            } else {
                layers.waterways.push(Polyline { points });
            }
        } else if park {
            if points.len() >= 3 {
                layers.parks.push(Area { outer: points, holes: Vec::new() });
            }
        } else if let Some(highway) = element.tags.get("highway") {
            layers.roads.push(RoadSegment {
                class: RoadClass::from_highway_tag(highway),
                line: Polyline { points },
            });
        }
    }

    layers
}
