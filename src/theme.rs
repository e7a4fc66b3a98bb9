//! Theme records and the theme store.
//!
//! A theme is a named set of color roles: background, text, gradient,
//! water, parks, and one color per road class. Themes live as JSON
//! records in a directory, one file per theme, and are parsed through a
//! validating, fail-closed parser: missing fields, unknown fields and
//! malformed colors are all rejected instead of silently defaulted.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{Error, Result};

/// A named set of colors governing a poster's look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Theme {
    /// Human-readable theme name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Background color of the whole poster.
    pub bg: Color,
    /// Color for the title, captions and the divider rule.
    pub text: Color,
    /// Color the edge fades blend towards.
    pub gradient_color: Color,
    /// Fill color for water polygons and waterways.
    pub water: Color,
    /// Fill color for park polygons.
    pub parks: Color,
    /// Stroke color for motorways.
    pub road_motorway: Color,
    /// Stroke color for primary roads (and trunks).
    pub road_primary: Color,
    /// Stroke color for secondary roads.
    pub road_secondary: Color,
    /// Stroke color for tertiary roads.
    pub road_tertiary: Color,
    /// Stroke color for residential and living streets.
    pub road_residential: Color,
    /// Stroke color for everything without a recognized class.
    pub road_default: Color,
}

impl Theme {
    /// The stroke color for a road class.
    pub fn road_color(&self, class: RoadClass) -> Color {
        match class {
            RoadClass::Motorway => self.road_motorway,
            RoadClass::Primary => self.road_primary,
            RoadClass::Secondary => self.road_secondary,
            RoadClass::Tertiary => self.road_tertiary,
            RoadClass::Residential => self.road_residential,
            RoadClass::Default => self.road_default,
        }
    }
}

/// A street segment's hierarchy level, driving its visual styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoadClass {
    /// Motorways and their links.
    Motorway,
    /// Trunk and primary roads and their links.
    Primary,
    /// Secondary roads and their links.
    Secondary,
    /// Tertiary roads and their links.
    Tertiary,
    /// Residential and living streets.
    Residential,
    /// Any unrecognized tag.
    Default,
}

impl RoadClass {
    /// Bottom-to-top drawing order: the most prominent classes end up on
    /// top of the stack.
    pub(crate) const DRAW_ORDER: [RoadClass; 6] = [
        RoadClass::Default,
        RoadClass::Residential,
        RoadClass::Tertiary,
        RoadClass::Secondary,
        RoadClass::Primary,
        RoadClass::Motorway,
    ];

    /// Classify an OSM `highway` tag value.
    ///
    /// Unrecognized tags fall back to [`RoadClass::Default`]; fetched data
    /// regularly carries classes this renderer has no dedicated style for
    /// (service roads, footways, ...) and they are styled rather than
    /// rejected.
    pub fn from_highway_tag(tag: &str) -> Self {
        match tag {
            "motorway" | "motorway_link" => RoadClass::Motorway,
            "trunk" | "trunk_link" | "primary" | "primary_link" => RoadClass::Primary,
            "secondary" | "secondary_link" => RoadClass::Secondary,
            "tertiary" | "tertiary_link" => RoadClass::Tertiary,
            "residential" | "living_street" => RoadClass::Residential,
            _ => RoadClass::Default,
        }
    }

    /// The stroke width for this class, in canvas points. Residential
    /// streets are the thinnest named class, motorways the thickest.
    pub fn stroke_width(self) -> f32 {
        match self {
            RoadClass::Motorway => 1.2,
            RoadClass::Primary => 1.0,
            RoadClass::Secondary => 0.8,
            RoadClass::Tertiary => 0.6,
            RoadClass::Residential => 0.4,
            RoadClass::Default => 0.3,
        }
    }
}

/// A directory of theme records.
///
/// The store only ever reads files; it holds no state besides the
/// directory path and is freely shared between requests.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    dir: PathBuf,
}

impl ThemeStore {
    /// Open a store over a theme directory.
    ///
    /// The directory is not touched until [`load`](Self::load) or
    /// [`list`](Self::list) is called.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load and validate the theme record for `id`.
    pub fn load(&self, id: &str) -> Result<Theme> {
        let path = self.dir.join(format!("{id}.json"));
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::ThemeNotFound(id.to_string()));
            }
            Err(err) => {
                return Err(Error::ThemeDir {
                    path,
                    source: err,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|err| Error::ThemeInvalid {
            name: id.to_string(),
            reason: err.to_string(),
        })
    }

    /// List every theme identifier known to the store, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|err| Error::ThemeDir {
            path: self.dir.clone(),
            source: err,
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Error::ThemeDir {
                path: self.dir.clone(),
                source: err,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}
