//! RGB colors.
//!
//! Themes specify all of their color roles as `#RRGGBB` records, which are
//! parsed into [`Color`] values at load time. The renderer and all export
//! backends work on the parsed form; hex strings never travel past the
//! theme store.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An RGB color.
#[derive(Debug, Hash, Eq, PartialEq, Clone, Copy)]
pub struct Color(pub(crate) u8, pub(crate) u8, pub(crate) u8);

impl Color {
    /// Create a new RGB color.
    pub fn new(red: u8, green: u8, blue: u8) -> Color {
        Color(red, green, blue)
    }

    /// Create a black RGB color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Create a white RGB color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// The red component.
    pub fn red(&self) -> u8 {
        self.0
    }

    /// The green component.
    pub fn green(&self) -> u8 {
        self.1
    }

    /// The blue component.
    pub fn blue(&self) -> u8 {
        self.2
    }

    /// Parse a `#RRGGBB` hex record.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }

        let component = |range| u8::from_str_radix(&digits[range], 16).ok();
        Some(Color(
            component(0..2)?,
            component(2..4)?,
            component(4..6)?,
        ))
    }

    /// Format as a `#RRGGBB` hex record.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    pub(crate) fn to_pdf_color(self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }

    pub(crate) fn to_tiny_skia(self, alpha: f32) -> tiny_skia::Color {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        tiny_skia::Color::from_rgba8(self.0, self.1, self.2, a)
    }

    /// Composite `self` at `alpha` over an opaque backdrop.
    pub(crate) fn over(self, backdrop: Color, alpha: f32) -> Color {
        let a = alpha.clamp(0.0, 1.0);
        let blend = |src: u8, dst: u8| (src as f32 * a + dst as f32 * (1.0 - a)).round() as u8;
        Color(
            blend(self.0, backdrop.0),
            blend(self.1, backdrop.1),
            blend(self.2, backdrop.2),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::black()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s).ok_or_else(|| format!("invalid color `{s}`, expected `#RRGGBB`"))
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a `#RRGGBB` color")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Color, E> {
                Color::from_hex(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let color = Color::from_hex("#1A2B3C").unwrap();
        assert_eq!(color, Color::new(0x1A, 0x2B, 0x3C));
        assert_eq!(color.to_hex(), "#1A2B3C");
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(Color::from_hex("1A2B3C").is_none());
        assert!(Color::from_hex("#1A2B").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());
        assert!(Color::from_hex("#1A2B3C4D").is_none());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let color: Color = serde_json::from_str("\"#C0FFEE\"").unwrap();
        assert_eq!(color, Color::new(0xC0, 0xFF, 0xEE));
        assert_eq!(serde_json::to_string(&color).unwrap(), "\"#C0FFEE\"");
        assert!(serde_json::from_str::<Color>("\"papayawhip\"").is_err());
    }

    #[test]
    fn compositing() {
        let white = Color::white();
        assert_eq!(Color::black().over(white, 0.0), white);
        assert_eq!(Color::black().over(white, 1.0), Color::black());
        assert_eq!(Color::black().over(white, 0.5), Color::new(128, 128, 128));
    }
}
