//! Color specification and normalization.
//!
//! Project documents may spell a color as an `[r, g, b]` array, a `#rrggbb`
//! hex string, or one of a few names. All of them are resolved once, at
//! load time, into a canonical [`Rgb`]. Unrecognized forms are rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A color as written in a project document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    /// `[r, g, b]` with 8-bit channels.
    Triple([u8; 3]),
    /// `#rrggbb` or a named color.
    Text(String),
}

/// Canonical 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Named colors understood by [`Rgb::parse`].
const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("white", Rgb::WHITE),
    ("black", Rgb::BLACK),
    ("red", Rgb::new(255, 0, 0)),
    ("green", Rgb::new(0, 128, 0)),
    ("blue", Rgb::new(0, 0, 255)),
    ("yellow", Rgb::new(255, 255, 0)),
    ("gray", Rgb::new(128, 128, 128)),
];

/// A color value that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized color {value:?}: expected [r, g, b], #rrggbb, or one of white, black, red, green, blue, yellow, gray")]
pub struct ColorError {
    pub value: String,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalize a document color into canonical RGB.
    pub fn parse(spec: &ColorSpec) -> Result<Rgb, ColorError> {
        match spec {
            ColorSpec::Triple([r, g, b]) => Ok(Rgb::new(*r, *g, *b)),
            ColorSpec::Text(text) => Self::parse_str(text),
        }
    }

    /// Parse `#rrggbb` or a named color (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn parse_str(text: &str) -> Result<Rgb, ColorError> {
        let trimmed = text.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
                if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                    return Ok(Rgb::new(r, g, b));
                }
            }
        } else {
            let lower = trimmed.to_ascii_lowercase();
            if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
                return Ok(*rgb);
            }
        }
        Err(ColorError {
            value: text.to_string(),
        })
    }

    /// `0xRRGGBB`, the form ffmpeg filters accept.
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<&ColorSpec> for Rgb {
    type Error = ColorError;

    fn try_from(spec: &ColorSpec) -> Result<Self, Self::Error> {
        Rgb::parse(spec)
    }
}
