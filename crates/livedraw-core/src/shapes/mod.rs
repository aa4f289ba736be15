//! Shape definitions for live drawings.
//!
//! All spatial fields are stored in normalized space: the unit square
//! `[0, 1] x [0, 1]`, independent of any viewer's pixel resolution.

mod circle;

pub use circle::Circle;

use kurbo::Ellipse;
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a color string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}, expected #rgb, #rrggbb or #rrggbbaa")]
pub struct ColorParseError(pub String);

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    /// Parse a CSS-style hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
    ///
    /// The leading `#` is optional, since form submissions sometimes lose it.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(err());
        }

        let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

        let color = match hex.len() {
            3 => Self::new(
                nibble(0).map_err(|_| err())?,
                nibble(1).map_err(|_| err())?,
                nibble(2).map_err(|_| err())?,
                255,
            ),
            6 | 8 => Self::new(
                byte(0).map_err(|_| err())?,
                byte(2).map_err(|_| err())?,
                byte(4).map_err(|_| err())?,
                if hex.len() == 8 { byte(6).map_err(|_| err())? } else { 255 },
            ),
            _ => return Err(err()),
        };
        Ok(color)
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for SerializableColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for SerializableColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Enum wrapper for all shape types (for serialization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Circle(Circle),
}

impl Shape {
    /// Geometry in pixel space for a `width` x `height` target.
    ///
    /// x is scaled by the width and y by the height, so a non-square
    /// target stretches circles into ellipses.
    pub fn to_pixels(&self, width: u32, height: u32) -> Ellipse {
        match self {
            Shape::Circle(s) => s.to_pixels(width as f64, height as f64),
        }
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Shape::Circle(circle)
    }
}
