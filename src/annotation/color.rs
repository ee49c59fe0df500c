//! Element color values.
//!
//! Annotation elements carry their colors as CSS-like strings. The accepted
//! forms are:
//! - `#abc` - three digit RGB hex
//! - `#aabbcc` - six digit RRGGBB hex
//! - `rgb(255, 255, 255)` - decimal triplet
//! - `rgba(255, 255, 255, 0.5)` - decimal triplet plus alpha in 0-1

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGBA color with floating-point components in the range 0.0 to 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid color '{0}': expected #rgb, #rrggbb, rgb(r, g, b) or rgba(r, g, b, a)")]
pub struct ColorParseError(pub String);

/// A validated color string as stored on an element.
///
/// The original text is kept so that serialization round-trips exactly what
/// the user (or the viewport) supplied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorValue {
    text: String,
    rgba: Rgba,
}

impl ColorValue {
    pub fn parse(text: &str) -> Result<Self, ColorParseError> {
        let trimmed = text.trim();
        let rgba = parse_hex(trimmed)
            .or_else(|| parse_functional(trimmed))
            .ok_or_else(|| ColorParseError(text.to_string()))?;
        Ok(Self {
            text: trimmed.to_string(),
            rgba,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn rgba(&self) -> Rgba {
        self.rgba
    }
}

impl TryFrom<String> for ColorValue {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColorValue> for String {
    fn from(value: ColorValue) -> Self {
        value.text
    }
}

fn parse_hex(text: &str) -> Option<Rgba> {
    let digits = text.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f64 / 255.0);
    match digits.len() {
        3 => {
            let expand = |i: usize| {
                let c = &digits[i..i + 1];
                channel(&format!("{c}{c}"))
            };
            Some(Rgba {
                r: expand(0)?,
                g: expand(1)?,
                b: expand(2)?,
                a: 1.0,
            })
        }
        6 => Some(Rgba {
            r: channel(&digits[0..2])?,
            g: channel(&digits[2..4])?,
            b: channel(&digits[4..6])?,
            a: 1.0,
        }),
        _ => None,
    }
}

fn parse_functional(text: &str) -> Option<Rgba> {
    let (body, with_alpha) = if let Some(rest) = text.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = text.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }

    let channel = |s: &str| s.parse::<u8>().ok().map(|v| v as f64 / 255.0);
    let a = if with_alpha {
        let alpha = parts[3].parse::<f64>().ok()?;
        if !(0.0..=1.0).contains(&alpha) {
            return None;
        }
        alpha
    } else {
        1.0
    };

    Some(Rgba {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hex_expands_each_digit() {
        let color = ColorValue::parse("#f00").unwrap();
        assert_eq!(
            color.rgba(),
            Rgba {
                r: 1.0,
                g: 0.0,
                b: 0.0,
                a: 1.0
            }
        );
    }

    #[test]
    fn rgba_keeps_alpha_and_original_text() {
        let color = ColorValue::parse("rgba(0, 255, 0, 0.25)").unwrap();
        assert_eq!(color.rgba().g, 1.0);
        assert_eq!(color.rgba().a, 0.25);
        assert_eq!(color.as_str(), "rgba(0, 255, 0, 0.25)");
    }

    #[test]
    fn rejects_out_of_range_and_malformed_values() {
        assert!(ColorValue::parse("rgb(256, 0, 0)").is_err());
        assert!(ColorValue::parse("rgba(0, 0, 0, 1.5)").is_err());
        assert!(ColorValue::parse("#abcd").is_err());
        assert!(ColorValue::parse("red").is_err());
    }

    #[test]
    fn deserializing_invalid_color_fails() {
        let result: Result<ColorValue, _> = serde_json::from_str("\"#zzzzzz\"");
        assert!(result.is_err());
    }
}
