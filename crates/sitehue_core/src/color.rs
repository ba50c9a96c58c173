//! Color tokens: canonical hex normalization and channel access.
//!
//! A token is any textual color the CSS scanner or favicon decoder produces:
//! `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or `rgb(r g b / a%)`.
//! The canonical form is lowercase `#rrggbb`, with a trailing alpha byte only
//! when the color is not fully opaque.

use regex::Regex;

use crate::error::{ColorError, Result};

lazy_static::lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"-?\d*\.?\d+").unwrap();
    static ref HEX3: Regex = Regex::new(r"^#[0-9a-f]{3}$").unwrap();
    static ref HEX6_PREFIX: Regex = Regex::new(r"(?i)#[0-9a-f]{6}").unwrap();
}

/// Sum of channels below which a color counts as dark.
pub const DARK_CHANNEL_SUM: u32 = 382;

/// An opaque RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the first six hex digits after `#`. Any alpha suffix is ignored.
    pub fn from_hex(token: &str) -> Result<Self> {
        let digits = token
            .strip_prefix('#')
            .and_then(|rest| rest.get(..6))
            .filter(|d| d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| ColorError::NotHex(token.to_string()))?;

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ColorError::NotHex(token.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn channel_sum(self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }

    /// Euclidean distance in RGB space.
    pub fn distance(self, other: Rgb) -> f64 {
        let dr = self.r as f64 - other.r as f64;
        let dg = self.g as f64 - other.g as f64;
        let db = self.b as f64 - other.b as f64;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Canonicalize a color token. Unparseable input comes back lowercased.
pub fn normalize(color: &str) -> String {
    let color = color.to_lowercase();

    if color.starts_with("rgb") {
        if let Some(hex) = functional_to_hex(&color) {
            return hex;
        }
    }

    if HEX3.is_match(&color) {
        let mut expanded = String::with_capacity(7);
        expanded.push('#');
        for c in color[1..].chars() {
            expanded.push(c);
            expanded.push(c);
        }
        return expanded;
    }

    color
}

/// `true` when the token carries six hex digits whose channel sum is below 382.
pub fn is_dark(color: &str) -> bool {
    HEX6_PREFIX
        .find(color)
        .and_then(|m| Rgb::from_hex(m.as_str()).ok())
        .is_some_and(|rgb| rgb.channel_sum() < DARK_CHANNEL_SUM)
}

/// Readable text color for a background: white on dark, black otherwise.
pub fn contrast_text(background: &str) -> &'static str {
    if is_dark(background) {
        "#ffffff"
    } else {
        "#000000"
    }
}

fn functional_to_hex(color: &str) -> Option<String> {
    let open = color.find('(')?;
    let close = color[open..].find(')').map(|i| open + i).unwrap_or(color.len());
    let body = &color[open + 1..close];

    let (channels, alpha) = if body.contains('/') {
        let mut parts = body.splitn(2, '/');
        let rgb_part = parts.next().unwrap_or_default();
        let channels = rgb_part
            .split_whitespace()
            .map(parse_number)
            .collect::<Option<Vec<f64>>>()?;
        let alpha = parts.next().and_then(parse_alpha).unwrap_or(1.0);
        (channels, alpha)
    } else {
        let mut values: Vec<f64> = NUMBER
            .find_iter(body)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        let mut alpha = 1.0;
        if color.starts_with("rgba") && values.len() > 3 {
            alpha = values[3];
            values.truncate(3);
        }
        (values, alpha)
    };

    if channels.len() < 3 {
        return None;
    }

    let clamp = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    let hex = Rgb::new(clamp(channels[0]), clamp(channels[1]), clamp(channels[2])).to_hex();

    if alpha < 1.0 {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        return Some(format!("{hex}{a:02x}"));
    }
    Some(hex)
}

fn parse_number(token: &str) -> Option<f64> {
    NUMBER.find(token)?.as_str().parse().ok()
}

fn parse_alpha(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    match raw.strip_suffix('%') {
        Some(pct) => parse_number(pct).map(|v| v / 100.0),
        None => parse_number(raw),
    }
}
