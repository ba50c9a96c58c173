use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::contrast_text;
use crate::error::ColorError;

/// One of the four palette slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteKey {
    Primary,
    Secondary,
    Accent,
    Text,
}

impl PaletteKey {
    pub const ALL: [PaletteKey; 4] = [
        PaletteKey::Primary,
        PaletteKey::Secondary,
        PaletteKey::Accent,
        PaletteKey::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteKey::Primary => "primary",
            PaletteKey::Secondary => "secondary",
            PaletteKey::Accent => "accent",
            PaletteKey::Text => "text",
        }
    }
}

impl FromStr for PaletteKey {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(PaletteKey::Primary),
            "secondary" => Ok(PaletteKey::Secondary),
            "accent" => Ok(PaletteKey::Accent),
            "text" => Ok(PaletteKey::Text),
            _ => Err(ColorError::UnknownKey(s.to_string())),
        }
    }
}

impl std::fmt::Display for PaletteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Four-slot theme palette. Unused slots hold `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub text: String,
}

impl Palette {
    /// Fill slots left to right; missing candidates leave trailing slots empty.
    pub fn from_candidates<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut palette = Palette::default();
        for (key, color) in PaletteKey::ALL.into_iter().zip(candidates) {
            palette.set(key, color.into());
        }
        palette
    }

    /// Palette built from favicon colors. `None` when there are none.
    ///
    /// Secondary and accent repeat the primary color when the favicon is short
    /// on colors; text contrasts with the primary.
    pub fn from_favicon<S: AsRef<str>>(colors: &[S]) -> Option<Self> {
        let valid: Vec<&str> = colors
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| !c.is_empty())
            .collect();
        let primary = *valid.first()?;

        Some(Palette {
            primary: primary.to_string(),
            secondary: valid.get(1).copied().unwrap_or(primary).to_string(),
            accent: valid.get(2).copied().unwrap_or(primary).to_string(),
            text: contrast_text(primary).to_string(),
        })
    }

    /// Keep `self` unless every slot is empty and the favicon offers colors.
    pub fn or_favicon<S: AsRef<str>>(self, favicon_colors: &[S]) -> Self {
        if !self.is_empty() {
            return self;
        }
        Palette::from_favicon(favicon_colors).unwrap_or(self)
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }

    pub fn get(&self, key: PaletteKey) -> &str {
        match key {
            PaletteKey::Primary => &self.primary,
            PaletteKey::Secondary => &self.secondary,
            PaletteKey::Accent => &self.accent,
            PaletteKey::Text => &self.text,
        }
    }

    pub fn set(&mut self, key: PaletteKey, color: String) {
        match key {
            PaletteKey::Primary => self.primary = color,
            PaletteKey::Secondary => self.secondary = color,
            PaletteKey::Accent => self.accent = color,
            PaletteKey::Text => self.text = color,
        }
    }

    /// Slot values in key order.
    pub fn values(&self) -> [&str; 4] {
        [
            self.primary.as_str(),
            self.secondary.as_str(),
            self.accent.as_str(),
            self.text.as_str(),
        ]
    }
}

/// Colors gathered for one website.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteColorData {
    pub palette: Palette,
    pub css: Vec<String>,
    pub favicon: Vec<String>,
}

/// Result of one extraction request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteData {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Source URL of the favicon, empty when none could be determined.
    pub favicon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_base64: Option<String>,
    pub colors: WebsiteColorData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_candidates_pads_with_empty() {
        let palette = Palette::from_candidates(["#111111", "#222222"]);
        assert_eq!(palette.values(), ["#111111", "#222222", "", ""]);
    }

    #[test]
    fn test_from_candidates_ignores_extra() {
        let palette = Palette::from_candidates(["#1", "#2", "#3", "#4", "#5"]);
        assert_eq!(palette.text, "#4");
    }

    #[test]
    fn test_favicon_fallback_two_colors() {
        let palette = Palette::default().or_favicon(&["#102030", "#405060"]);
        assert_eq!(palette.primary, "#102030");
        assert_eq!(palette.secondary, "#405060");
        assert_eq!(palette.accent, "#102030");
        assert_eq!(palette.text, "#ffffff");
    }

    #[test]
    fn test_favicon_fallback_light_primary() {
        let palette = Palette::default().or_favicon(&["#f0f0f0"]);
        assert_eq!(palette.secondary, "#f0f0f0");
        assert_eq!(palette.text, "#000000");
    }

    #[test]
    fn test_favicon_fallback_skips_empty_entries() {
        let palette = Palette::default().or_favicon(&["", "#eeeeee"]);
        assert_eq!(palette.primary, "#eeeeee");
    }

    #[test]
    fn test_partial_css_palette_kept() {
        let css = Palette::from_candidates(["#abcdef"]);
        assert_eq!(css.clone().or_favicon(&["#102030"]), css);
    }

    #[test]
    fn test_empty_palette_without_favicon_stays_empty() {
        assert!(Palette::default().or_favicon::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_palette_key_parse() {
        assert_eq!("Primary".parse::<PaletteKey>().unwrap(), PaletteKey::Primary);
        assert_eq!(" text ".parse::<PaletteKey>().unwrap(), PaletteKey::Text);
        assert!("border".parse::<PaletteKey>().is_err());
    }

    #[test]
    fn test_website_data_json_shape() {
        let data = WebsiteData {
            title: "Example".into(),
            description: String::new(),
            url: "https://example.com".into(),
            favicon: "https://example.com/favicon.ico".into(),
            favicon_base64: None,
            colors: WebsiteColorData::default(),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("faviconBase64").is_none());
        assert_eq!(json["colors"]["palette"]["primary"], "");
        assert!(json["colors"]["css"].as_array().unwrap().is_empty());

        let with_icon = WebsiteData {
            favicon_base64: Some("data:image/png;base64,AA==".into()),
            ..data
        };
        let json = serde_json::to_value(&with_icon).unwrap();
        assert_eq!(json["faviconBase64"], "data:image/png;base64,AA==");
    }
}
