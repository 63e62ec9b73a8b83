use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{PinError, PinResult};
use crate::style::color::Color;

/// Overlay/text-color override family applied on top of the configured colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScheme {
    /// Light tint, configured colors unchanged.
    #[default]
    Standard,
    /// Desaturated background, white text on black outline.
    Monochrome,
    /// Heavy tint, white text.
    DarkOverlay,
}

/// A named CSS-like font family list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontPreset {
    pub name: &'static str,
    pub value: &'static str,
}

pub const FONT_PRESETS: &[FontPreset] = &[
    FontPreset {
        name: "Bold Sans",
        value: r#""Arial Black", "Helvetica Neue", sans-serif"#,
    },
    FontPreset {
        name: "Sans Serif",
        value: "Arial, Helvetica, sans-serif",
    },
    FontPreset {
        name: "Serif",
        value: r#"Georgia, "Times New Roman", serif"#,
    },
    FontPreset {
        name: "Monospace",
        value: r#""Courier New", Courier, monospace"#,
    },
    FontPreset {
        name: "Cursive",
        value: r#""Brush Script MT", cursive"#,
    },
    FontPreset {
        name: "Modern",
        value: "Verdana, Geneva, sans-serif",
    },
];

/// Look up a preset by its display name (case-insensitive).
pub fn font_preset(name: &str) -> Option<&'static FontPreset> {
    FONT_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Immutable styling snapshot consumed by one render call.
///
/// Empty `headline`, `cta_text` or `brand_text` skip their block entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleConfig {
    pub headline: String,
    pub cta_text: String,
    pub brand_text: String,
    /// CSS-like family list, e.g. `"Arial Black", sans-serif`.
    pub font_family: String,
    pub text_color: Color,
    pub outline_color: Color,
    pub brand_color: Color,
    pub cta_bg_color: Color,
    pub cta_text_color: Color,
    /// Vertical center of the headline block, in percent of canvas height.
    #[serde(rename = "textYPos")]
    pub text_y_pos: f64,
    pub color_scheme: ColorScheme,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            headline: "Your Catchy Headline Here".to_owned(),
            cta_text: "Download Your 50 Free Woodworking Plan".to_owned(),
            brand_text: String::new(),
            font_family: FONT_PRESETS[0].value.to_owned(),
            text_color: Color::BLACK,
            outline_color: Color::WHITE,
            brand_color: Color::WHITE,
            cta_bg_color: Color::from_rgba8(0xe6, 0x00, 0x23, 0xff),
            cta_text_color: Color::WHITE,
            text_y_pos: 45.0,
            color_scheme: ColorScheme::Standard,
        }
    }
}

impl StyleConfig {
    /// Parse and validate a JSON style document.
    pub fn from_json_str(s: &str) -> PinResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON style file.
    pub fn from_path(path: impl AsRef<Path>) -> PinResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read style config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> PinResult<()> {
        if !self.text_y_pos.is_finite() || !(0.0..=100.0).contains(&self.text_y_pos) {
            return Err(PinError::validation(format!(
                "textYPos must be within [0, 100], got {}",
                self.text_y_pos
            )));
        }
        if self.font_family.trim().is_empty() {
            return Err(PinError::validation("fontFamily must be non-empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/config.rs"]
mod tests;
