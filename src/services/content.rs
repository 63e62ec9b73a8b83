use anyhow::Context as _;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{PinError, PinResult};

/// Number of variations requested per keyword.
pub const VARIATION_COUNT: usize = 5;

/// One generated marketing variation for a keyword.
///
/// Colors are kept as the provider's strings; they are suggestions and are not applied to the
/// style automatically.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variation {
    pub headline: String,
    #[serde(default)]
    pub seo_title: String,
    #[serde(default)]
    pub seo_description: String,
    /// Space-separated hashtags.
    #[serde(default)]
    pub hashtags: String,
    #[serde(default)]
    pub text_color: String,
    #[serde(default)]
    pub outline_color: String,
    pub image_prompt: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub variations: Vec<Variation>,
    #[serde(default)]
    pub gradient_colors: Vec<String>,
}

/// What an image generator hands back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    /// A `data:` URI or bare base64 text.
    Encoded(String),
}

impl ImagePayload {
    pub fn into_bytes(self) -> PinResult<Vec<u8>> {
        match self {
            Self::Bytes(b) => Ok(b),
            Self::Encoded(s) => decode_image_payload(&s),
        }
    }
}

/// External generator of marketing copy and background images.
pub trait ContentProvider {
    fn generate_variations(&mut self, keyword: &str) -> PinResult<GeneratedContent>;

    fn generate_image(&mut self, prompt: &str) -> PinResult<ImagePayload>;
}

/// Prompt asking a text model for [`VARIATION_COUNT`] variations as JSON.
pub fn variation_prompt(keyword: &str) -> String {
    format!(
        "Create {VARIATION_COUNT} distinct, high-converting Pinterest pin variations for the \
         keyword: \"{keyword}\".\n\
         For each variation provide:\n\
         1. imagePrompt: a detailed prompt for a vertical, high quality, photorealistic \
         background image with no text in it.\n\
         2. headline: a viral, catchy headline of at most 10 words.\n\
         3. seoTitle: an SEO-optimized pin title.\n\
         4. seoDescription: an engaging description of about 30 words.\n\
         5. hashtags: 10 relevant hashtags separated by spaces.\n\
         6. textColor and outlineColor: hex colors giving strong contrast over the image.\n\
         Also provide gradientColors: 2 hex colors for a fallback background gradient.\n\
         Respond with JSON only, shaped as \
         {{\"variations\": [{{\"imagePrompt\", \"headline\", \"seoTitle\", \"seoDescription\", \
         \"hashtags\", \"textColor\", \"outlineColor\"}}], \"gradientColors\": [..]}}."
    )
}

/// Parse and validate a provider response.
///
/// Tolerates a surrounding Markdown code fence. Every variation needs a non-blank headline and
/// image prompt.
pub fn parse_generated_content(json: &str) -> PinResult<GeneratedContent> {
    let body = strip_code_fence(json);
    let content: GeneratedContent = serde_json::from_str(body)
        .map_err(|e| PinError::generation(format!("malformed content response: {e}")))?;

    for (i, v) in content.variations.iter().enumerate() {
        if v.headline.trim().is_empty() {
            return Err(PinError::generation(format!("variation {i} has no headline")));
        }
        if v.image_prompt.trim().is_empty() {
            return Err(PinError::generation(format!(
                "variation {i} has no image prompt"
            )));
        }
    }
    Ok(content)
}

fn strip_code_fence(s: &str) -> &str {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract image bytes from a `data:<mime>;base64,<payload>` URI or bare base64 text.
pub fn decode_image_payload(payload: &str) -> PinResult<Vec<u8>> {
    let payload = payload.trim();
    let b64 = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| PinError::generation("data URI has no payload"))?;
            if !meta.ends_with(";base64") {
                return Err(PinError::generation(format!(
                    "unsupported data URI encoding '{meta}'"
                )));
            }
            data
        }
        None => payload,
    };
    if b64.is_empty() {
        return Err(PinError::generation("image payload is empty"));
    }
    let bytes = STANDARD
        .decode(b64)
        .context("decode base64 image payload")?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/services/content.rs"]
mod tests;
