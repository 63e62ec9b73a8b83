use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::foundation::error::{PinError, PinResult};
use crate::services::content::{
    ContentProvider, GeneratedContent, ImagePayload, parse_generated_content, variation_prompt,
};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_TEXT_MODEL: &str = "gemini-3-pro-preview";
pub const GEMINI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
/// Environment variable holding the API key read by [`GeminiClient::from_env`].
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Portrait framing requested for generated backgrounds.
const IMAGE_ASPECT_RATIO: &str = "3:4";
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// [`ContentProvider`] backed by the Gemini `generateContent` REST endpoint.
///
/// Copy comes from a JSON-constrained text model; backgrounds come back as inline image data.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    base: Url,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> PinResult<Self> {
        Self::with_base(api_key, GEMINI_API_BASE)
    }

    pub fn with_base(api_key: impl Into<String>, base: &str) -> PinResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PinError::validation("gemini api key is empty"));
        }
        let base = Url::parse(base)
            .map_err(|e| PinError::validation(format!("invalid api base '{base}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(PinError::validation(format!("api base '{base}' cannot hold paths")));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            base,
            api_key,
            text_model: GEMINI_TEXT_MODEL.to_owned(),
            image_model: GEMINI_IMAGE_MODEL.to_owned(),
        })
    }

    /// Key from `$GEMINI_API_KEY`, talking to `base`.
    pub fn from_env(base: &str) -> PinResult<Self> {
        let key = std::env::var(GEMINI_API_KEY_ENV).map_err(|_| {
            PinError::validation(format!("set {GEMINI_API_KEY_ENV} to generate content"))
        })?;
        Self::with_base(key, base)
    }

    pub fn with_models(mut self, text: impl Into<String>, image: impl Into<String>) -> Self {
        self.text_model = text.into();
        self.image_model = image.into();
        self
    }

    fn endpoint(&self, model: &str) -> PinResult<Url> {
        let op = format!("{model}:generateContent");
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PinError::validation("api base cannot hold paths"))?
            .pop_if_empty()
            .extend(["models", op.as_str()]);
        Ok(url)
    }

    #[tracing::instrument(level = "debug", skip(self, body))]
    fn generate_content(&self, model: &str, body: serde_json::Value) -> PinResult<Vec<Part>> {
        let resp = self
            .http
            .post(self.endpoint(model)?)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send();
        let resp: GenerateResponse = read_json(resp, "content generation failed")?;
        first_candidate_parts(resp)
    }
}

impl ContentProvider for GeminiClient {
    fn generate_variations(&mut self, keyword: &str) -> PinResult<GeneratedContent> {
        let body = json!({
            "contents": [{ "parts": [{ "text": variation_prompt(keyword) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": content_schema(),
            },
        });
        let parts = self.generate_content(&self.text_model, body)?;
        let text = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();
        if text.trim().is_empty() {
            return Err(PinError::generation("text model returned no text"));
        }
        let content = parse_generated_content(&text)?;
        tracing::info!(variations = content.variations.len(), "variations generated");
        Ok(content)
    }

    fn generate_image(&mut self, prompt: &str) -> PinResult<ImagePayload> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "imageConfig": { "aspectRatio": IMAGE_ASPECT_RATIO },
            },
        });
        let parts = self.generate_content(&self.image_model, body)?;
        image_from_parts(parts)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

fn first_candidate_parts(resp: GenerateResponse) -> PinResult<Vec<Part>> {
    let block = resp.prompt_feedback.and_then(|f| f.block_reason);
    let Some(candidate) = resp.candidates.into_iter().next() else {
        return Err(PinError::generation(match block {
            Some(reason) => format!("prompt was blocked ({reason})"),
            None => "model returned no content; it may have been blocked by safety filters"
                .to_owned(),
        }));
    };
    let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
    if parts.is_empty() {
        return Err(PinError::generation(match candidate.finish_reason {
            Some(reason) => format!("response candidate has no parts (finish reason {reason})"),
            None => "response candidate has no parts".to_owned(),
        }));
    }
    Ok(parts)
}

/// First inline image as a `data:` URI. Text without an image is the model's refusal.
fn image_from_parts(parts: Vec<Part>) -> PinResult<ImagePayload> {
    let mut refusal = Vec::new();
    for part in parts {
        if let Some(inline) = part.inline_data
            && !inline.data.is_empty()
        {
            let mime = inline.mime_type.as_deref().unwrap_or("image/png");
            return Ok(ImagePayload::Encoded(format!(
                "data:{mime};base64,{}",
                inline.data
            )));
        }
        if let Some(text) = part.text
            && !text.trim().is_empty()
        {
            refusal.push(text);
        }
    }
    if refusal.is_empty() {
        return Err(PinError::generation("no image data in response"));
    }
    Err(PinError::generation(format!(
        "model refused to generate image: {}",
        refusal.join(" ")
    )))
}

fn content_schema() -> serde_json::Value {
    let variation_fields = [
        "headline",
        "seoTitle",
        "seoDescription",
        "hashtags",
        "textColor",
        "outlineColor",
        "imagePrompt",
    ];
    let properties: serde_json::Map<String, serde_json::Value> = variation_fields
        .iter()
        .map(|&f| (f.to_owned(), json!({ "type": "STRING" })))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "variations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": properties,
                    "required": variation_fields,
                },
            },
            "gradientColors": { "type": "ARRAY", "items": { "type": "STRING" } },
        },
        "required": ["variations", "gradientColors"],
    })
}

fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Result<reqwest::blocking::Response>,
    fallback: &str,
) -> PinResult<T> {
    let resp = resp.map_err(|e| PinError::generation(format!("{fallback}: {e}")))?;
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| PinError::generation(format!("{fallback}: {e}")))?;

    if !status.is_success() {
        tracing::warn!(status = status.as_u16(), "gemini request failed");
        return Err(PinError::generation(
            api_message(&body).unwrap_or_else(|| format!("{fallback} (http {})", status.as_u16())),
        ));
    }
    serde_json::from_str(&body)
        .map_err(|e| PinError::generation(format!("{fallback}: unexpected response: {e}")))
}

/// `{"error": {"message": ...}}` as returned by Google APIs.
fn api_message(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("error")?.get("message")?.as_str().map(str::to_owned)
}

#[cfg(test)]
#[path = "../../tests/unit/services/gemini.rs"]
mod tests;
