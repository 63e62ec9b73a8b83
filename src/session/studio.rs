use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::animation::zoom::ZoomAnimation;
use crate::encode::sink::FrameSink;
use crate::export::still::{StillImage, export_still};
use crate::export::video::{RecordingState, TickOutcome, VideoExporter};
use crate::foundation::error::{PinError, PinResult};
use crate::render::background::{BackgroundSource, DecodedImage};
use crate::render::frame::FrameRenderer;
use crate::render::surface::Surface;
use crate::services::content::{ContentProvider, Variation};
use crate::services::publish::{CreatePin, CreatedPin, CredentialStore, PinterestClient};
use crate::style::config::StyleConfig;

pub const SESSION_EXPIRED: &str = "Your Pinterest session has expired. Please reconnect.";
pub const NO_VARIATIONS: &str = "No variations generated.";

/// Background of one variation.
#[derive(Clone, Debug, Default)]
pub enum BackgroundState {
    /// Not requested yet.
    #[default]
    Pending,
    Ready(DecodedImage),
    /// Generation or decoding failed; the gradient is painted instead.
    Fallback { error: String },
}

impl BackgroundState {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    fn source(&self) -> BackgroundSource<'_> {
        match self {
            Self::Ready(img) => BackgroundSource::Image(img),
            Self::Pending | Self::Fallback { .. } => BackgroundSource::Fallback,
        }
    }
}

static NO_BACKGROUND: BackgroundState = BackgroundState::Pending;

#[derive(Clone, Debug)]
pub struct VariationSlot {
    pub variation: Variation,
    pub background: BackgroundState,
}

/// Style and background frozen when a recording starts.
struct RecordingScene {
    style: StyleConfig,
    background: BackgroundState,
}

/// Editing session: generated variations, the active style, and the one surface everything is
/// drawn into.
///
/// Rendering is explicit. Nothing redraws on its own; callers invoke [`render`](Self::render)
/// (or a method documented to re-render) and read the surface afterwards.
///
/// A recording draws from a snapshot taken in [`start_video`](Self::start_video), so edits made
/// while it runs only reach the preview once it ends.
pub struct PinStudio {
    variations: Vec<VariationSlot>,
    gradient_colors: Vec<String>,
    active: usize,
    style: StyleConfig,
    renderer: FrameRenderer,
    surface: Surface,
    exporter: VideoExporter,
    recording: Option<RecordingScene>,
    last_error: Option<String>,
}

impl PinStudio {
    pub fn new(renderer: FrameRenderer, surface: Surface) -> Self {
        Self::with_animation(renderer, surface, ZoomAnimation::default())
    }

    pub fn with_animation(renderer: FrameRenderer, surface: Surface, anim: ZoomAnimation) -> Self {
        Self {
            variations: Vec::new(),
            gradient_colors: Vec::new(),
            active: 0,
            style: StyleConfig::default(),
            renderer,
            surface,
            exporter: VideoExporter::new(anim),
            recording: None,
            last_error: None,
        }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn variations(&self) -> &[VariationSlot] {
        &self.variations
    }

    pub fn gradient_colors(&self) -> &[String] {
        &self.gradient_colors
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn current_variation(&self) -> Option<&Variation> {
        self.variations.get(self.active).map(|s| &s.variation)
    }

    pub fn recording_state(&self) -> RecordingState {
        self.exporter.state()
    }

    /// Message of the most recent absorbed or reported failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Replace all variations with fresh ones for `keyword` and select the first.
    ///
    /// Blank keywords are ignored and return `Ok(0)`. Previous variations are dropped before the
    /// provider is asked, so a failure leaves the session empty.
    pub fn generate(
        &mut self,
        provider: &mut dyn ContentProvider,
        keyword: &str,
    ) -> PinResult<usize> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(0);
        }
        self.last_error = None;
        self.variations.clear();
        self.gradient_colors.clear();
        self.active = 0;

        let content = match provider.generate_variations(keyword) {
            Ok(c) if !c.variations.is_empty() => c,
            Ok(_) => return Err(self.report(PinError::generation(NO_VARIATIONS))),
            Err(e) => return Err(self.report(e)),
        };

        tracing::info!(keyword, count = content.variations.len(), "variations generated");
        self.gradient_colors = content.gradient_colors;
        self.variations = content
            .variations
            .into_iter()
            .map(|variation| VariationSlot {
                variation,
                background: BackgroundState::Pending,
            })
            .collect();
        self.style.headline = self.variations[0].variation.headline.clone();
        Ok(self.variations.len())
    }

    /// Make variation `index` current and copy its headline into the style.
    pub fn select_variation(&mut self, index: usize) -> PinResult<()> {
        let slot = self.variations.get(index).ok_or_else(|| {
            PinError::validation(format!(
                "variation index {index} out of range (have {})",
                self.variations.len()
            ))
        })?;
        self.style.headline = slot.variation.headline.clone();
        self.active = index;
        Ok(())
    }

    /// Generate and decode the current variation's image once.
    ///
    /// Failures never propagate: the variation switches to the fallback gradient and the error
    /// message is kept in [`last_error`](Self::last_error).
    pub fn ensure_background(&mut self, provider: &mut dyn ContentProvider) -> &BackgroundState {
        let idx = self.active;
        let Some(slot) = self.variations.get(idx) else {
            return &NO_BACKGROUND;
        };
        if matches!(slot.background, BackgroundState::Pending) {
            let prompt = slot.variation.image_prompt.clone();
            let state = match provider
                .generate_image(&prompt)
                .and_then(|p| p.into_bytes())
                .and_then(|bytes| DecodedImage::decode(&bytes))
            {
                Ok(img) => BackgroundState::Ready(img),
                Err(e) => {
                    tracing::warn!(variation = idx, error = %e, "background unavailable, using fallback");
                    let error = e.to_string();
                    self.last_error = Some(error.clone());
                    BackgroundState::Fallback { error }
                }
            };
            self.variations[idx].background = state;
        }
        &self.variations[idx].background
    }

    /// Apply `edit` to the style and redraw. Invalid edits are rolled back.
    pub fn update_style(&mut self, edit: impl FnOnce(&mut StyleConfig)) -> PinResult<bool> {
        let mut next = self.style.clone();
        edit(&mut next);
        next.validate()?;
        self.style = next;
        self.render()
    }

    /// Draw the preview frame at zoom 1. Returns `false` without drawing while a video records.
    pub fn render(&mut self) -> PinResult<bool> {
        if self.exporter.is_recording() {
            return Ok(false);
        }
        let background = current_background(&self.variations, self.active);
        self.renderer
            .render_frame(&mut self.surface, &self.style, background, 1.0)?;
        Ok(true)
    }

    /// PNG of whatever the surface currently holds.
    pub fn export_still(&self) -> PinResult<StillImage> {
        export_still(&self.surface, &self.style.headline)
    }

    /// Begin recording the current style and background.
    pub fn start_video(&mut self, sink: Box<dyn FrameSink>, now: Duration) -> PinResult<()> {
        let canvas = self.surface.canvas();
        let scene = RecordingScene {
            style: self.style.clone(),
            background: self
                .variations
                .get(self.active)
                .map(|s| s.background.clone())
                .unwrap_or_default(),
        };
        self.exporter.start(sink, canvas, now)?;
        self.recording = Some(scene);
        Ok(())
    }

    /// Advance the recording. When it ends, successfully or not, the preview is redrawn.
    pub fn tick_video(&mut self, now: Duration) -> PinResult<TickOutcome> {
        let outcome = match &self.recording {
            Some(scene) => self.exporter.tick(
                now,
                &mut self.renderer,
                &mut self.surface,
                &scene.style,
                scene.background.source(),
            ),
            None => Err(PinError::capture("no video export is recording")),
        };
        if !self.exporter.is_recording() {
            self.recording = None;
        }
        match outcome {
            Ok(TickOutcome::Recording { progress_pct }) => {
                Ok(TickOutcome::Recording { progress_pct })
            }
            Ok(done) => {
                self.render()?;
                Ok(done)
            }
            Err(e) => {
                let e = self.report(e);
                if !self.exporter.is_recording() {
                    let _ = self.render();
                }
                Err(e)
            }
        }
    }

    /// Abort the recording and restore the preview.
    pub fn cancel_video(&mut self) -> PinResult<bool> {
        if !self.exporter.cancel() {
            return Ok(false);
        }
        self.recording = None;
        self.render()?;
        Ok(true)
    }

    /// Pin request for the current variation and surface.
    ///
    /// The title is the headline, or the SEO title when the headline is empty.
    pub fn pin_draft(
        &self,
        board_id: &str,
        section_id: Option<&str>,
        publish_at: Option<&str>,
    ) -> PinResult<CreatePin> {
        let variation = self
            .current_variation()
            .ok_or_else(|| PinError::validation("no variation selected"))?;
        let still = self.export_still()?;

        let title = if self.style.headline.is_empty() {
            variation.seo_title.clone()
        } else {
            self.style.headline.clone()
        };
        Ok(CreatePin {
            board_id: board_id.to_owned(),
            board_section_id: section_id.map(str::to_owned),
            title,
            description: format!("{} {}", variation.seo_description, variation.hashtags),
            image_base64: STANDARD.encode(&still.bytes),
            publish_at: publish_at.map(str::to_owned),
        })
    }

    /// Send `draft`. A rejected credential is cleared from `store`.
    pub fn publish(
        &mut self,
        client: &PinterestClient,
        store: &mut dyn CredentialStore,
        draft: &CreatePin,
    ) -> PinResult<CreatedPin> {
        match client.create_pin(draft) {
            Ok(pin) => Ok(pin),
            Err(e) if e.is_unauthorized() => {
                tracing::warn!(error = %e, "publishing credential rejected");
                store.clear()?;
                Err(self.report(PinError::unauthorized(SESSION_EXPIRED)))
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn report(&mut self, e: PinError) -> PinError {
        self.last_error = Some(match &e {
            PinError::Generation(m) | PinError::Publish(m) | PinError::Unauthorized(m) => m.clone(),
            other => other.to_string(),
        });
        e
    }
}

fn current_background(slots: &[VariationSlot], active: usize) -> BackgroundSource<'_> {
    slots
        .get(active)
        .map_or(BackgroundSource::Fallback, |s| s.background.source())
}

#[cfg(test)]
#[path = "../../tests/unit/session/studio.rs"]
mod tests;
