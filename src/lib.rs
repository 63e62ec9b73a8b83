//! Pinforge composes Pinterest pins: an auto-fitted headline over a background, a call-to-action
//! button and a brand line, rendered on the CPU into a 1000x1500 surface.
//!
//! - Render preview frames with a [`FrameRenderer`]
//! - Export the surface as a PNG ([`export_still`]) or record the zoom animation into a
//!   [`FrameSink`] with a [`VideoExporter`]
//! - Drive generation and publishing through a [`PinStudio`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod encode;
pub(crate) mod export;
pub(crate) mod render;
pub(crate) mod services;
pub(crate) mod session;
pub(crate) mod style;
pub(crate) mod text;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{PinError, PinResult};

pub use crate::animation::clock::{FixedStepClock, FrameClock, WallClock};
pub use crate::animation::zoom::{ZoomAnimation, progress_percent};
pub use crate::encode::ffmpeg::{
    FFMPEG_ENV, FfmpegSink, FfmpegSinkOpts, ffmpeg_program, is_ffmpeg_on_path, negotiate_container,
    pick_container,
};
pub use crate::encode::sink::{Container, EncodedVideo, FrameSink, InMemorySink, SinkConfig};
pub use crate::export::still::{
    StillImage, encode_png, export_still, headline_slug, still_file_name, video_file_name,
};
pub use crate::export::video::{RecordingState, TickOutcome, VideoExporter, record_zoom_video};
pub use crate::render::background::{BackgroundSource, DecodedImage, cover_rect};
pub use crate::render::frame::{FrameRenderer, FrameRendererOpts};
pub use crate::render::layout::{
    CtaLayout, DropShadow, HeadlineLayout, SchemeEffect, brand_center, layout_cta,
    layout_headline, scheme_effect,
};
pub use crate::render::surface::Surface;
pub use crate::services::content::{
    ContentProvider, GeneratedContent, ImagePayload, Variation, decode_image_payload,
    parse_generated_content, variation_prompt,
};
pub use crate::services::gemini::{
    GEMINI_API_BASE, GEMINI_API_KEY_ENV, GEMINI_IMAGE_MODEL, GEMINI_TEXT_MODEL, GeminiClient,
};
pub use crate::services::publish::{
    API_BASE, Board, BoardSection, CreatePin, CreatedPin, CredentialStore, DEFAULT_POLL_INTERVAL,
    DEFAULT_POLL_TIMEOUT, FileCredentialStore, MemoryCredentialStore, OAuthConfig,
    PinterestClient, PinterestUser, is_connected, wait_for_connection,
};
pub use crate::session::studio::{
    BackgroundState, NO_VARIATIONS, PinStudio, SESSION_EXPIRED, VariationSlot,
};
pub use crate::style::color::Color;
pub use crate::style::config::{ColorScheme, FONT_PRESETS, FontPreset, StyleConfig, font_preset};
pub use crate::text::engine::{FontMeasure, ShapedLine, ShapingFont, TextEngine};
pub use crate::text::fit::{FitParams, TextMeasure, block_height, fit_font_size, wrap_text};
pub use crate::text::fonts::{FONT_DIR_ENV, FamilyName, FontBook, parse_family_list};
