use serde::{Deserialize, Serialize};

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{PinError, PinResult};
use crate::render::surface::Surface;

/// Video container a sink produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// H.264 in fragmented MP4. Preferred.
    Mp4,
    /// VP9 in WebM. Fallback.
    WebM,
}

impl Container {
    pub fn mime_type(self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::WebM => "video/webm",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::WebM => "webm",
        }
    }
}

/// Finished recording: one byte stream tagged with its container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVideo {
    pub container: Container,
    pub bytes: Vec<u8>,
    pub frame_count: u64,
}

impl EncodedVideo {
    pub fn mime_type(&self) -> &'static str {
        self.container.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }
}

/// Configuration provided to a [`FrameSink`] when recording starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Capture sink fed by the video exporter.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order. A sink
/// is append-only; `abort` discards everything captured since `begin`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> PinResult<()>;
    /// Push the surface's current pixels as the next frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Surface) -> PinResult<()>;
    /// Finalize and hand back the encoded stream.
    fn end(&mut self) -> PinResult<EncodedVideo>;
    /// Stop without producing output.
    fn abort(&mut self);
}

/// In-memory sink for tests and debugging. Its "encoding" is the raw premultiplied frames,
/// concatenated.
#[derive(Debug)]
pub struct InMemorySink {
    container: Container,
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Vec<u8>)>,
}

impl Default for InMemorySink {
    fn default() -> Self {
        Self::new(Container::Mp4)
    }
}

impl InMemorySink {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            cfg: None,
            frames: Vec::new(),
        }
    }

    /// Return the sink configuration captured in `begin` while recording.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, Vec<u8>)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PinResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(PinError::capture("sink width/height must be non-zero"));
        }
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Surface) -> PinResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| PinError::capture("in-memory sink not started"))?;
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(PinError::capture(
                "in-memory sink received out-of-order frame index",
            ));
        }
        if frame.width() != cfg.width || frame.height() != cfg.height {
            return Err(PinError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                cfg.width,
                cfg.height
            )));
        }
        self.frames.push((idx, frame.data().to_vec()));
        Ok(())
    }

    fn end(&mut self) -> PinResult<EncodedVideo> {
        if self.cfg.take().is_none() {
            return Err(PinError::capture("in-memory sink not started"));
        }
        let bytes = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.iter().copied())
            .collect();
        Ok(EncodedVideo {
            container: self.container,
            bytes,
            frame_count: self.frames.len() as u64,
        })
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.frames.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
