use std::time::Duration;

use crate::animation::clock::FrameClock;
use crate::animation::zoom::{ZoomAnimation, progress_percent};
use crate::encode::sink::{EncodedVideo, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, FrameIndex};
use crate::foundation::error::{PinError, PinResult};
use crate::render::background::BackgroundSource;
use crate::render::frame::FrameRenderer;
use crate::render::surface::Surface;
use crate::style::config::StyleConfig;

/// Observable exporter state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording { progress_pct: u8 },
    /// The last session failed; a new one may be started.
    Failed { message: String },
}

/// Result of one animation tick.
#[derive(Debug)]
pub enum TickOutcome {
    Recording { progress_pct: u8 },
    Finished(EncodedVideo),
}

struct ActiveRecording {
    sink: Box<dyn FrameSink>,
    started_at: Duration,
    next_frame: FrameIndex,
    last_progress: Option<f64>,
    progress_pct: u8,
}

/// Drives the zoom animation into a capture sink, one explicit tick at a time.
///
/// `Idle -> Recording -> (Idle | Failed)`. Only one recording exists at a time; while it runs the
/// caller must not render anything else into the surface it passes to [`tick`](Self::tick).
pub struct VideoExporter {
    anim: ZoomAnimation,
    active: Option<ActiveRecording>,
    failure: Option<String>,
}

impl Default for VideoExporter {
    fn default() -> Self {
        Self::new(ZoomAnimation::default())
    }
}

impl VideoExporter {
    pub fn new(anim: ZoomAnimation) -> Self {
        Self {
            anim,
            active: None,
            failure: None,
        }
    }

    pub fn animation(&self) -> &ZoomAnimation {
        &self.anim
    }

    pub fn state(&self) -> RecordingState {
        match (&self.active, &self.failure) {
            (Some(a), _) => RecordingState::Recording {
                progress_pct: a.progress_pct,
            },
            (None, Some(msg)) => RecordingState::Failed {
                message: msg.clone(),
            },
            (None, None) => RecordingState::Idle,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Progress of the current recording in percent; 0 when not recording.
    pub fn progress_pct(&self) -> u8 {
        self.active.as_ref().map_or(0, |a| a.progress_pct)
    }

    /// Open `sink` and enter `Recording`. Rejected without side effects while already recording.
    pub fn start(&mut self, mut sink: Box<dyn FrameSink>, canvas: Canvas, now: Duration) -> PinResult<()> {
        if self.active.is_some() {
            return Err(PinError::capture("a video export is already recording"));
        }
        canvas.validate()?;
        self.anim.validate()?;

        let cfg = SinkConfig {
            width: canvas.width,
            height: canvas.height,
            fps: self.anim.frame_rate()?,
        };
        if let Err(e) = sink.begin(cfg) {
            self.failure = Some(e.to_string());
            return Err(e);
        }

        tracing::info!(
            width = canvas.width,
            height = canvas.height,
            fps = self.anim.fps,
            duration_ms = self.anim.duration_ms,
            "video recording started"
        );
        self.failure = None;
        self.active = Some(ActiveRecording {
            sink,
            started_at: now,
            next_frame: FrameIndex(0),
            last_progress: None,
            progress_pct: 0,
        });
        Ok(())
    }

    /// Render and capture the frame for time `now`, finishing when progress reaches 1.
    ///
    /// Ticks whose progress does not exceed the previous tick's are skipped, so frames reach the
    /// sink in strictly increasing progress order.
    pub fn tick(
        &mut self,
        now: Duration,
        renderer: &mut FrameRenderer,
        surface: &mut Surface,
        style: &StyleConfig,
        background: BackgroundSource<'_>,
    ) -> PinResult<TickOutcome> {
        let anim = self.anim;
        let Some(active) = self.active.as_mut() else {
            return Err(PinError::capture("no video export is recording"));
        };

        let progress = anim.progress_at(now.saturating_sub(active.started_at));
        if let Some(last) = active.last_progress
            && progress <= last
        {
            return Ok(TickOutcome::Recording {
                progress_pct: active.progress_pct,
            });
        }

        let scale = anim.scale_at(progress);
        let captured = renderer
            .render_frame(surface, style, background, scale)
            .and_then(|()| active.sink.push_frame(active.next_frame, surface));
        if let Err(e) = captured {
            return Err(self.fail(e));
        }

        active.next_frame = FrameIndex(active.next_frame.0 + 1);
        active.last_progress = Some(progress);
        active.progress_pct = progress_percent(progress);

        if progress < 1.0 {
            return Ok(TickOutcome::Recording {
                progress_pct: active.progress_pct,
            });
        }

        let Some(mut done) = self.active.take() else {
            return Err(PinError::capture("recording vanished while finishing"));
        };
        match done.sink.end() {
            Ok(video) => {
                tracing::info!(
                    frames = video.frame_count,
                    bytes = video.bytes.len(),
                    container = ?video.container,
                    "video recording finished"
                );
                Ok(TickOutcome::Finished(video))
            }
            Err(e) => {
                tracing::warn!(error = %e, "video finalization failed");
                self.failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Abort the current recording, discarding captured frames. Returns `false` when idle.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(mut active) => {
                active.sink.abort();
                tracing::info!(frames = active.next_frame.0, "video recording cancelled");
                true
            }
            None => false,
        }
    }

    fn fail(&mut self, err: PinError) -> PinError {
        if let Some(mut active) = self.active.take() {
            active.sink.abort();
        }
        tracing::warn!(error = %err, "video recording failed");
        self.failure = Some(err.to_string());
        err
    }
}

/// Run a whole recording: start at the clock's current time, then tick on every frame the clock
/// yields until the animation completes.
#[allow(clippy::too_many_arguments)]
pub fn record_zoom_video(
    exporter: &mut VideoExporter,
    sink: Box<dyn FrameSink>,
    clock: &mut dyn FrameClock,
    renderer: &mut FrameRenderer,
    surface: &mut Surface,
    style: &StyleConfig,
    background: BackgroundSource<'_>,
) -> PinResult<EncodedVideo> {
    exporter.start(sink, surface.canvas(), clock.now())?;
    let mut last_pct = 0u8;
    loop {
        let now = clock.next_frame();
        match exporter.tick(now, renderer, surface, style, background)? {
            TickOutcome::Finished(video) => return Ok(video),
            TickOutcome::Recording { progress_pct } => {
                if progress_pct / 10 != last_pct / 10 {
                    tracing::debug!(progress_pct, "recording");
                }
                last_pct = progress_pct;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/video.rs"]
mod tests;
