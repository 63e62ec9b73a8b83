use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Fps;
use crate::foundation::error::{PinError, PinResult};

/// Linear "zoom to rest" curve used by video export.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoomAnimation {
    /// Background magnification at progress 0.
    pub start_scale: f64,
    /// Magnification at progress 1.
    pub end_scale: f64,
    pub duration_ms: u64,
    /// Capture frame rate (frames per second).
    pub fps: u32,
}

impl Default for ZoomAnimation {
    fn default() -> Self {
        Self {
            start_scale: 1.15,
            end_scale: 1.0,
            duration_ms: 8000,
            fps: 30,
        }
    }
}

impl ZoomAnimation {
    pub fn validate(&self) -> PinResult<()> {
        for (name, v) in [("startScale", self.start_scale), ("endScale", self.end_scale)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(PinError::validation(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
        }
        if self.duration_ms == 0 {
            return Err(PinError::validation("durationMs must be > 0"));
        }
        Fps::new(self.fps, 1)?;
        Ok(())
    }

    pub fn frame_rate(&self) -> PinResult<Fps> {
        Fps::new(self.fps, 1)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// `elapsed / duration`, clamped to `[0, 1]`.
    pub fn progress_at(&self, elapsed: Duration) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (elapsed.as_secs_f64() * 1000.0 / self.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// Interpolated scale; `progress` is clamped to `[0, 1]`.
    pub fn scale_at(&self, progress: f64) -> f64 {
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        self.start_scale - (self.start_scale - self.end_scale) * p
    }

    /// Frames a fixed-step clock produces: one per frame boundary in `[0, duration]`.
    pub fn fixed_step_frame_count(&self) -> PinResult<u64> {
        let fps = self.frame_rate()?;
        let nanos = u128::from(self.duration_ms) * 1_000_000;
        let frames = nanos * u128::from(fps.num) / (1_000_000_000u128 * u128::from(fps.den));
        Ok(u64::try_from(frames).unwrap_or(u64::MAX).saturating_add(1))
    }
}

/// Progress as a whole percentage.
pub fn progress_percent(progress: f64) -> u8 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/animation/zoom.rs"]
mod tests;
