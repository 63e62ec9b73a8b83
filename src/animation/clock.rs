use std::time::{Duration, Instant};

use crate::foundation::core::Fps;

/// Source of animation ticks, standing in for a display-refresh callback.
///
/// Times are offsets from the clock's own origin.
pub trait FrameClock {
    /// Current time on this clock.
    fn now(&self) -> Duration;
    /// Wait for the next frame boundary and return its time.
    fn next_frame(&mut self) -> Duration;
}

/// Deterministic clock that advances exactly one frame per call.
#[derive(Clone, Copy, Debug)]
pub struct FixedStepClock {
    fps: Fps,
    frame: u64,
}

impl FixedStepClock {
    pub fn new(fps: Fps) -> Self {
        Self { fps, frame: 0 }
    }
}

impl FrameClock for FixedStepClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.fps.frames_to_nanos(self.frame))
    }

    fn next_frame(&mut self) -> Duration {
        let t = self.now();
        self.frame += 1;
        t
    }
}

/// Real-time clock that sleeps to the next frame boundary. Frames are dropped, not queued, when
/// the caller falls behind, so the total count is best effort.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    origin: Instant,
    fps: Fps,
    next: u64,
}

impl WallClock {
    pub fn new(fps: Fps) -> Self {
        Self {
            origin: Instant::now(),
            fps,
            next: 0,
        }
    }
}

impl FrameClock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn next_frame(&mut self) -> Duration {
        let target = Duration::from_nanos(self.fps.frames_to_nanos(self.next));
        let elapsed = self.now();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
        let now = self.now();
        let frame_nanos = self.fps.frames_to_nanos(1).max(1);
        let reached = u64::try_from(now.as_nanos() / u128::from(frame_nanos)).unwrap_or(u64::MAX);
        self.next = reached.saturating_add(1).max(self.next + 1);
        now
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/clock.rs"]
mod tests;
