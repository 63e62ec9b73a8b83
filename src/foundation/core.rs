use crate::foundation::error::{PinError, PinResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// 0-based index of a captured frame within one video export.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PinResult<Self> {
        if den == 0 {
            return Err(PinError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PinError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Exact timestamp of frame `frames` in nanoseconds.
    pub fn frames_to_nanos(self, frames: u64) -> u64 {
        let nanos = u128::from(frames) * 1_000_000_000u128 * u128::from(self.den)
            / u128::from(self.num);
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    /// Duration of one frame.
    pub fn frame_duration(self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.frames_to_nanos(1))
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// The fixed logical pin resolution (2:3). All layout math is done in this space.
    pub const PIN: Canvas = Canvas {
        width: 1000,
        height: 1500,
    };

    /// Reject sizes the raster backend cannot address.
    pub fn validate(self) -> PinResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PinError::layout("canvas width/height must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(PinError::layout("canvas width/height exceeds u16"));
        }
        Ok(())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::PIN
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
