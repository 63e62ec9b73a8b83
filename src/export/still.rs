use std::io::Cursor;

use anyhow::Context as _;

use crate::encode::sink::Container;
use crate::foundation::error::{PinError, PinResult};
use crate::render::surface::Surface;

/// Headline characters that go into a file-name slug.
pub const SLUG_SOURCE_CHARS: usize = 20;

/// Lossless still image, ready to save or publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StillImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl StillImage {
    pub fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

/// Encode the surface's current pixels as PNG. Does not render.
pub fn encode_png(surface: &Surface) -> PinResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(
        surface.width(),
        surface.height(),
        surface.to_straight_rgba8(),
    )
    .ok_or_else(|| PinError::validation("surface buffer does not match its size"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// PNG bytes of the surface plus the file name derived from `headline`.
pub fn export_still(surface: &Surface, headline: &str) -> PinResult<StillImage> {
    Ok(StillImage {
        file_name: still_file_name(headline),
        bytes: encode_png(surface)?,
    })
}

/// First 20 characters of the headline, ASCII letters and digits kept (lowercased),
/// everything else replaced by `-`.
pub fn headline_slug(headline: &str) -> String {
    headline
        .chars()
        .take(SLUG_SOURCE_CHARS)
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

pub fn still_file_name(headline: &str) -> String {
    format!("pin-{}.png", headline_slug(headline))
}

pub fn video_file_name(headline: &str, container: Container) -> String {
    format!("pin-video-{}.{}", headline_slug(headline), container.extension())
}

#[cfg(test)]
#[path = "../../tests/unit/export/still.rs"]
mod tests;
