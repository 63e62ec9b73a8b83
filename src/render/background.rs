use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use crate::foundation::core::Rect;
use crate::foundation::error::{PinError, PinResult};
use crate::render::surface::Surface;
use crate::style::color::Color;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// A decoded background image in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    id: u64,
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Decode PNG/JPEG/WebP/... bytes.
    ///
    /// Images with a zero side or a side above 65535 px are rejected before the pixels are
    /// decoded; the rasterizer cannot sample them.
    pub fn decode(bytes: &[u8]) -> PinResult<Self> {
        let (w, h) = image::ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .context("sniff image format")?
            .into_dimensions()
            .context("read image dimensions")?;
        check_dimensions(w, h)?;

        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);

        Ok(Self::from_premul(width, height, rgba8_premul))
    }

    pub(crate) fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> Self {
        Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }

    /// Process-unique id; stable across clones of the same decode.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Background images must fit the rasterizer's u16 pixmap sides.
pub fn check_dimensions(width: u32, height: u32) -> PinResult<()> {
    if width == 0 || height == 0 {
        return Err(PinError::validation("background image has zero size"));
    }
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
        return Err(PinError::validation(format!(
            "background image {width}x{height} exceeds 65535 px per side"
        )));
    }
    Ok(())
}

/// What the renderer paints behind the text.
#[derive(Clone, Copy, Debug)]
pub enum BackgroundSource<'a> {
    Image(&'a DecodedImage),
    /// No usable image: paint the procedural gradient.
    Fallback,
}

impl<'a> From<Option<&'a DecodedImage>> for BackgroundSource<'a> {
    fn from(img: Option<&'a DecodedImage>) -> Self {
        match img {
            Some(img) => Self::Image(img),
            None => Self::Fallback,
        }
    }
}

pub const FALLBACK_FROM: Color = Color::rgba(248.0 / 255.0, 113.0 / 255.0, 113.0 / 255.0, 1.0);
pub const FALLBACK_TO: Color = Color::rgba(192.0 / 255.0, 38.0 / 255.0, 211.0 / 255.0, 1.0);
const HAIRLINE_SPACING: f64 = 20.0;
const HAIRLINE_ALPHA: f64 = 0.1;

/// Destination rect of a cover-fit image scaled by `zoom` about the canvas center.
pub fn cover_rect(width: f64, height: f64, img_w: f64, img_h: f64, zoom: f64) -> Rect {
    let base = (width / img_w).max(height / img_h);
    let scale = base * zoom;
    let w = img_w * scale;
    let h = img_h * scale;
    let x = (width - w) / 2.0;
    let y = (height - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Paint the diagonal gradient with its vertical hairline texture, magnified by `zoom`
/// about the canvas center. Pixels outside the scaled rect are left untouched.
pub fn paint_fallback(surface: &mut Surface, zoom: f64) {
    let (w, h) = (f64::from(surface.width()), f64::from(surface.height()));
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    let (cx, cy) = (w / 2.0, h / 2.0);
    let len2 = w * w + h * h;

    let from = FALLBACK_FROM.to_rgba8();
    let to = FALLBACK_TO.to_rgba8();
    let line = Color::rgba(1.0, 1.0, 1.0, HAIRLINE_ALPHA).to_rgba8_premul().to_array();

    let width = surface.width() as usize;
    for (y, row) in surface.data_mut().chunks_exact_mut(width * 4).enumerate() {
        let uy = cy + (y as f64 + 0.5 - cy) / zoom;
        if !(0.0..h).contains(&uy) {
            continue;
        }
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let ux = cx + (x as f64 + 0.5 - cx) / zoom;
            if !(0.0..w).contains(&ux) {
                continue;
            }
            let t = ((ux * w + uy * h) / len2).clamp(0.0, 1.0);
            let mut out = [
                lerp_u8(from[0], to[0], t),
                lerp_u8(from[1], to[1], t),
                lerp_u8(from[2], to[2], t),
                255,
            ];
            if ux.rem_euclid(HAIRLINE_SPACING) < 1.0 {
                out = crate::render::composite::over(out, line, 1.0);
            }
            px.copy_from_slice(&out);
        }
    }
}

fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/background.rs"]
mod tests;
