//! Pure frame geometry: where each block goes and which colors the scheme forces.
//!
//! Nothing here touches pixels, so every placement rule can be checked with a synthetic
//! measurer.

use crate::foundation::core::{Canvas, Point, Rect};
use crate::style::color::Color;
use crate::style::config::{ColorScheme, StyleConfig};
use crate::text::fit::{FitParams, TextMeasure, fit_font_size, wrap_text};

pub const HEADLINE_MAX_WIDTH_FRAC: f64 = 0.9;
pub const HEADLINE_MAX_HEIGHT_FRAC: f64 = 0.55;
pub const HEADLINE_STROKE_FRAC: f64 = 0.25;
pub const HEADLINE_MITER_LIMIT: f64 = 2.0;

pub const CTA_CENTER_FRAC: f64 = 0.92;
pub const CTA_WIDTH_FRAC: f64 = 0.9;
pub const CTA_HEIGHT_PX: f64 = 120.0;
pub const CTA_FONT_PX: f32 = 45.0;
pub const CTA_LABEL_WIDTH_FRAC: f64 = 0.9;
pub const CTA_LABEL_DROP_PX: f64 = 4.0;

pub const BRAND_FONT_PX: f32 = 24.0;
pub const BRAND_ABOVE_CTA_PX: f64 = 80.0;
pub const BRAND_BOTTOM_MARGIN_PX: f64 = 40.0;

/// Canvas-style drop shadow: blurred copy of the shape's coverage, offset and tinted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropShadow {
    pub color: Color,
    /// Blur amount; the gaussian sigma is half of it.
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

pub const HEADLINE_SHADOW: DropShadow = DropShadow {
    color: Color::rgba(0.0, 0.0, 0.0, 0.5),
    blur: 20.0,
    offset_x: 0.0,
    offset_y: 10.0,
};

pub const CTA_SHADOW: DropShadow = DropShadow {
    color: Color::rgba(0.0, 0.0, 0.0, 0.4),
    blur: 15.0,
    offset_x: 0.0,
    offset_y: 8.0,
};

pub const BRAND_SHADOW: DropShadow = DropShadow {
    color: Color::rgba(0.0, 0.0, 0.0, 0.8),
    blur: 10.0,
    offset_x: 0.0,
    offset_y: 0.0,
};

/// Colors and passes implied by a [`ColorScheme`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchemeEffect {
    pub overlay_alpha: f64,
    pub desaturate: bool,
    pub text_color: Color,
    pub outline_color: Color,
}

pub fn scheme_effect(style: &StyleConfig) -> SchemeEffect {
    match style.color_scheme {
        ColorScheme::Standard => SchemeEffect {
            overlay_alpha: 0.2,
            desaturate: false,
            text_color: style.text_color,
            outline_color: style.outline_color,
        },
        ColorScheme::DarkOverlay => SchemeEffect {
            overlay_alpha: 0.6,
            desaturate: false,
            text_color: Color::WHITE,
            outline_color: style.outline_color,
        },
        ColorScheme::Monochrome => SchemeEffect {
            overlay_alpha: 0.2,
            desaturate: true,
            text_color: Color::WHITE,
            outline_color: Color::BLACK,
        },
    }
}

/// Wrapped headline with the chosen size and per-line vertical centers.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlineLayout {
    pub size_px: u32,
    pub lines: Vec<String>,
    pub line_height_px: f64,
    pub center_x: f64,
    /// Center of the whole block.
    pub center_y: f64,
    pub line_centers: Vec<f64>,
}

impl HeadlineLayout {
    pub fn stroke_width(&self) -> f64 {
        f64::from(self.size_px) * HEADLINE_STROKE_FRAC
    }
}

pub fn layout_headline(
    text: &str,
    canvas: Canvas,
    text_y_pos: f64,
    params: FitParams,
    measurer: &mut impl TextMeasure,
) -> Option<HeadlineLayout> {
    if text.is_empty() {
        return None;
    }
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let max_width = (w * HEADLINE_MAX_WIDTH_FRAC) as f32;
    let max_height = (h * HEADLINE_MAX_HEIGHT_FRAC) as f32;

    let size_px = fit_font_size(text, max_width, max_height, params, &mut *measurer);
    let lines = wrap_text(text, max_width, size_px as f32, &mut *measurer);

    let line_height_px = f64::from(size_px) * f64::from(params.line_height);
    let center_y = h * (text_y_pos / 100.0);
    let first = center_y - (lines.len() as f64 * line_height_px) / 2.0 + line_height_px / 2.0;
    let line_centers = (0..lines.len())
        .map(|i| first + i as f64 * line_height_px)
        .collect();

    Some(HeadlineLayout {
        size_px,
        lines,
        line_height_px,
        center_x: w / 2.0,
        center_y,
        line_centers,
    })
}

/// Pill button geometry plus its single-line label.
#[derive(Clone, Debug, PartialEq)]
pub struct CtaLayout {
    pub button: Rect,
    pub corner_radius: f64,
    pub label_size_px: f32,
    pub label_center: Point,
}

pub fn layout_cta(text: &str, canvas: Canvas, measurer: &mut impl TextMeasure) -> Option<CtaLayout> {
    if text.is_empty() {
        return None;
    }
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let center_y = h * CTA_CENTER_FRAC;
    let btn_w = w * CTA_WIDTH_FRAC;
    let x0 = (w - btn_w) / 2.0;
    let y0 = center_y - CTA_HEIGHT_PX / 2.0;
    let button = Rect::new(x0, y0, x0 + btn_w, y0 + CTA_HEIGHT_PX);

    let measured = measurer.measure_px(text, CTA_FONT_PX);
    let max_text = (btn_w * CTA_LABEL_WIDTH_FRAC) as f32;
    let label_size_px = if measured > max_text {
        CTA_FONT_PX * (max_text / measured)
    } else {
        CTA_FONT_PX
    };

    Some(CtaLayout {
        button,
        corner_radius: clamp_corner_radius(btn_w, CTA_HEIGHT_PX, CTA_HEIGHT_PX / 2.0),
        label_size_px,
        label_center: Point::new(w / 2.0, center_y + CTA_LABEL_DROP_PX),
    })
}

/// Corner radius no larger than half of either side.
pub fn clamp_corner_radius(width: f64, height: f64, radius: f64) -> f64 {
    radius.min(width / 2.0).min(height / 2.0).max(0.0)
}

/// Center of the brand line; it stacks above the button when one is drawn.
pub fn brand_center(canvas: Canvas, has_cta: bool) -> Point {
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let y = if has_cta {
        h * CTA_CENTER_FRAC - BRAND_ABOVE_CTA_PX
    } else {
        h - BRAND_BOTTOM_MARGIN_PX
    };
    Point::new(w / 2.0, y)
}

#[cfg(test)]
#[path = "../../tests/unit/render/layout.rs"]
mod tests;
