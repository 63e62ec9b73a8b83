use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Affine, Canvas, Point, Rect};
use crate::foundation::error::{PinError, PinResult};
use crate::render::background::{
    BackgroundSource, DecodedImage, check_dimensions, cover_rect, paint_fallback,
};
use crate::render::blur::{blur_alpha_scaled, radius_for_sigma};
use crate::render::composite::{
    desaturate_with_black_in_place, fill_over_in_place, over_region_in_place, tint_coverage_over,
};
use crate::render::layout::{
    BRAND_FONT_PX, BRAND_SHADOW, CTA_SHADOW, DropShadow, HEADLINE_MITER_LIMIT, HEADLINE_SHADOW,
    brand_center, layout_cta, layout_headline, scheme_effect,
};
use crate::render::surface::Surface;
use crate::style::color::Color;
use crate::style::config::StyleConfig;
use crate::text::engine::{GlyphBrush, ShapedLine, TextEngine};
use crate::text::fit::FitParams;
use crate::text::fonts::FontBook;

/// Tunables carried by a [`FrameRenderer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameRendererOpts {
    pub fit: FitParams,
}

/// Scratch buffers retained across layers and frames.
const MAX_SCRATCH: usize = 8;
/// Glyph ink may overhang the advance box by this fraction of the font size.
const GLYPH_OVERHANG: f64 = 0.3;

/// Draws complete pin frames onto a [`Surface`].
///
/// Each element is rasterized with `vello_cpu` into a scratch layer the size of its own bounds
/// and then composited on the CPU, which is where drop shadows, the tint and the monochrome
/// blend happen.
pub struct FrameRenderer {
    text: TextEngine,
    opts: FrameRendererOpts,
    scratch: Vec<Scratch>,
    image_paint: Option<(u64, vello_cpu::Image)>,
}

struct Scratch {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

/// Half-open pixel rect in surface space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PixelRect {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelRect {
    fn full(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width,
            y1: height,
        }
    }

    /// Pixels touched by `r` grown by `pad`, clipped to a `width x height` surface.
    fn covering(r: Rect, pad: f64, width: u32, height: u32) -> Option<Self> {
        if !r.is_finite() || !pad.is_finite() {
            return None;
        }
        let x0 = (r.x0 - pad).floor().max(0.0);
        let y0 = (r.y0 - pad).floor().max(0.0);
        let x1 = (r.x1 + pad).ceil().min(f64::from(width));
        let y1 = (r.y1 + pad).ceil().min(f64::from(height));
        if !(x0 < x1 && y0 < y1) {
            return None;
        }
        Some(Self {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }

    fn union(self, other: Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    fn width(self) -> u32 {
        self.x1 - self.x0
    }

    fn height(self) -> u32 {
        self.y1 - self.y0
    }
}

struct PlacedLine {
    shaped: ShapedLine,
    center: Point,
}

impl PlacedLine {
    /// Top-left of the line's layout box.
    fn origin(&self) -> (f64, f64) {
        let shaped = &self.shaped;
        (
            self.center.x - f64::from(shaped.width()) / 2.0,
            self.center.y - middle_offset(&shaped.layout),
        )
    }

    fn ink_rect(&self, extra_pad: f64, width: u32, height: u32) -> Option<PixelRect> {
        let (x, y) = self.origin();
        let bx = Rect::new(
            x,
            y,
            x + f64::from(self.shaped.width()),
            y + f64::from(self.shaped.height()),
        );
        let pad = f64::from(self.shaped.size_px) * GLYPH_OVERHANG + extra_pad + 2.0;
        PixelRect::covering(bx, pad, width, height)
    }
}

struct HeadlinePlan {
    lines: Vec<PlacedLine>,
    stroke: vello_cpu::kurbo::Stroke,
    stroke_rect: PixelRect,
    fill_rect: PixelRect,
}

struct CtaPlan {
    button: vello_cpu::kurbo::BezPath,
    button_rect: Option<PixelRect>,
    label: PlacedLine,
    label_rect: Option<PixelRect>,
}

struct BrandPlan {
    line: PlacedLine,
    rect: PixelRect,
}

struct ImagePlan {
    paint: vello_cpu::Image,
    transform: Affine,
    size: (f64, f64),
}

impl FrameRenderer {
    pub fn new(fonts: FontBook) -> Self {
        Self::with_opts(fonts, FrameRendererOpts::default())
    }

    pub fn with_opts(fonts: FontBook, opts: FrameRendererOpts) -> Self {
        Self {
            text: TextEngine::new(fonts),
            opts,
            scratch: Vec::new(),
            image_paint: None,
        }
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Overwrite `surface` with one frame.
    ///
    /// Text is shaped and the background image prepared before the surface is touched, so on
    /// error the previous contents survive. Errors only for unusable surface sizes, unusable
    /// background images, or when non-empty text has no font to draw with.
    #[tracing::instrument(level = "trace", skip_all, fields(zoom = zoom))]
    pub fn render_frame(
        &mut self,
        surface: &mut Surface,
        style: &StyleConfig,
        background: BackgroundSource<'_>,
        zoom: f64,
    ) -> PinResult<()> {
        let canvas = surface.canvas();
        canvas.validate()?;
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(PinError::validation(format!(
                "zoom scale must be finite and > 0, got {zoom}"
            )));
        }
        let fx = scheme_effect(style);

        let image = match background {
            BackgroundSource::Image(img) => Some(self.plan_image(img, canvas, zoom)?),
            BackgroundSource::Fallback => None,
        };
        let headline = self.plan_headline(style, canvas)?;
        let cta = self.plan_cta(style, canvas)?;
        let brand = self.plan_brand(style, canvas)?;

        surface.clear();
        match &image {
            Some(plan) => self.paint_image(surface, plan)?,
            None => paint_fallback(surface, zoom),
        }

        if fx.desaturate {
            desaturate_with_black_in_place(surface.data_mut());
        }
        fill_over_in_place(
            surface.data_mut(),
            Color::black_alpha(fx.overlay_alpha).to_rgba8_premul(),
        );

        if let Some(plan) = &headline {
            // Outlines of every line sit under every fill.
            self.paint_layer(surface, plan.stroke_rect, None, |ctx, origin| {
                ctx.set_stroke(plan.stroke.clone());
                for line in &plan.lines {
                    draw_line(ctx, origin, line, fx.outline_color, true);
                }
            })?;
            self.paint_layer(
                surface,
                plan.fill_rect,
                Some(HEADLINE_SHADOW),
                |ctx, origin| {
                    for line in &plan.lines {
                        draw_line(ctx, origin, line, fx.text_color, false);
                    }
                },
            )?;
        }

        if let Some(plan) = &cta {
            if let Some(rect) = plan.button_rect {
                self.paint_layer(surface, rect, Some(CTA_SHADOW), |ctx, origin| {
                    ctx.set_transform(origin);
                    ctx.set_paint(style.cta_bg_color.to_vello());
                    ctx.fill_path(&plan.button);
                })?;
            }
            if let Some(rect) = plan.label_rect {
                self.paint_layer(surface, rect, None, |ctx, origin| {
                    draw_line(ctx, origin, &plan.label, style.cta_text_color, false);
                })?;
            }
        }

        if let Some(plan) = &brand {
            self.paint_layer(surface, plan.rect, Some(BRAND_SHADOW), |ctx, origin| {
                draw_line(ctx, origin, &plan.line, style.brand_color, false);
            })?;
        }

        Ok(())
    }

    fn plan_image(&mut self, img: &DecodedImage, canvas: Canvas, zoom: f64) -> PinResult<ImagePlan> {
        check_dimensions(img.width, img.height)?;
        let paint = self.image_paint_for(img)?;
        let (iw, ih) = (f64::from(img.width), f64::from(img.height));
        let dst = cover_rect(
            f64::from(canvas.width),
            f64::from(canvas.height),
            iw,
            ih,
            zoom,
        );
        let scale = dst.width() / iw;
        Ok(ImagePlan {
            paint,
            transform: Affine::translate((dst.x0, dst.y0)) * Affine::scale(scale),
            size: (iw, ih),
        })
    }

    fn plan_headline(
        &mut self,
        style: &StyleConfig,
        canvas: Canvas,
    ) -> PinResult<Option<HeadlinePlan>> {
        if style.headline.is_empty() {
            return Ok(None);
        }
        let font = self.text.font_for(&style.font_family)?;
        let layout = {
            let mut m = self.text.measurer(&font);
            layout_headline(&style.headline, canvas, style.text_y_pos, self.opts.fit, &mut m)
        };
        let Some(layout) = layout else {
            return Ok(None);
        };
        tracing::debug!(
            size_px = layout.size_px,
            lines = layout.lines.len(),
            "headline fitted"
        );

        let mut lines = Vec::with_capacity(layout.lines.len());
        for (text, &y) in layout.lines.iter().zip(&layout.line_centers) {
            lines.push(PlacedLine {
                shaped: self.text.shape_line(&font, text, layout.size_px as f32)?,
                center: Point::new(layout.center_x, y),
            });
        }
        let stroke_width = layout.stroke_width();
        let (Some(stroke_rect), Some(fill_rect)) = (
            union_rects(&lines, stroke_width, canvas),
            union_rects(&lines, 0.0, canvas),
        ) else {
            return Ok(None);
        };
        let stroke = vello_cpu::kurbo::Stroke::new(stroke_width)
            .with_join(vello_cpu::kurbo::Join::Round)
            .with_miter_limit(HEADLINE_MITER_LIMIT);
        Ok(Some(HeadlinePlan {
            lines,
            stroke,
            stroke_rect,
            fill_rect,
        }))
    }

    fn plan_cta(&mut self, style: &StyleConfig, canvas: Canvas) -> PinResult<Option<CtaPlan>> {
        if style.cta_text.is_empty() {
            return Ok(None);
        }
        let font = self.text.font_for(&style.font_family)?;
        let layout = {
            let mut m = self.text.measurer(&font);
            layout_cta(&style.cta_text, canvas, &mut m)
        };
        let Some(layout) = layout else {
            return Ok(None);
        };
        tracing::debug!(label_size_px = layout.label_size_px, "cta laid out");

        let rr = kurbo::RoundedRect::from_rect(layout.button, layout.corner_radius);
        let mut button = vello_cpu::kurbo::BezPath::new();
        for el in kurbo::Shape::path_elements(&rr, 0.1) {
            button.push(el);
        }
        let label = PlacedLine {
            shaped: self
                .text
                .shape_line(&font, &style.cta_text, layout.label_size_px)?,
            center: layout.label_center,
        };
        Ok(Some(CtaPlan {
            button,
            button_rect: PixelRect::covering(layout.button, 2.0, canvas.width, canvas.height),
            label_rect: label.ink_rect(0.0, canvas.width, canvas.height),
            label,
        }))
    }

    fn plan_brand(&mut self, style: &StyleConfig, canvas: Canvas) -> PinResult<Option<BrandPlan>> {
        if style.brand_text.is_empty() {
            return Ok(None);
        }
        let font = self.text.font_for(&style.font_family)?;
        let line = PlacedLine {
            shaped: self.text.shape_line(&font, &style.brand_text, BRAND_FONT_PX)?,
            center: brand_center(canvas, !style.cta_text.is_empty()),
        };
        Ok(line
            .ink_rect(0.0, canvas.width, canvas.height)
            .map(|rect| BrandPlan { line, rect }))
    }

    fn paint_image(&mut self, surface: &mut Surface, plan: &ImagePlan) -> PinResult<()> {
        let rect = PixelRect::full(surface.width(), surface.height());
        let (iw, ih) = plan.size;
        self.paint_layer(surface, rect, None, |ctx, origin| {
            ctx.set_transform(origin * affine_to_cpu(plan.transform));
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(plan.paint.clone());
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
        })
    }

    fn image_paint_for(&mut self, img: &DecodedImage) -> PinResult<vello_cpu::Image> {
        if let Some((id, paint)) = &self.image_paint
            && *id == img.id()
        {
            return Ok(paint.clone());
        }
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.image_paint = Some((img.id(), paint.clone()));
        Ok(paint)
    }

    /// Rasterize `draw` into a scratch layer covering `rect`, drop its shadow (if any) onto
    /// `surface`, then composite the layer itself over `surface`.
    ///
    /// `draw` receives the transform mapping surface space into the layer.
    fn paint_layer(
        &mut self,
        surface: &mut Surface,
        rect: PixelRect,
        shadow: Option<DropShadow>,
        draw: impl FnOnce(&mut vello_cpu::RenderContext, vello_cpu::kurbo::Affine),
    ) -> PinResult<()> {
        let w16: u16 = rect
            .width()
            .try_into()
            .map_err(|_| PinError::layout("layer width exceeds u16"))?;
        let h16: u16 = rect
            .height()
            .try_into()
            .map_err(|_| PinError::layout("layer height exceeds u16"))?;

        let mut scratch = self.take_scratch(w16, h16);
        let origin = vello_cpu::kurbo::Affine::translate((
            -f64::from(rect.x0),
            -f64::from(rect.y0),
        ));
        scratch.ctx.reset();
        draw(&mut scratch.ctx, origin);
        scratch.ctx.flush();
        scratch.pixmap.data_as_u8_slice_mut().fill(0);
        scratch.ctx.render_to_pixmap(&mut scratch.pixmap);

        let layer = scratch.pixmap.data_as_u8_slice();
        let res = (|| {
            if let Some(shadow) = shadow {
                drop_shadow(surface, layer, rect, shadow)?;
            }
            let dst_w = surface.width();
            over_region_in_place(
                surface.data_mut(),
                dst_w,
                layer,
                rect.width(),
                rect.height(),
                rect.x0,
                rect.y0,
            )
        })();

        self.put_scratch(scratch);
        res
    }

    fn take_scratch(&mut self, w: u16, h: u16) -> Scratch {
        match self
            .scratch
            .iter()
            .position(|s| s.pixmap.width() == w && s.pixmap.height() == h)
        {
            Some(i) => self.scratch.swap_remove(i),
            None => Scratch {
                ctx: vello_cpu::RenderContext::new(w, h),
                pixmap: vello_cpu::Pixmap::new(w, h),
            },
        }
    }

    fn put_scratch(&mut self, scratch: Scratch) {
        if self.scratch.len() >= MAX_SCRATCH {
            self.scratch.remove(0);
        }
        self.scratch.push(scratch);
    }
}

fn union_rects(lines: &[PlacedLine], extra_pad: f64, canvas: Canvas) -> Option<PixelRect> {
    lines
        .iter()
        .filter_map(|l| l.ink_rect(extra_pad, canvas.width, canvas.height))
        .reduce(PixelRect::union)
}

fn draw_line(
    ctx: &mut vello_cpu::RenderContext,
    origin: vello_cpu::kurbo::Affine,
    line: &PlacedLine,
    color: Color,
    stroke: bool,
) {
    let shaped = &line.shaped;
    let (tx, ty) = line.origin();
    ctx.set_transform(origin * vello_cpu::kurbo::Affine::translate((tx, ty)));
    ctx.set_paint(color.to_vello());

    for l in shaped.layout.lines() {
        for item in l.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx.glyph_run(&shaped.font).font_size(run.run().font_size());
            if stroke {
                builder.stroke_glyphs(glyphs);
            } else {
                builder.fill_glyphs(glyphs);
            }
        }
    }
}

/// Distance from the layout's top to the middle of its first line's ascent/descent box.
fn middle_offset(layout: &parley::Layout<GlyphBrush>) -> f64 {
    match layout.lines().next() {
        Some(line) => {
            let m = line.metrics();
            f64::from(m.baseline + (m.descent - m.ascent) / 2.0)
        }
        None => f64::from(layout.height()) / 2.0,
    }
}

/// Blur the layer's coverage inside its bounding box (padded by the kernel radius) and
/// composite it, offset and tinted, under whatever comes next. `layer` covers `rect`.
fn drop_shadow(
    surface: &mut Surface,
    layer: &[u8],
    rect: PixelRect,
    shadow: DropShadow,
) -> PinResult<()> {
    let (w, h) = (surface.width(), surface.height());
    let lw = rect.width();
    let Some((x0, y0, x1, y1)) = coverage_bounds(layer, lw, rect.height()) else {
        return Ok(());
    };

    let sigma = (shadow.blur / 2.0) as f32;
    let r = radius_for_sigma(sigma);
    let bw = (x1 - x0 + 1) + 2 * r;
    let bh = (y1 - y0 + 1) + 2 * r;
    let mut coverage = vec![0u8; (bw as usize) * (bh as usize)];
    for y in y0..=y1 {
        let src_row = (y as usize) * (lw as usize);
        let dst_row = ((y - y0 + r) as usize) * (bw as usize);
        for x in x0..=x1 {
            coverage[dst_row + (x - x0 + r) as usize] = layer[(src_row + x as usize) * 4 + 3];
        }
    }
    let blurred = blur_alpha_scaled(&coverage, bw, bh, sigma)?;

    let ox = i64::from(rect.x0 + x0) - i64::from(r) + shadow.offset_x.round() as i64;
    let oy = i64::from(rect.y0 + y0) - i64::from(r) + shadow.offset_y.round() as i64;
    tint_coverage_over(
        surface.data_mut(),
        w,
        h,
        &blurred,
        bw,
        bh,
        ox,
        oy,
        shadow.color.to_rgba8_premul(),
    )
}

/// Inclusive bounds of pixels with non-zero alpha.
fn coverage_bounds(rgba: &[u8], width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..height {
        let row = &rgba[(y as usize) * (width as usize) * 4..(y as usize + 1) * (width as usize) * 4];
        let mut first = None;
        let mut last = 0u32;
        for (x, px) in row.chunks_exact(4).enumerate() {
            if px[3] != 0 {
                first.get_or_insert(x as u32);
                last = x as u32;
            }
        }
        if let Some(first) = first {
            bounds = Some(match bounds {
                None => (first, y, last, y),
                Some((bx0, by0, bx1, _)) => (bx0.min(first), by0, bx1.max(last), y),
            });
        }
    }
    bounds
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> PinResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PinError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PinError::validation("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PinError::validation("image byte len mismatch"));
    }
    let mut pixels = Vec::<vello_cpu::peniko::color::PremulRgba8>::with_capacity(
        (width as usize) * (height as usize),
    );
    for px in bytes.chunks_exact(4) {
        pixels.push(vello_cpu::peniko::color::PremulRgba8::from_u8_array([
            px[0], px[1], px[2], px[3],
        ]));
    }
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
