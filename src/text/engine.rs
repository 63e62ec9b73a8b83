use std::collections::HashMap;

use usvg::fontdb;

use crate::foundation::error::{PinError, PinResult};
use crate::text::fit::TextMeasure;
use crate::text::fonts::{FontBook, FontFace};

/// Parley brush. Colors are applied at paint time, so the brush carries nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct GlyphBrush;

/// A face registered with both the shaper and the rasterizer.
#[derive(Clone, Debug)]
pub struct ShapingFont {
    /// Family name the shaper knows the face by.
    pub family: String,
    pub(crate) font: vello_cpu::peniko::FontData,
}

/// One shaped line of text.
pub struct ShapedLine {
    pub(crate) layout: parley::Layout<GlyphBrush>,
    pub(crate) font: vello_cpu::peniko::FontData,
    pub size_px: f32,
}

impl ShapedLine {
    /// Advance width including trailing whitespace.
    pub fn width(&self) -> f32 {
        self.layout.full_width()
    }

    pub fn height(&self) -> f32 {
        self.layout.height()
    }
}

/// Shapes single-line text with Parley against faces resolved from a [`FontBook`].
pub struct TextEngine {
    book: FontBook,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<GlyphBrush>,
    registered: HashMap<fontdb::ID, ShapingFont>,
    resolved: HashMap<String, ShapingFont>,
}

impl TextEngine {
    pub fn new(book: FontBook) -> Self {
        Self {
            book,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    pub fn font_book(&self) -> &FontBook {
        &self.book
    }

    /// Resolve a CSS-like family list to a bold face ready for shaping.
    pub fn font_for(&mut self, family_list: &str) -> PinResult<ShapingFont> {
        if let Some(f) = self.resolved.get(family_list) {
            return Ok(f.clone());
        }
        let face = self.book.resolve(family_list)?;
        let font = self.register(face)?;
        self.resolved.insert(family_list.to_owned(), font.clone());
        Ok(font)
    }

    fn register(&mut self, face: FontFace) -> PinResult<ShapingFont> {
        if let Some(f) = self.registered.get(&face.id) {
            return Ok(f.clone());
        }

        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(face.data.as_ref().clone()),
            None,
        );
        let family_id = families
            .iter()
            .find(|(_, infos)| infos.iter().any(|i| i.index() == face.index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| {
                PinError::font(format!("no font families registered for '{}'", face.family))
            })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PinError::font("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(face.data.as_ref().clone()),
            face.index,
        );
        let out = ShapingFont { family, font };
        self.registered.insert(face.id, out.clone());
        Ok(out)
    }

    /// Shape `text` as a single unwrapped line.
    pub fn shape_line(
        &mut self,
        font: &ShapingFont,
        text: &str,
        size_px: f32,
    ) -> PinResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PinError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(format!(
                "\"{}\"",
                font.family
            ))),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(GlyphBrush));

        let mut layout: parley::Layout<GlyphBrush> = builder.build(text);
        layout.break_all_lines(None);

        Ok(ShapedLine {
            layout,
            font: font.font.clone(),
            size_px,
        })
    }

    /// Width of `text` at `size_px`, or 0 when it cannot be shaped.
    pub fn measure(&mut self, font: &ShapingFont, text: &str, size_px: f32) -> f32 {
        match self.shape_line(font, text, size_px) {
            Ok(line) => line.width(),
            Err(_) => 0.0,
        }
    }

    /// Bind a resolved face to this engine as a [`TextMeasure`].
    pub fn measurer<'a>(&'a mut self, font: &'a ShapingFont) -> FontMeasure<'a> {
        FontMeasure { engine: self, font }
    }
}

/// Measures with a fixed face; feeds the wrap and fit routines.
pub struct FontMeasure<'a> {
    engine: &'a mut TextEngine,
    font: &'a ShapingFont,
}

impl TextMeasure for FontMeasure<'_> {
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32 {
        self.engine.measure(self.font, text, size_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/engine.rs"]
mod tests;
