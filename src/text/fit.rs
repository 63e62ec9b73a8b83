//! Greedy word wrapping and auto-fit font sizing.
//!
//! Both operate purely through a [`TextMeasure`], so they can be driven by real shaped fonts
//! or by a synthetic measurer in tests.

use serde::{Deserialize, Serialize};

/// Width measurement for a single line of text at a given pixel size.
pub trait TextMeasure {
    /// Advance width of `text` laid out on one line at `size_px`.
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &mut T {
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32 {
        (**self).measure_px(text, size_px)
    }
}

/// Search bounds and line spacing for [`fit_font_size`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FitParams {
    /// Smallest size tried; also the result when nothing fits.
    pub min_size_px: u32,
    /// Largest size tried.
    pub max_size_px: u32,
    /// Line advance as a multiple of the font size.
    pub line_height: f32,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            min_size_px: 40,
            max_size_px: 400,
            line_height: 1.2,
        }
    }
}

/// Greedily pack space-separated words into lines narrower than `max_width_px`.
///
/// A line is flushed when appending the next word would make it at least `max_width_px` wide.
/// A word wider than the limit sits alone on its line, unmodified.
pub fn wrap_text(
    text: &str,
    max_width_px: f32,
    size_px: f32,
    measurer: &mut impl TextMeasure,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut words = text.split(' ');
    let mut lines = Vec::new();
    let mut current = words.next().unwrap_or_default().to_owned();
    for word in words {
        let candidate = format!("{current} {word}");
        if measurer.measure_px(&candidate, size_px) < max_width_px {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        }
    }
    lines.push(current);
    lines
}

/// Largest integer size in `[min_size_px, max_size_px]` at which every word fits the width and
/// the wrapped block fits the height. Returns `min_size_px` when no size fits.
pub fn fit_font_size(
    text: &str,
    max_width_px: f32,
    max_height_px: f32,
    params: FitParams,
    measurer: &mut impl TextMeasure,
) -> u32 {
    let mut lo = i64::from(params.min_size_px);
    let mut hi = i64::from(params.max_size_px);
    let mut optimal = params.min_size_px;

    while lo <= hi {
        let mid = (lo + hi) / 2;
        let size = mid as f32;

        let words_fit = text
            .split(' ')
            .all(|word| measurer.measure_px(word, size) <= max_width_px);
        let valid = words_fit && {
            let lines = wrap_text(text, max_width_px, size, measurer);
            block_height(lines.len(), size, params.line_height) <= max_height_px
        };

        if valid {
            optimal = mid as u32;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    optimal
}

/// Total height of `line_count` lines at `size_px`.
pub fn block_height(line_count: usize, size_px: f32, line_height: f32) -> f32 {
    line_count as f32 * size_px * line_height
}

#[cfg(test)]
#[path = "../../tests/unit/text/fit.rs"]
mod tests;
