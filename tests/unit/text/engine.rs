use super::*;
use crate::text::fit::{FitParams, fit_font_size, wrap_text};

fn engine_with_font() -> Option<(TextEngine, ShapingFont)> {
    let book = FontBook::system();
    if book.is_empty() {
        return None;
    }
    let mut engine = TextEngine::new(book);
    let font = engine.font_for("Arial Black, Helvetica, sans-serif").ok()?;
    Some((engine, font))
}

#[test]
fn rejects_non_positive_sizes() {
    let Some((mut engine, font)) = engine_with_font() else {
        return;
    };
    assert!(engine.shape_line(&font, "x", 0.0).is_err());
    assert!(engine.shape_line(&font, "x", f32::NAN).is_err());
    assert_eq!(engine.measure(&font, "x", -1.0), 0.0);
}

#[test]
fn width_grows_with_size_and_text() {
    let Some((mut engine, font)) = engine_with_font() else {
        return;
    };
    let small = engine.measure(&font, "Headline", 40.0);
    let large = engine.measure(&font, "Headline", 80.0);
    let longer = engine.measure(&font, "Headline text", 40.0);
    assert!(small > 0.0);
    assert!(large > small * 1.9 && large < small * 2.1);
    assert!(longer > small);
}

#[test]
fn resolution_is_cached_per_family_list() {
    let Some((mut engine, font)) = engine_with_font() else {
        return;
    };
    let again = engine
        .font_for("Arial Black, Helvetica, sans-serif")
        .expect("cached");
    assert_eq!(font.family, again.family);
}

#[test]
fn real_measurer_drives_fit() {
    let Some((mut engine, font)) = engine_with_font() else {
        return;
    };
    let mut m = engine.measurer(&font);
    let text = "Your Catchy Headline Here";
    let size = fit_font_size(text, 900.0, 825.0, FitParams::default(), &mut m);
    assert!((40..=400).contains(&size));
    let lines = wrap_text(text, 900.0, size as f32, &mut m);
    assert!(!lines.is_empty());
    assert_eq!(lines.join(" "), text);
}
