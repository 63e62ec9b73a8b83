use super::*;

/// Every char advances `ratio * size` pixels.
struct FixedAdvance(f32);

impl TextMeasure for FixedAdvance {
    fn measure_px(&mut self, text: &str, size_px: f32) -> f32 {
        text.chars().count() as f32 * self.0 * size_px
    }
}

fn style_with(scheme: ColorScheme) -> StyleConfig {
    StyleConfig {
        text_color: Color::parse("#123456").unwrap(),
        outline_color: Color::parse("#abcdef").unwrap(),
        color_scheme: scheme,
        ..StyleConfig::default()
    }
}

#[test]
fn standard_scheme_keeps_configured_colors() {
    let style = style_with(ColorScheme::Standard);
    let fx = scheme_effect(&style);
    assert_eq!(fx.overlay_alpha, 0.2);
    assert!(!fx.desaturate);
    assert_eq!(fx.text_color, style.text_color);
    assert_eq!(fx.outline_color, style.outline_color);
}

#[test]
fn dark_overlay_forces_white_text_only() {
    let style = style_with(ColorScheme::DarkOverlay);
    let fx = scheme_effect(&style);
    assert_eq!(fx.overlay_alpha, 0.6);
    assert_eq!(fx.text_color, Color::WHITE);
    assert_eq!(fx.outline_color, style.outline_color);
}

#[test]
fn monochrome_desaturates_and_forces_both_colors() {
    let fx = scheme_effect(&style_with(ColorScheme::Monochrome));
    assert!(fx.desaturate);
    assert_eq!(fx.overlay_alpha, 0.2);
    assert_eq!(fx.text_color, Color::WHITE);
    assert_eq!(fx.outline_color, Color::BLACK);
}

#[test]
fn headline_scenario_on_pin_canvas() {
    let mut m = FixedAdvance(0.6);
    let hl = layout_headline(
        "Your Catchy Headline Here",
        Canvas::PIN,
        45.0,
        FitParams::default(),
        &mut m,
    )
    .unwrap();

    assert_eq!(hl.size_px, 171);
    assert_eq!(hl.lines, vec!["Your", "Catchy", "Headline", "Here"]);
    assert_eq!(hl.center_x, 500.0);
    assert_eq!(hl.center_y, 675.0);
    assert!((hl.line_height_px - 205.2).abs() < 1e-3);
    assert!((hl.stroke_width() - 42.75).abs() < 1e-9);

    // Block fits 900x825 and is centered on y=675.
    assert!(hl.lines.len() as f64 * hl.line_height_px <= 825.0);
    let mean = hl.line_centers.iter().sum::<f64>() / hl.line_centers.len() as f64;
    assert!((mean - 675.0).abs() < 1e-6);
    for pair in hl.line_centers.windows(2) {
        assert!((pair[1] - pair[0] - hl.line_height_px).abs() < 1e-6);
    }
}

#[test]
fn single_line_headline_sits_on_anchor() {
    let mut m = FixedAdvance(0.01);
    let hl = layout_headline("Hi", Canvas::PIN, 20.0, FitParams::default(), &mut m).unwrap();
    assert_eq!(hl.size_px, 400);
    assert_eq!(hl.line_centers.len(), 1);
    assert!((hl.line_centers[0] - 300.0).abs() < 1e-6);
}

#[test]
fn empty_blocks_are_skipped() {
    let mut m = FixedAdvance(0.6);
    assert!(layout_headline("", Canvas::PIN, 45.0, FitParams::default(), &mut m).is_none());
    assert!(layout_cta("", Canvas::PIN, &mut m).is_none());
}

#[test]
fn cta_button_is_a_pill_centered_at_92_percent() {
    let mut m = FixedAdvance(0.6);
    let cta = layout_cta("Download Your 50 Free Plan", Canvas::PIN, &mut m).unwrap();
    assert_eq!(cta.button, Rect::new(50.0, 1320.0, 950.0, 1440.0));
    assert_eq!(cta.button.center().y, 1380.0);
    assert_eq!(cta.corner_radius, 60.0);
    assert_eq!(cta.label_size_px, 45.0);
    assert_eq!(cta.label_center, Point::new(500.0, 1384.0));
}

#[test]
fn long_cta_label_shrinks_to_fit() {
    let mut m = FixedAdvance(0.6);
    let text = "Download Your 50 Free Woodworking Plan";
    let cta = layout_cta(text, Canvas::PIN, &mut m).unwrap();
    assert!(cta.label_size_px < 45.0);
    let width = m.measure_px(text, cta.label_size_px);
    assert!((width - 810.0).abs() < 0.5);
}

#[test]
fn corner_radius_is_clamped_to_half_the_short_side() {
    assert_eq!(clamp_corner_radius(900.0, 120.0, 60.0), 60.0);
    assert_eq!(clamp_corner_radius(80.0, 120.0, 60.0), 40.0);
    assert_eq!(clamp_corner_radius(900.0, 50.0, 60.0), 25.0);
}

#[test]
fn brand_stacks_above_cta_or_sits_near_bottom() {
    assert_eq!(brand_center(Canvas::PIN, true), Point::new(500.0, 1300.0));
    assert_eq!(brand_center(Canvas::PIN, false), Point::new(500.0, 1460.0));
}
