use super::*;
use crate::style::config::ColorScheme;

fn bare_style(scheme: ColorScheme) -> StyleConfig {
    StyleConfig {
        headline: String::new(),
        cta_text: String::new(),
        brand_text: String::new(),
        color_scheme: scheme,
        ..StyleConfig::default()
    }
}

fn render(style: &StyleConfig, bg: BackgroundSource<'_>, zoom: f64) -> Surface {
    let mut r = FrameRenderer::new(FontBook::empty());
    let mut s = Surface::new(40, 60).unwrap();
    r.render_frame(&mut s, style, bg, zoom).unwrap();
    s
}

#[test]
fn textless_frame_needs_no_fonts_and_is_opaque() {
    let s = render(&bare_style(ColorScheme::Standard), BackgroundSource::Fallback, 1.0);
    assert!(s.data().chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn rendering_is_idempotent() {
    let style = bare_style(ColorScheme::Standard);
    let a = render(&style, BackgroundSource::Fallback, 1.07);
    let b = render(&style, BackgroundSource::Fallback, 1.07);
    assert_eq!(a, b);

    // Reusing one renderer over a dirty surface gives the same frame.
    let mut r = FrameRenderer::new(FontBook::empty());
    let mut s = Surface::new(40, 60).unwrap();
    s.data_mut().fill(200);
    r.render_frame(&mut s, &style, BackgroundSource::Fallback, 1.07)
        .unwrap();
    assert_eq!(s, a);
}

#[test]
fn tint_alpha_follows_scheme() {
    let standard = render(&bare_style(ColorScheme::Standard), BackgroundSource::Fallback, 1.0);
    let dark = render(&bare_style(ColorScheme::DarkOverlay), BackgroundSource::Fallback, 1.0);

    let mut untinted = Surface::new(40, 60).unwrap();
    paint_fallback(&mut untinted, 1.0);

    let p_raw = untinted.pixel(5, 5).unwrap();
    let p_std = standard.pixel(5, 5).unwrap();
    let p_dark = dark.pixel(5, 5).unwrap();
    assert!(p_std.r < p_raw.r && p_dark.r < p_std.r);
    // 20% black keeps roughly 80% of each channel.
    assert!((i32::from(p_std.r) - i32::from(p_raw.r) * 4 / 5).abs() <= 1);
}

#[test]
fn monochrome_frame_is_gray() {
    let s = render(&bare_style(ColorScheme::Monochrome), BackgroundSource::Fallback, 1.0);
    for px in s.data().chunks_exact(4) {
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
}

#[test]
fn image_background_is_cover_fitted() {
    // Left half red, right half blue.
    let (w, h) = (4u32, 2u32);
    let mut px = Vec::new();
    for _y in 0..h {
        for x in 0..w {
            px.extend_from_slice(if x < 2 { &[255, 0, 0, 255] } else { &[0, 0, 255, 255] });
        }
    }
    let img = DecodedImage::from_premul(w, h, px);
    let s = render(
        &bare_style(ColorScheme::Standard),
        BackgroundSource::Image(&img),
        1.0,
    );

    let left = s.pixel(2, 30).unwrap();
    let right = s.pixel(37, 30).unwrap();
    assert!(left.r > 150 && left.b < 40);
    assert!(right.b > 150 && right.r < 40);
    assert!(s.data().chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn text_without_fonts_fails_and_leaves_surface_untouched() {
    let mut r = FrameRenderer::new(FontBook::empty());
    let mut s = Surface::new(40, 60).unwrap();
    s.data_mut().fill(7);
    let style = StyleConfig {
        headline: "Hello".to_owned(),
        ..bare_style(ColorScheme::Standard)
    };
    let err = r
        .render_frame(&mut s, &style, BackgroundSource::Fallback, 1.0)
        .unwrap_err();
    assert!(matches!(err, PinError::Font(_)));
    assert!(s.data().iter().all(|&b| b == 7));
}

#[test]
fn invalid_zoom_is_rejected() {
    let mut r = FrameRenderer::new(FontBook::empty());
    let mut s = Surface::new(4, 4).unwrap();
    let style = bare_style(ColorScheme::Standard);
    for zoom in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(
            r.render_frame(&mut s, &style, BackgroundSource::Fallback, zoom)
                .is_err()
        );
    }
}

#[test]
fn coverage_bounds_tracks_alpha() {
    let (w, h) = (5u32, 4u32);
    let mut layer = vec![0u8; (w * h * 4) as usize];
    assert_eq!(coverage_bounds(&layer, w, h), None);
    layer[((w + 1) * 4 + 3) as usize] = 10;
    layer[((3 * w + 3) * 4 + 3) as usize] = 10;
    assert_eq!(coverage_bounds(&layer, w, h), Some((1, 1, 3, 3)));
}

#[test]
fn drop_shadow_lands_below_the_shape() {
    let (w, h) = (30u32, 40u32);
    let mut layer = vec![0u8; (w * h * 4) as usize];
    for y in 10..14 {
        for x in 10..20 {
            let i = ((y * w + x) * 4) as usize;
            layer[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
        }
    }
    let mut s = Surface::new(w, h).unwrap();
    let shadow = DropShadow {
        color: Color::black_alpha(1.0),
        blur: 2.0,
        offset_x: 0.0,
        offset_y: 10.0,
    };
    drop_shadow(&mut s, &layer, PixelRect::full(w, h), shadow).unwrap();

    assert!(s.pixel(15, 22).unwrap().a > 100);
    assert_eq!(s.pixel(15, 8).unwrap().a, 0);
    assert_eq!(s.pixel(15, 22).unwrap().r, 0);
}

#[test]
fn shadow_of_an_offset_layer_lands_in_surface_space() {
    // A 10x4 opaque layer placed at (10, 10) of a 30x40 surface.
    let rect = PixelRect {
        x0: 10,
        y0: 10,
        x1: 20,
        y1: 14,
    };
    let layer = [255u8; 4].repeat(10 * 4);
    let mut s = Surface::new(30, 40).unwrap();
    let shadow = DropShadow {
        color: Color::black_alpha(1.0),
        blur: 2.0,
        offset_x: 0.0,
        offset_y: 10.0,
    };
    drop_shadow(&mut s, &layer, rect, shadow).unwrap();

    assert!(s.pixel(15, 22).unwrap().a > 100);
    assert_eq!(s.pixel(15, 8).unwrap().a, 0);
    assert_eq!(s.pixel(2, 22).unwrap().a, 0);
}

#[test]
fn pixel_rect_pads_and_clips() {
    let r = PixelRect::covering(Rect::new(10.2, 5.5, 20.0, 8.0), 1.0, 30, 40).unwrap();
    assert_eq!(
        r,
        PixelRect {
            x0: 9,
            y0: 4,
            x1: 21,
            y1: 9
        }
    );
    let clipped = PixelRect::covering(Rect::new(-5.0, 35.0, 50.0, 60.0), 0.0, 30, 40).unwrap();
    assert_eq!((clipped.x0, clipped.y0, clipped.x1, clipped.y1), (0, 35, 30, 40));
    assert_eq!(PixelRect::covering(Rect::new(40.0, 0.0, 50.0, 5.0), 0.0, 30, 40), None);
    assert_eq!(
        PixelRect::covering(Rect::new(f64::NAN, 0.0, 5.0, 5.0), 0.0, 30, 40),
        None
    );

    let u = r.union(clipped);
    assert_eq!((u.x0, u.y0, u.x1, u.y1), (0, 4, 30, 40));
    assert_eq!((u.width(), u.height()), (30, 36));
}

#[test]
fn oversized_image_fails_before_the_surface_is_cleared() {
    let img = DecodedImage::from_premul(70_000, 2, vec![255; 70_000 * 2 * 4]);
    let mut r = FrameRenderer::new(FontBook::empty());
    let mut s = Surface::new(40, 60).unwrap();
    s.data_mut().fill(200);

    let err = r
        .render_frame(
            &mut s,
            &bare_style(ColorScheme::Standard),
            BackgroundSource::Image(&img),
            1.0,
        )
        .unwrap_err();
    assert!(matches!(err, PinError::Validation(_)));
    assert!(s.data().iter().all(|&b| b == 200));
}

#[test]
fn empty_image_fails_before_the_surface_is_cleared() {
    let img = DecodedImage::from_premul(0, 5, Vec::new());
    let mut r = FrameRenderer::new(FontBook::empty());
    let mut s = Surface::new(40, 60).unwrap();
    s.data_mut().fill(200);

    assert!(
        r.render_frame(
            &mut s,
            &bare_style(ColorScheme::Standard),
            BackgroundSource::Image(&img),
            1.0,
        )
        .is_err()
    );
    assert!(s.data().iter().all(|&b| b == 200));
}

#[test]
fn scratch_pool_is_bounded() {
    let mut r = FrameRenderer::new(FontBook::empty());
    for side in 1..=(MAX_SCRATCH as u16 + 4) {
        let s = r.take_scratch(side, side);
        r.put_scratch(s);
    }
    assert_eq!(r.scratch.len(), MAX_SCRATCH);
    let again = r.take_scratch(MAX_SCRATCH as u16 + 4, MAX_SCRATCH as u16 + 4);
    assert_eq!(again.pixmap.width(), MAX_SCRATCH as u16 + 4);
    assert_eq!(r.scratch.len(), MAX_SCRATCH - 1);
}
