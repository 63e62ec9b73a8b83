use super::*;

#[test]
fn radius_covers_three_sigma() {
    assert_eq!(radius_for_sigma(10.0), 30);
    assert_eq!(radius_for_sigma(7.5), 23);
    assert_eq!(radius_for_sigma(0.0), 0);
    assert_eq!(radius_for_sigma(f32::NAN), 0);
}

#[test]
fn blur_radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let out = blur_alpha(&src, 2, 4, 0, 1.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn blur_constant_coverage_is_identity() {
    let (w, h) = (4u32, 3u32);
    let src = vec![40u8; (w * h) as usize];
    let out = blur_alpha(&src, w, h, 3, 2.0).unwrap();
    assert_eq!(out, src);
}

#[test]
fn downscale_starts_at_wide_kernels() {
    assert_eq!(downscale_for_sigma(2.0), 1);
    assert_eq!(downscale_for_sigma(4.9), 1);
    assert_eq!(downscale_for_sigma(5.0), 2);
    assert_eq!(downscale_for_sigma(7.5), 3);
    assert_eq!(downscale_for_sigma(10.0), 4);
    assert_eq!(downscale_for_sigma(f32::NAN), 1);
}

#[test]
fn scaled_blur_keeps_constant_coverage() {
    let (w, h) = (37u32, 23u32);
    let src = vec![90u8; (w * h) as usize];
    let out = blur_alpha_scaled(&src, w, h, 10.0).unwrap();
    assert_eq!(out.len(), src.len());
    assert!(out.iter().all(|&a| a.abs_diff(90) <= 1));
}

#[test]
fn scaled_blur_tracks_full_resolution_blur() {
    // A solid bar in the middle of a padded strip.
    let (w, h) = (160u32, 100u32);
    let mut src = vec![0u8; (w * h) as usize];
    for y in 40..60 {
        for x in 40..120 {
            src[(y * w + x) as usize] = 255;
        }
    }
    let sigma = 10.0;
    let exact = blur_alpha(&src, w, h, radius_for_sigma(sigma), sigma).unwrap();
    let fast = blur_alpha_scaled(&src, w, h, sigma).unwrap();

    let worst = exact
        .iter()
        .zip(&fast)
        .map(|(&a, &b)| a.abs_diff(b))
        .max()
        .unwrap();
    assert!(worst <= 24, "max deviation {worst}");
    let sum = |v: &[u8]| v.iter().map(|&a| u64::from(a)).sum::<u64>() as f64;
    assert!((sum(&fast) / sum(&exact) - 1.0).abs() < 0.05);
}

#[test]
fn scaled_blur_checks_length() {
    assert!(blur_alpha_scaled(&[0u8; 5], 4, 4, 10.0).is_err());
}

#[test]
fn alpha_blur_spreads_energy_from_single_pixel() {
    let (w, h) = (9u32, 9u32);
    let mut src = vec![0u8; (w * h) as usize];
    src[(4 * w + 4) as usize] = 255;

    let out = blur_alpha(&src, w, h, 3, 1.2).unwrap();

    assert!(out.iter().filter(|&&a| a != 0).count() > 1);
    let sum: u32 = out.iter().map(|&a| u32::from(a)).sum();
    assert!((sum as i32 - 255).abs() <= 8);
    assert!(out[(4 * w + 4) as usize] > out[(4 * w + 5) as usize]);
}

#[test]
fn mismatched_length_is_rejected() {
    assert!(blur_alpha(&[0u8; 3], 2, 2, 1, 1.0).is_err());
}
