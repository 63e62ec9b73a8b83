use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30, 1).unwrap().as_f64(), 30.0);
}

#[test]
fn fps_frame_timestamps_are_exact() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.frames_to_nanos(0), 0);
    assert_eq!(fps.frames_to_nanos(30), 1_000_000_000);
    assert_eq!(fps.frames_to_nanos(240), 8_000_000_000);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    assert_eq!(ntsc.frames_to_nanos(30_000), 1_001_000_000_000);
}

#[test]
fn pin_canvas_is_two_by_three() {
    let c = Canvas::PIN;
    assert_eq!((c.width, c.height), (1000, 1500));
    assert_eq!(Canvas::default(), c);
    c.validate().unwrap();
}

#[test]
fn canvas_validation_rejects_degenerate_sizes() {
    assert!(
        Canvas {
            width: 0,
            height: 10
        }
        .validate()
        .is_err()
    );
    assert!(
        Canvas {
            width: 70_000,
            height: 10
        }
        .validate()
        .is_err()
    );
}

#[test]
fn premul_conversion_rounds() {
    let c = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
    assert_eq!(c.to_array(), [128, 64, 0, 128]);
    assert_eq!(Rgba8Premul::transparent().to_array(), [0, 0, 0, 0]);
}
