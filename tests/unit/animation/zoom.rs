use super::*;

#[test]
fn defaults_match_the_editor() {
    let z = ZoomAnimation::default();
    assert_eq!(z.start_scale, 1.15);
    assert_eq!(z.end_scale, 1.0);
    assert_eq!(z.duration(), Duration::from_secs(8));
    assert_eq!(z.frame_rate().unwrap(), Fps::new(30, 1).unwrap());
    z.validate().unwrap();
}

#[test]
fn scale_hits_both_endpoints() {
    let z = ZoomAnimation::default();
    assert_eq!(z.scale_at(0.0), 1.15);
    assert_eq!(z.scale_at(1.0), 1.0);
    assert_eq!(z.scale_at(-3.0), 1.15);
    assert_eq!(z.scale_at(7.0), 1.0);
}

#[test]
fn scale_is_non_increasing_over_the_session() {
    let z = ZoomAnimation::default();
    let mut last = f64::INFINITY;
    for ms in (0..=9000).step_by(37) {
        let s = z.scale_at(z.progress_at(Duration::from_millis(ms)));
        assert!(s <= last);
        assert!((1.0..=1.15).contains(&s));
        last = s;
    }
}

#[test]
fn progress_clamps_and_rounds() {
    let z = ZoomAnimation::default();
    assert_eq!(z.progress_at(Duration::ZERO), 0.0);
    assert_eq!(z.progress_at(Duration::from_millis(4000)), 0.5);
    assert_eq!(z.progress_at(Duration::from_secs(60)), 1.0);
    assert_eq!(progress_percent(0.504), 50);
    assert_eq!(progress_percent(0.996), 100);
    assert_eq!(progress_percent(2.0), 100);
}

#[test]
fn fixed_step_frame_count_includes_both_ends() {
    assert_eq!(ZoomAnimation::default().fixed_step_frame_count().unwrap(), 241);
    let short = ZoomAnimation {
        duration_ms: 100,
        fps: 30,
        ..ZoomAnimation::default()
    };
    assert_eq!(short.fixed_step_frame_count().unwrap(), 4);
}

#[test]
fn invalid_settings_are_rejected() {
    for bad in [
        ZoomAnimation {
            duration_ms: 0,
            ..ZoomAnimation::default()
        },
        ZoomAnimation {
            fps: 0,
            ..ZoomAnimation::default()
        },
        ZoomAnimation {
            start_scale: f64::NAN,
            ..ZoomAnimation::default()
        },
        ZoomAnimation {
            end_scale: 0.0,
            ..ZoomAnimation::default()
        },
    ] {
        assert!(bad.validate().is_err());
    }
}

#[test]
fn loads_from_camel_case_json() {
    let z: ZoomAnimation = serde_json::from_str(r#"{"durationMs": 2000, "fps": 24}"#).unwrap();
    assert_eq!(z.duration_ms, 2000);
    assert_eq!(z.fps, 24);
    assert_eq!(z.start_scale, 1.15);
}
