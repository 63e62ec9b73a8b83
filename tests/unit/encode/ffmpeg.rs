use super::*;

const LISTING_FULL: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
";

const LISTING_VP9_ONLY: &str = "\
 ------
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D libx264              not really, but audio flags must not count
";

#[test]
fn prefers_mp4_then_webm() {
    assert_eq!(pick_container(LISTING_FULL), Some(Container::Mp4));
    assert_eq!(pick_container(LISTING_VP9_ONLY), Some(Container::WebM));
    assert_eq!(pick_container(" ------\n A....D aac  AAC\n"), None);
    assert_eq!(pick_container(""), None);
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn begin_rejects_odd_dimensions() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        container: Some(Container::Mp4),
        ..FfmpegSinkOpts::default()
    });
    let err = sink
        .begin(SinkConfig {
            width: 3,
            height: 4,
            fps: Fps::new(30, 1).unwrap(),
        })
        .unwrap_err();
    assert!(matches!(err, PinError::Validation(_)));
    assert!(sink.end().is_err());
}

#[test]
fn ffmpeg_round_trip_produces_a_container() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let fps = Fps::new(30, 1).unwrap();
    if sink
        .begin(SinkConfig {
            width: 16,
            height: 16,
            fps,
        })
        .is_err()
    {
        // No H.264 or VP9 encoder in this ffmpeg build.
        return;
    }
    let mut s = Surface::new(16, 16).unwrap();
    for i in 0..5u64 {
        s.data_mut().fill((i * 40) as u8);
        sink.push_frame(FrameIndex(i), &s).unwrap();
    }
    let video = sink.end().unwrap();
    assert_eq!(video.frame_count, 5);
    assert_eq!(Some(video.container), sink.container());
    assert!(!video.bytes.is_empty());
}
