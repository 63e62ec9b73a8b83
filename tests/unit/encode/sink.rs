use super::*;

fn cfg(w: u32, h: u32) -> SinkConfig {
    SinkConfig {
        width: w,
        height: h,
        fps: Fps::new(30, 1).unwrap(),
    }
}

#[test]
fn container_tags() {
    assert_eq!(Container::Mp4.mime_type(), "video/mp4");
    assert_eq!(Container::WebM.extension(), "webm");
    assert_eq!(serde_json::to_string(&Container::WebM).unwrap(), "\"webm\"");
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let mut sink = InMemorySink::default();
    let mut s = Surface::new(2, 2).unwrap();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &s).unwrap();
    s.data_mut().fill(9);
    sink.push_frame(FrameIndex(1), &s).unwrap();

    let err = sink.push_frame(FrameIndex(1), &s).unwrap_err();
    assert!(matches!(err, PinError::Capture(_)));

    let video = sink.end().unwrap();
    assert_eq!(video.frame_count, 2);
    assert_eq!(video.container, Container::Mp4);
    assert_eq!(video.bytes.len(), 2 * 16);
    assert!(video.bytes[16..].iter().all(|&b| b == 9));
    assert!(sink.config().is_none());
}

#[test]
fn in_memory_sink_rejects_misuse() {
    let mut sink = InMemorySink::new(Container::WebM);
    let s = Surface::new(2, 2).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &s).is_err());
    assert!(sink.end().is_err());

    sink.begin(cfg(4, 4)).unwrap();
    assert!(sink.push_frame(FrameIndex(0), &s).is_err());
}

#[test]
fn abort_discards_frames() {
    let mut sink = InMemorySink::default();
    let s = Surface::new(2, 2).unwrap();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &s).unwrap();
    sink.abort();
    assert!(sink.frames().is_empty());
    assert!(sink.end().is_err());
}
