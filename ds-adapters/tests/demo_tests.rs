//! Integration tests for the DemoLink

use ds_adapters::DemoLink;
use ds_core::codec::FRAME_LEN;
use ds_core::link::{LinkError, TelemetryLink};
use ds_core::FrameDecoder;

#[test]
fn test_demo_link_name() {
    let link = DemoLink::new(0.0);
    assert_eq!(link.name(), "demo");
}

#[test]
fn test_demo_link_initially_closed() {
    let link = DemoLink::new(0.0);
    assert!(!link.is_open(), "DemoLink should be closed before open()");
}

#[test]
fn test_demo_link_read_when_closed_errors() {
    let mut link = DemoLink::new(0.0);
    let result = link.read_available(64);
    assert!(
        matches!(result, Err(LinkError::NotOpen)),
        "read_available() should fail on a closed link"
    );
}

#[test]
fn test_demo_link_open_and_close() {
    let mut link = DemoLink::new(0.0);

    link.open().expect("open() should succeed");
    assert!(link.is_open(), "Link should be open after open()");

    link.close();
    assert!(!link.is_open(), "Link should be closed after close()");
    link.close();
}

#[test]
fn test_demo_link_produces_one_frame_per_read() {
    let mut link = DemoLink::new(0.0);
    link.open().expect("open() should succeed");

    let mut decoder = FrameDecoder::new();
    for i in 0..5 {
        let bytes = link.read_available(256).expect("read should not error");
        assert_eq!(bytes.len(), FRAME_LEN, "read {} should carry one frame", i);
        assert_eq!(decoder.ingest(&bytes).count(), 1);
    }
    assert_eq!(link.frames_generated(), 5);
    assert_eq!(decoder.stats().corruption_count(), 0);
}

#[test]
fn test_demo_link_small_reads_keep_the_stream_intact() {
    let mut link = DemoLink::new(0.0);
    link.open().expect("open() should succeed");

    let mut decoder = FrameDecoder::new();
    let mut frames = 0;
    for _ in 0..100 {
        let bytes = link.read_available(5).expect("read should not error");
        assert!(bytes.len() <= 5);
        frames += decoder.ingest(&bytes).count();
    }
    assert_eq!(frames, 500 / FRAME_LEN);
    assert_eq!(decoder.stats().corruption_count(), 0);
}

#[test]
fn test_demo_link_frame_values_in_range() {
    let mut link = DemoLink::new(0.0);
    link.open().expect("open() should succeed");

    let mut decoder = FrameDecoder::new();
    for _ in 0..600 {
        let bytes = link.read_available(64).expect("read should not error");
        for frame in decoder.ingest(&bytes) {
            assert!((1..=8).contains(&frame.gear), "gear {}", frame.gear);
            assert!((800..=10_000).contains(&frame.rpm), "rpm {}", frame.rpm);
            assert!(frame.speed_kmh <= 360, "speed {}", frame.speed_kmh);
            assert!((-1.0..=1.0).contains(&frame.steer_norm()));
        }
    }
    assert_eq!(decoder.stats().frames, 600);
    assert_eq!(decoder.stats().clamped_fields, 0);
}

#[test]
fn test_demo_link_corruption_is_recovered() {
    let mut link = DemoLink::new(0.3);
    link.open().expect("open() should succeed");

    let mut decoder = FrameDecoder::new();
    for _ in 0..600 {
        let bytes = link.read_available(64).expect("read should not error");
        decoder.ingest(&bytes).for_each(drop);
    }

    let stats = decoder.stats();
    assert!(stats.corruption_count() > 0, "corruption should be observed");
    assert!(stats.frames > 300, "most frames should survive: {:?}", stats);
    assert!(stats.frames < 600, "damaged frames should be dropped");
}

#[test]
fn test_demo_link_reopen_restarts_the_lap() {
    let mut link = DemoLink::new(0.0);
    link.open().expect("open() should succeed");
    let first = link.read_available(FRAME_LEN).unwrap();
    link.read_available(FRAME_LEN).unwrap();

    link.close();
    link.open().expect("open() should succeed");
    assert_eq!(link.read_available(FRAME_LEN).unwrap(), first);
}

#[test]
fn test_demo_link_default_trait() {
    let link = DemoLink::default();
    assert_eq!(link.name(), "demo");
    assert!(!link.is_open());
}
