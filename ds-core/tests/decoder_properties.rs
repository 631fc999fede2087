//! Property tests for the frame decoder and physics model

use ds_core::codec::{
    TelemetryFrame, FRAME_LEN, HEADER, MAX_GEAR, MAX_RPM, MAX_SPEED_KMH, MAX_STEER_DECIDEG, MIN_RPM,
};
use ds_core::physics::{self, HeldKeys};
use ds_core::{FrameDecoder, VehicleState};
use proptest::prelude::*;

fn in_range_frame() -> impl Strategy<Value = TelemetryFrame> {
    (
        0..=MAX_GEAR,
        MIN_RPM..=MAX_RPM,
        0..=MAX_SPEED_KMH,
        any::<u8>(),
        any::<u8>(),
        -MAX_STEER_DECIDEG..=MAX_STEER_DECIDEG,
    )
        .prop_map(|(gear, rpm, speed_kmh, throttle, brake, steer_decideg)| TelemetryFrame {
            gear,
            rpm,
            speed_kmh,
            throttle,
            brake,
            steer_decideg,
        })
}

fn held_keys() -> impl Strategy<Value = HeldKeys> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(left, right, gas, brake)| HeldKeys {
            left,
            right,
            gas,
            brake,
        },
    )
}

fn assert_in_range(frame: &TelemetryFrame) {
    assert!(frame.gear <= MAX_GEAR);
    assert!((MIN_RPM..=MAX_RPM).contains(&frame.rpm));
    assert!(frame.speed_kmh <= MAX_SPEED_KMH);
    assert!((-MAX_STEER_DECIDEG..=MAX_STEER_DECIDEG).contains(&frame.steer_decideg));
    assert!((-1.0..=1.0).contains(&frame.steer_norm()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_arbitrary_bytes_never_yield_out_of_range_frames(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..80), 0..20)
    ) {
        let mut decoder = FrameDecoder::new();
        for chunk in &chunks {
            for frame in decoder.ingest(chunk) {
                assert_in_range(&frame);
            }
        }
        prop_assert!(decoder.pending() < FRAME_LEN);
    }

    #[test]
    fn prop_garbage_prefix_resyncs_to_one_frame(
        frame in in_range_frame(),
        garbage in prop::collection::vec(any::<u8>().prop_filter("not a header", |b| *b != HEADER), 1..16)
    ) {
        let mut bytes = garbage.clone();
        bytes.extend_from_slice(&frame.encode());

        let mut decoder = FrameDecoder::new();
        let frames: Vec<_> = decoder.ingest(&bytes).collect();
        prop_assert_eq!(frames, vec![frame]);
        prop_assert_eq!(decoder.stats().resync_bytes, garbage.len() as u64);
    }

    #[test]
    fn prop_roundtrip_in_range(frame in in_range_frame()) {
        let mut decoder = FrameDecoder::new();
        let frames: Vec<_> = decoder.ingest(&frame.encode()).collect();
        prop_assert_eq!(frames, vec![frame]);
        prop_assert_eq!(decoder.stats().clamped_fields, 0);
    }

    #[test]
    fn prop_chunking_does_not_change_output(
        frames in prop::collection::vec(in_range_frame(), 1..10),
        split in 1usize..FRAME_LEN * 2
    ) {
        let bytes: Vec<u8> = frames.iter().flat_map(|f| f.encode()).collect();

        let mut decoder = FrameDecoder::new();
        let mut decoded = Vec::new();
        for chunk in bytes.chunks(split) {
            decoded.extend(decoder.ingest(chunk));
        }
        prop_assert_eq!(decoded, frames);
    }

    #[test]
    fn prop_same_frame_twice_gives_identical_state(frame in in_range_frame()) {
        let mut bytes = frame.encode().to_vec();
        bytes.extend_from_slice(&frame.encode());

        let mut decoder = FrameDecoder::new();
        let mut state = VehicleState::default();
        let mut updates = Vec::new();
        for decoded in decoder.ingest(&bytes) {
            state.apply_frame(&decoded);
            updates.push(state);
        }
        prop_assert_eq!(updates.len(), 2);
        prop_assert_eq!(updates[0], updates[1]);
    }

    #[test]
    fn prop_physics_stays_clamped(
        keys in held_keys(),
        dt in 0.0f32..5.0,
        ticks in 1usize..200
    ) {
        let mut state = VehicleState::default();
        for _ in 0..ticks {
            state = physics::advance(&state, keys, dt);
            prop_assert_eq!(state, state.clamped());
            prop_assert!(state.steer_norm.is_finite());
            prop_assert!(state.rpm.is_finite());
        }
    }

    #[test]
    fn prop_throttle_strictly_monotonic(dt in 0.0001f32..0.1) {
        let gas = HeldKeys { gas: true, ..Default::default() };
        let mut state = VehicleState::default();
        while state.throttle < 255 {
            let next = physics::advance(&state, gas, dt);
            prop_assert!(next.throttle > state.throttle);
            state = next;
        }

        while state.throttle > 0 {
            let next = physics::advance(&state, HeldKeys::default(), dt);
            prop_assert!(next.throttle < state.throttle);
            state = next;
        }
    }
}
