//! Steering-wheel telemetry wire format
//!
//! Frame layout (16 bytes, multi-byte fields big-endian):
//!
//! | offset | content |
//! |---|---|
//! | 0 | header `0xAB` |
//! | 1, 3, 6, 9, 11, 13 | separator `0x2E` (`'.'`) |
//! | 2 | gear (u8) |
//! | 4-5 | engine RPM (u16) |
//! | 7-8 | speed in km/h (u16) |
//! | 10 | throttle (u8) |
//! | 12 | brake (u8) |
//! | 14-15 | steering angle in tenths of a degree (i16) |

use serde::{Deserialize, Serialize};

/// Fixed length of every frame on the wire
pub const FRAME_LEN: usize = 16;

/// Frame synchronization byte
pub const HEADER: u8 = 0xAB;

/// Field separator byte
pub const SEPARATOR: u8 = 0x2E;

/// Offsets that must hold [`SEPARATOR`]
pub const SEPARATOR_OFFSETS: [usize; 6] = [1, 3, 6, 9, 11, 13];

pub const MAX_GEAR: u8 = 8;
pub const MIN_RPM: u16 = 800;
pub const MAX_RPM: u16 = 10_000;
pub const MAX_SPEED_KMH: u16 = 360;
/// ±180.0 degrees
pub const MAX_STEER_DECIDEG: i16 = 1_800;

/// One validated telemetry record, clamped to the vehicle ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub gear: u8,
    pub rpm: u16,
    pub speed_kmh: u16,
    pub throttle: u8,
    pub brake: u8,
    /// Steering wheel angle ×10 (tenths of a degree, positive = right)
    pub steer_decideg: i16,
}

/// Result of decoding a candidate frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Header and separators valid. `clamped` counts fields pulled back into range.
    Frame { frame: TelemetryFrame, clamped: u32 },
    /// First byte is not [`HEADER`]
    BadHeader,
    /// Header present but at least one separator is wrong
    BadSeparator,
}

impl TelemetryFrame {
    /// Validate and decode a 16-byte candidate frame
    pub fn decode(bytes: &[u8; FRAME_LEN]) -> Decoded {
        if bytes[0] != HEADER {
            return Decoded::BadHeader;
        }
        if SEPARATOR_OFFSETS.iter().any(|&i| bytes[i] != SEPARATOR) {
            return Decoded::BadSeparator;
        }

        let raw = TelemetryFrame {
            gear: bytes[2],
            rpm: u16::from_be_bytes([bytes[4], bytes[5]]),
            speed_kmh: u16::from_be_bytes([bytes[7], bytes[8]]),
            throttle: bytes[10],
            brake: bytes[12],
            steer_decideg: i16::from_be_bytes([bytes[14], bytes[15]]),
        };
        let (frame, clamped) = raw.clamped();
        Decoded::Frame { frame, clamped }
    }

    /// Encode into the exact bytes the wheel firmware transmits
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [SEPARATOR; FRAME_LEN];
        let rpm = self.rpm.to_be_bytes();
        let speed = self.speed_kmh.to_be_bytes();
        let steer = self.steer_decideg.to_be_bytes();

        buf[0] = HEADER;
        buf[2] = self.gear;
        buf[4..6].copy_from_slice(&rpm);
        buf[7..9].copy_from_slice(&speed);
        buf[10] = self.throttle;
        buf[12] = self.brake;
        buf[14..16].copy_from_slice(&steer);
        buf
    }

    /// Steering angle in degrees
    pub fn steer_degrees(&self) -> f32 {
        f32::from(self.steer_decideg) / 10.0
    }

    /// Steering normalized to -1.0..=1.0 (±180° full lock)
    pub fn steer_norm(&self) -> f32 {
        (self.steer_degrees() / 180.0).clamp(-1.0, 1.0)
    }

    /// Pull every field into its declared range, returning how many moved
    fn clamped(self) -> (Self, u32) {
        let mut count = 0;
        let mut clamp = |changed: bool| {
            if changed {
                count += 1;
            }
        };

        let gear = self.gear.min(MAX_GEAR);
        clamp(gear != self.gear);
        let rpm = self.rpm.clamp(MIN_RPM, MAX_RPM);
        clamp(rpm != self.rpm);
        let speed_kmh = self.speed_kmh.min(MAX_SPEED_KMH);
        clamp(speed_kmh != self.speed_kmh);
        let steer_decideg = self
            .steer_decideg
            .clamp(-MAX_STEER_DECIDEG, MAX_STEER_DECIDEG);
        clamp(steer_decideg != self.steer_decideg);

        (
            TelemetryFrame {
                gear,
                rpm,
                speed_kmh,
                throttle: self.throttle,
                brake: self.brake,
                steer_decideg,
            },
            count,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [u8; FRAME_LEN] = [
        0xAB, 0x2E, 0x05, 0x2E, 0x1F, 0x40, 0x2E, 0x00, 0x64, 0x2E, 0x80, 0x2E, 0x40, 0x2E, 0xFF,
        0x38,
    ];

    fn expect_frame(decoded: Decoded) -> (TelemetryFrame, u32) {
        match decoded {
            Decoded::Frame { frame, clamped } => (frame, clamped),
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_sample_frame() {
        let (frame, clamped) = expect_frame(TelemetryFrame::decode(&SAMPLE));

        assert_eq!(clamped, 0);
        assert_eq!(frame.gear, 5);
        assert_eq!(frame.rpm, 8000);
        assert_eq!(frame.speed_kmh, 100);
        assert_eq!(frame.throttle, 128);
        assert_eq!(frame.brake, 64);
        assert_eq!(frame.steer_decideg, -200);
        assert!((frame.steer_degrees() + 20.0).abs() < 1e-6);
        assert!((frame.steer_norm() + 20.0 / 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_encode_matches_firmware_layout() {
        let frame = TelemetryFrame {
            gear: 5,
            rpm: 8000,
            speed_kmh: 100,
            throttle: 128,
            brake: 64,
            steer_decideg: -200,
        };
        assert_eq!(frame.encode(), SAMPLE);
    }

    #[test]
    fn test_roundtrip_extremes() {
        let frame = TelemetryFrame {
            gear: 0,
            rpm: MAX_RPM,
            speed_kmh: MAX_SPEED_KMH,
            throttle: 255,
            brake: 0,
            steer_decideg: MAX_STEER_DECIDEG,
        };
        let (decoded, clamped) = expect_frame(TelemetryFrame::decode(&frame.encode()));
        assert_eq!(decoded, frame);
        assert_eq!(clamped, 0);
    }

    #[test]
    fn test_bad_header() {
        let mut bytes = SAMPLE;
        bytes[0] = 0xAA;
        assert_eq!(TelemetryFrame::decode(&bytes), Decoded::BadHeader);
    }

    #[test]
    fn test_each_separator_is_checked() {
        for &offset in &SEPARATOR_OFFSETS {
            let mut bytes = SAMPLE;
            bytes[offset] = 0x00;
            assert_eq!(
                TelemetryFrame::decode(&bytes),
                Decoded::BadSeparator,
                "separator at offset {} not validated",
                offset
            );
        }
    }

    #[test]
    fn test_out_of_range_fields_are_clamped() {
        let mut bytes = SAMPLE;
        bytes[2] = 12; // gear
        bytes[4..6].copy_from_slice(&0u16.to_be_bytes()); // rpm below idle
        bytes[7..9].copy_from_slice(&500u16.to_be_bytes()); // speed
        bytes[14..16].copy_from_slice(&(-3000i16).to_be_bytes()); // steering

        let (frame, clamped) = expect_frame(TelemetryFrame::decode(&bytes));
        assert_eq!(clamped, 4);
        assert_eq!(frame.gear, MAX_GEAR);
        assert_eq!(frame.rpm, MIN_RPM);
        assert_eq!(frame.speed_kmh, MAX_SPEED_KMH);
        assert_eq!(frame.steer_decideg, -MAX_STEER_DECIDEG);
        assert_eq!(frame.steer_norm(), -1.0);
    }
}
