//! Demo link that plays the part of the steering-wheel firmware
//!
//! Drives a scripted lap with straights, braking zones, corners and
//! acceleration phases, and encodes the result into wire frames at 60Hz of
//! virtual time. Optional corruption injects line noise and damaged frames
//! deterministically, so the decoder's resync path can be exercised without
//! hardware.

use ds_core::codec::{TelemetryFrame, FRAME_LEN, MAX_STEER_DECIDEG};
use ds_core::link::{LinkError, TelemetryLink};
use std::collections::VecDeque;

/// Virtual time between generated frames
pub const FRAME_INTERVAL: f32 = 1.0 / 60.0;

// =============================================================================
// Track definition: a sequence of segments that form a lap
// =============================================================================

#[derive(Clone, Copy)]
enum SegmentKind {
    Straight,
    Braking,
    Corner,
    Accel,
}

#[derive(Clone, Copy)]
struct TrackSegment {
    kind: SegmentKind,
    duration: f32,     // seconds to traverse
    target_speed: f32, // km/h at end of segment
    steering: f32,     // peak wheel angle in degrees (+ = right)
}

/// A short club circuit: ~60s lap
fn demo_track() -> Vec<TrackSegment> {
    vec![
        // Start/finish straight
        TrackSegment { kind: SegmentKind::Straight, duration: 8.0, target_speed: 240.0, steering: 0.0 },
        // T1: heavy braking into a slow right-hander
        TrackSegment { kind: SegmentKind::Braking,  duration: 3.0, target_speed: 95.0,  steering: 4.0 },
        TrackSegment { kind: SegmentKind::Corner,   duration: 4.0, target_speed: 85.0,  steering: 90.0 },
        TrackSegment { kind: SegmentKind::Accel,    duration: 3.5, target_speed: 180.0, steering: 20.0 },
        // T2: fast left-hander
        TrackSegment { kind: SegmentKind::Braking,  duration: 2.0, target_speed: 150.0, steering: -5.0 },
        TrackSegment { kind: SegmentKind::Corner,   duration: 3.5, target_speed: 140.0, steering: -55.0 },
        TrackSegment { kind: SegmentKind::Accel,    duration: 3.0, target_speed: 200.0, steering: -10.0 },
        // Back straight
        TrackSegment { kind: SegmentKind::Straight, duration: 10.0, target_speed: 270.0, steering: 0.0 },
        // T3: chicane, quick right-left
        TrackSegment { kind: SegmentKind::Braking,  duration: 2.5, target_speed: 110.0, steering: 8.0 },
        TrackSegment { kind: SegmentKind::Corner,   duration: 2.0, target_speed: 100.0, steering: 75.0 },
        TrackSegment { kind: SegmentKind::Corner,   duration: 2.0, target_speed: 95.0,  steering: -80.0 },
        TrackSegment { kind: SegmentKind::Accel,    duration: 3.0, target_speed: 170.0, steering: -10.0 },
        // T4: tight hairpin left
        TrackSegment { kind: SegmentKind::Braking,  duration: 3.5, target_speed: 70.0,  steering: -6.0 },
        TrackSegment { kind: SegmentKind::Corner,   duration: 4.5, target_speed: 65.0,  steering: -150.0 },
        TrackSegment { kind: SegmentKind::Accel,    duration: 4.0, target_speed: 190.0, steering: -25.0 },
        // Run to start/finish
        TrackSegment { kind: SegmentKind::Straight, duration: 6.0, target_speed: 240.0, steering: 0.0 },
    ]
}

// =============================================================================
// Interpolation from track position
// =============================================================================

fn sample_lap(track: &[TrackSegment], lap_duration: f32, lap_time: f32) -> TelemetryFrame {
    let t = lap_time % lap_duration;

    let mut elapsed = 0.0_f32;
    let mut seg_idx = track.len() - 1;
    for (i, seg) in track.iter().enumerate() {
        if elapsed + seg.duration > t {
            seg_idx = i;
            break;
        }
        elapsed += seg.duration;
    }

    let seg = track[seg_idx];
    let seg_t = ((t - elapsed) / seg.duration).clamp(0.0, 1.0);
    let prev_speed = track[(seg_idx + track.len() - 1) % track.len()].target_speed;

    let smooth_t = smoothstep(seg_t);
    let speed = lerp(prev_speed, seg.target_speed, smooth_t);

    let (throttle, brake) = match seg.kind {
        SegmentKind::Straight => (0.95 + 0.05 * (1.0 - seg_t), 0.0),
        SegmentKind::Braking => (0.0, (1.0 - smooth_t * 0.3).clamp(0.0, 1.0)),
        SegmentKind::Corner => (0.2 + 0.3 * seg_t, 0.0),
        SegmentKind::Accel => (0.5 + 0.5 * smooth_t, 0.0),
    };

    // Ramp the wheel in during the first half of a segment, out during the second
    let envelope = if seg_t < 0.5 {
        smoothstep(seg_t * 2.0)
    } else {
        smoothstep((1.0 - seg_t) * 2.0)
    };
    let steering = seg.steering * envelope;

    let gear = speed_to_gear(speed);
    TelemetryFrame {
        gear,
        rpm: speed_to_rpm(speed, gear),
        speed_kmh: speed.round().clamp(0.0, 360.0) as u16,
        throttle: (throttle * 255.0).round() as u8,
        brake: (brake * 255.0).round() as u8,
        steer_decideg: ((steering * 10.0).round() as i16)
            .clamp(-MAX_STEER_DECIDEG, MAX_STEER_DECIDEG),
    }
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn speed_to_gear(kmh: f32) -> u8 {
    match kmh {
        x if x < 50.0 => 1,
        x if x < 90.0 => 2,
        x if x < 130.0 => 3,
        x if x < 170.0 => 4,
        x if x < 210.0 => 5,
        x if x < 250.0 => 6,
        _ => 7,
    }
}

fn speed_to_rpm(kmh: f32, gear: u8) -> u16 {
    // Lower gear = higher RPM for the same speed
    let ratio = match gear {
        1 => 150.0,
        2 => 90.0,
        3 => 65.0,
        4 => 50.0,
        5 => 41.0,
        6 => 35.0,
        _ => 31.0,
    };
    (kmh * ratio + 900.0).clamp(800.0, 10_000.0) as u16
}

/// Simple deterministic noise from a seed
fn noise(seed: f32) -> f32 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

// =============================================================================
// DemoLink
// =============================================================================

pub struct DemoLink {
    name: String,
    open: bool,
    track: Vec<TrackSegment>,
    lap_duration: f32,
    frame_count: u64,
    /// Fraction of frames to damage (0.0 = clean)
    corruption: f32,
    pending: VecDeque<u8>,
}

impl DemoLink {
    pub fn new(corruption: f32) -> Self {
        let track = demo_track();
        let lap_duration: f32 = track.iter().map(|s| s.duration).sum();
        let corruption = if corruption.is_nan() {
            0.0
        } else {
            corruption.clamp(0.0, 1.0)
        };
        Self {
            name: "demo".to_string(),
            open: false,
            track,
            lap_duration,
            frame_count: 0,
            corruption,
            pending: VecDeque::new(),
        }
    }

    /// Length of one scripted lap in seconds
    pub fn lap_duration(&self) -> f32 {
        self.lap_duration
    }

    /// Frames produced since the link was opened; also the virtual clock
    pub fn frames_generated(&self) -> u64 {
        self.frame_count
    }

    /// Frame the wheel would send at `lap_time` seconds into the lap
    pub fn frame_at(&self, lap_time: f32) -> TelemetryFrame {
        sample_lap(&self.track, self.lap_duration, lap_time)
    }

    fn generate(&mut self) {
        let t = self.frames_generated() as f32 * FRAME_INTERVAL;
        self.frame_count += 1;
        let n = self.frame_count as f32;

        let mut bytes = self.frame_at(t).encode();
        if self.corruption > 0.0 && noise(n) < self.corruption {
            if noise(n * 1.7) < 0.5 {
                // Line noise ahead of an intact frame
                self.pending.push_back(0x00);
            } else {
                // Damage one separator
                bytes[[1, 3, 6, 9, 11, 13][(noise(n * 2.3) * 6.0) as usize % 6]] ^= 0xFF;
            }
        }
        self.pending.extend(bytes);
    }
}

impl Default for DemoLink {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TelemetryLink for DemoLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), LinkError> {
        if !self.open {
            self.open = true;
            self.frame_count = 0;
            self.pending.clear();
        }
        Ok(())
    }

    /// One frame period elapses per call
    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, LinkError> {
        if !self.open {
            return Err(LinkError::NotOpen);
        }
        if self.pending.len() < FRAME_LEN {
            self.generate();
        }
        let take = max.min(self.pending.len());
        Ok(self.pending.drain(..take).collect())
    }

    fn close(&mut self) {
        self.open = false;
        self.pending.clear();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
