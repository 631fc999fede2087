//! Canonical vehicle state and the snapshot published every tick
//!
//! `VehicleState` is the single source of truth driven by either the
//! telemetry link or the physics model. Every mutation goes through
//! [`VehicleState::clamped`] so no field ever leaves its declared range.

use crate::codec::TelemetryFrame;
use crate::decoder::DecoderStats;
use crate::lap::LapRecord;
use crate::units::{round4, Percentage, Seconds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the vehicle state comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// Frames decoded from the wheel link
    Telemetry,
    /// Physics model driven by held keys
    Simulation,
}

impl InputSource {
    pub fn toggled(self) -> Self {
        match self {
            InputSource::Telemetry => InputSource::Simulation,
            InputSource::Simulation => InputSource::Telemetry,
        }
    }
}

/// Complete vehicle state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// Current gear (0 = neutral)
    pub gear: u8,

    /// Engine RPM
    #[serde(serialize_with = "round4")]
    pub rpm: f32,

    /// Ground speed in km/h
    #[serde(serialize_with = "round4")]
    pub speed_kmh: f32,

    /// Throttle pedal (0-255)
    pub throttle: u8,

    /// Brake pedal (0-255)
    pub brake: u8,

    /// Steering (-1.0 = full left, 1.0 = full right)
    #[serde(serialize_with = "round4")]
    pub steer_norm: f32,

    /// Coolant temperature
    #[serde(serialize_with = "round4")]
    pub temp_c: f32,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            gear: 1,
            rpm: 900.0,
            speed_kmh: 0.0,
            throttle: 0,
            brake: 0,
            steer_norm: 0.0,
            temp_c: 83.0,
        }
    }
}

impl VehicleState {
    pub const MAX_GEAR: u8 = 8;
    pub const MIN_RPM: f32 = 800.0;
    pub const MAX_RPM: f32 = 10_000.0;
    pub const MAX_SPEED_KMH: f32 = 360.0;
    pub const MIN_TEMP_C: f32 = 70.0;
    pub const MAX_TEMP_C: f32 = 105.0;

    /// RPM change applied instantly by a shift
    pub const SHIFT_RPM_DROP: f32 = 2000.0;

    /// Copy with every field pulled into range. NaN goes to the lower bound
    /// (zero for steering).
    pub fn clamped(self) -> Self {
        Self {
            gear: self.gear.min(Self::MAX_GEAR),
            rpm: clamp_finite(self.rpm, Self::MIN_RPM, Self::MAX_RPM, Self::MIN_RPM),
            speed_kmh: clamp_finite(self.speed_kmh, 0.0, Self::MAX_SPEED_KMH, 0.0),
            throttle: self.throttle,
            brake: self.brake,
            steer_norm: clamp_finite(self.steer_norm, -1.0, 1.0, 0.0),
            temp_c: clamp_finite(self.temp_c, Self::MIN_TEMP_C, Self::MAX_TEMP_C, Self::MIN_TEMP_C),
        }
    }

    /// Replace every field a frame carries. Temperature is not on the wire
    /// and keeps its locally simulated value.
    pub fn apply_frame(&mut self, frame: &TelemetryFrame) {
        *self = Self {
            gear: frame.gear,
            rpm: f32::from(frame.rpm),
            speed_kmh: f32::from(frame.speed_kmh),
            throttle: frame.throttle,
            brake: frame.brake,
            steer_norm: frame.steer_norm(),
            temp_c: self.temp_c,
        }
        .clamped();
    }

    /// Upshift: engine speed drops immediately
    pub fn shift_up(&mut self) {
        self.gear = (self.gear + 1).min(Self::MAX_GEAR);
        self.rpm = (self.rpm - Self::SHIFT_RPM_DROP).max(Self::MIN_RPM);
        *self = self.clamped();
    }

    /// Downshift: engine speed jumps immediately
    pub fn shift_down(&mut self) {
        self.gear = self.gear.saturating_sub(1);
        self.rpm = (self.rpm + Self::SHIFT_RPM_DROP).min(Self::MAX_RPM);
        *self = self.clamped();
    }

    /// Steering as a signed 16-bit stick axis
    pub fn steering_axis(&self) -> i16 {
        (self.steer_norm.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
    }

    /// Display label for the gear indicator
    pub fn gear_label(&self) -> String {
        if self.gear == 0 {
            "N".to_string()
        } else {
            self.gear.to_string()
        }
    }
}

fn clamp_finite(value: f32, lo: f32, hi: f32, nan: f32) -> f32 {
    if value.is_nan() {
        nan
    } else {
        value.clamp(lo, hi)
    }
}

/// Lap timing as reported to observers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LapSnapshot {
    pub current: Seconds,
    pub last: Option<Seconds>,
    pub best: Option<Seconds>,
    pub count: u32,
}

impl From<&LapRecord> for LapSnapshot {
    fn from(record: &LapRecord) -> Self {
        Self {
            current: record.current.into(),
            last: record.last.map(Seconds::from),
            best: record.best.map(Seconds::from),
            count: record.count,
        }
    }
}

/// Everything the control loop emitted on one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Wall-clock time the tick completed
    pub timestamp: DateTime<Utc>,

    /// Tick counter since the loop started
    pub tick: u64,

    /// Source that produced `vehicle` on this tick
    pub source: InputSource,

    pub vehicle: VehicleState,

    /// Pedals as fractions of full travel
    pub throttle_pct: Percentage,
    pub brake_pct: Percentage,

    pub laps: LapSnapshot,

    /// Frame decoder diagnostics
    pub decoder: DecoderStats,

    /// Name of the configured telemetry link
    pub link: Option<String>,
}

impl StateSnapshot {
    pub fn new(
        tick: u64,
        source: InputSource,
        vehicle: VehicleState,
        laps: &LapRecord,
        decoder: DecoderStats,
        link: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            tick,
            source,
            throttle_pct: Percentage::from_pedal(vehicle.throttle),
            brake_pct: Percentage::from_pedal(vehicle.brake),
            vehicle,
            laps: laps.into(),
            decoder,
            link,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
