//! Type-safe wrappers for the units reported to observers
//!
//! The canonical `VehicleState` keeps plain numbers so the physics model
//! reads like the formulas it implements. These newtypes are used where
//! values leave the control loop (snapshots, sink reports).
//!
//! All unit types serialize with 4 decimal places to reduce JSON payload size.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round f32 to 4 decimal places for compact JSON serialization
pub(crate) fn round4<S: serde::Serializer>(val: &f32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f32((*val * 10000.0).round() / 10000.0)
}

/// Seconds (lap durations)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seconds(#[serde(serialize_with = "round4")] pub f32);

impl From<Duration> for Seconds {
    fn from(value: Duration) -> Self {
        Self(value.as_secs_f32())
    }
}

/// Percentage (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentage(#[serde(serialize_with = "round4")] pub f32);

impl Percentage {
    /// Create a new percentage, clamping to [0.0, 1.0]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Pedal travel as a fraction of full scale
    pub fn from_pedal(raw: u8) -> Self {
        Self::new(f32::from(raw) / 255.0)
    }

    /// Get as percentage (0-100)
    pub fn as_percent(&self) -> f32 {
        self.0 * 100.0
    }
}
