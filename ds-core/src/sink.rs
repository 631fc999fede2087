//! Output sink contract (virtual gamepad)
//!
//! The control loop stages every axis and button, then calls
//! [`OutputSink::commit`] exactly once per tick. Implementations decide what
//! a commit means: a report to a device driver, a datagram, a log line.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pad buttons driven by discrete controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    A,
    B,
    X,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::A, Button::B, Button::X];
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Staged pad state, as committed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadReport {
    /// Left stick X axis
    pub steering: i16,
    /// Right trigger
    pub throttle: u8,
    /// Left trigger
    pub brake: u8,
    pub a: bool,
    pub b: bool,
    pub x: bool,
}

impl GamepadReport {
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        match button {
            Button::A => self.a = pressed,
            Button::B => self.b = pressed,
            Button::X => self.x = pressed,
        }
    }

    pub fn button(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
        }
    }

    /// All axes centered, triggers and buttons released
    pub fn is_neutral(&self) -> bool {
        *self == GamepadReport::default()
    }
}

/// Virtual input device consumed by the control loop
pub trait OutputSink: Send {
    fn name(&self) -> &str;

    fn set_steering(&mut self, value: i16);

    fn set_throttle(&mut self, value: u8);

    fn set_brake(&mut self, value: u8);

    fn set_button(&mut self, button: Button, pressed: bool);

    /// Flush staged values to the device
    fn commit(&mut self) -> Result<(), SinkError>;

    /// Stage the neutral report. Takes effect on the next commit.
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_buttons() {
        let mut report = GamepadReport::default();
        assert!(report.is_neutral());

        report.set_button(Button::X, true);
        assert!(report.button(Button::X));
        assert!(!report.button(Button::A));
        assert!(!report.is_neutral());

        report.set_button(Button::X, false);
        assert!(report.is_neutral());
    }

    #[test]
    fn test_report_serialization() {
        let report = GamepadReport {
            steering: -3640,
            throttle: 128,
            brake: 0,
            a: true,
            ..Default::default()
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["steering"], -3640);
        assert_eq!(json["throttle"], 128);
        assert_eq!(json["a"], true);
        assert_eq!(json["x"], false);
    }
}
