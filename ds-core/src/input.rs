//! Discrete driver input events
//!
//! Keyboards, the HTTP API or tests all reduce to the same event stream,
//! which the control loop drains once per tick.

use crate::sink::Button;
use serde::{Deserialize, Serialize};

/// A driver control that can be held or pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    SteerLeft,
    SteerRight,
    Throttle,
    Brake,
    GearUp,
    GearDown,
    LapComplete,
}

impl Control {
    /// Pad button mirrored by this control, if any
    pub fn button(self) -> Option<Button> {
        match self {
            Control::LapComplete => Some(Button::X),
            Control::GearUp => Some(Button::A),
            Control::GearDown => Some(Button::B),
            _ => None,
        }
    }

    /// Controls that only act on the simulated vehicle. Live telemetry
    /// carries these values from the wheel itself.
    pub fn is_simulation_only(self) -> bool {
        !matches!(self, Control::LapComplete)
    }
}

/// One input event
///
/// JSON form: `{"type": "pressed", "control": "throttle"}`,
/// `{"type": "toggle_mode"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "control", rename_all = "snake_case")]
pub enum InputEvent {
    Pressed(Control),
    Released(Control),
    /// Switch between live telemetry and simulation
    ToggleMode,
    /// Stop the control loop
    Quit,
}
