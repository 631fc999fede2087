//! First-order vehicle model driven by held keys
//!
//! Not a dynamics simulation: it only has to produce bounded, smooth,
//! monotonic output that looks plausible on a dashboard and drives a
//! virtual pad sensibly. Every function here is pure.

use crate::model::VehicleState;
use serde::{Deserialize, Serialize};

/// Steering travel per second while a direction key is held
pub const STEER_RATE: f32 = 2.0;
/// Self-centering decay per second with no (or both) direction keys
pub const STEER_DECAY: f32 = 3.0;

pub const THROTTLE_RISE: f32 = 420.0;
pub const THROTTLE_FALL: f32 = 360.0;
pub const BRAKE_RISE: f32 = 460.0;
pub const BRAKE_FALL: f32 = 360.0;

/// km/h per second per unit of acceleration
pub const SPEED_GAIN: f32 = 14.0;
pub const DRAG: f32 = 0.02;
pub const BRAKE_DECEL: f32 = 8.0;

pub const IDLE_RPM: f32 = 900.0;
/// RPM lag: fraction of the gap to the target closed per second
pub const RPM_RESPONSE: f32 = 5.0;

/// Coolant change per 1/60 s with the throttle open
pub const TEMP_RISE: f32 = 0.02;
/// Coolant change per 1/60 s with the throttle closed
pub const TEMP_FALL: f32 = 0.015;

/// Keys currently held by the driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldKeys {
    pub left: bool,
    pub right: bool,
    pub gas: bool,
    pub brake: bool,
}

/// Advance the simulated vehicle by `dt` seconds.
///
/// Gear is left untouched: shifts are discrete events applied by the
/// caller through [`VehicleState::shift_up`] / [`VehicleState::shift_down`].
pub fn advance(state: &VehicleState, keys: HeldKeys, dt: f32) -> VehicleState {
    let dt = sanitize_dt(dt);
    let mut next = *state;

    next.steer_norm = steer(state.steer_norm, keys, dt);
    next.throttle = ramp(state.throttle, keys.gas, THROTTLE_RISE, THROTTLE_FALL, dt);
    next.brake = ramp(state.brake, keys.brake, BRAKE_RISE, BRAKE_FALL, dt);

    let gear = f32::from(next.gear);
    let throttle = pedal_ratio(next.throttle);
    let brake = pedal_ratio(next.brake);

    let accel = throttle * (3.0 + gear) - brake * BRAKE_DECEL - DRAG * state.speed_kmh;
    next.speed_kmh = state.speed_kmh + accel * SPEED_GAIN * dt;
    next = next.clamped();

    let target = (IDLE_RPM + next.speed_kmh * (40.0 + gear * 5.0) + throttle * 800.0)
        .clamp(VehicleState::MIN_RPM, VehicleState::MAX_RPM);
    next.rpm = state.rpm + (target - state.rpm) * (RPM_RESPONSE * dt).min(1.0);

    let mut next = next.clamped();
    next.temp_c = advance_temperature(state.temp_c, next.throttle, dt);
    next
}

/// Leaky coolant model, shared by both input sources
pub fn advance_temperature(temp_c: f32, throttle: u8, dt: f32) -> f32 {
    let dt = sanitize_dt(dt);
    let per_frame = if throttle > 0 { TEMP_RISE } else { -TEMP_FALL };
    let next = temp_c + per_frame * 60.0 * dt;
    if next.is_nan() {
        return VehicleState::MIN_TEMP_C;
    }
    next.clamp(VehicleState::MIN_TEMP_C, VehicleState::MAX_TEMP_C)
}

fn steer(current: f32, keys: HeldKeys, dt: f32) -> f32 {
    let next = match (keys.left, keys.right) {
        (true, false) => current - STEER_RATE * dt,
        (false, true) => current + STEER_RATE * dt,
        _ => current * (1.0 - STEER_DECAY * dt).max(0.0),
    };
    next.clamp(-1.0, 1.0)
}

/// Move an integer pedal toward 255 (held) or 0 (released).
///
/// The step is truncated like the pedal resolution, but never rounds down
/// to nothing while time is passing.
fn ramp(value: u8, held: bool, rise: f32, fall: f32, dt: f32) -> u8 {
    if dt <= 0.0 {
        return value;
    }
    let rate = if held { rise } else { fall };
    let step = ((rate * dt) as i32).clamp(1, 255);
    let next = if held {
        i32::from(value) + step
    } else {
        i32::from(value) - step
    };
    next.clamp(0, 255) as u8
}

fn pedal_ratio(raw: u8) -> f32 {
    f32::from(raw) / 255.0
}

fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: f32 = 1.0 / 60.0;

    fn run(mut state: VehicleState, keys: HeldKeys, ticks: usize) -> VehicleState {
        for _ in 0..ticks {
            state = advance(&state, keys, TICK);
        }
        state
    }

    #[test]
    fn test_zero_dt_changes_nothing() {
        let state = VehicleState::default();
        let keys = HeldKeys {
            gas: true,
            left: true,
            ..Default::default()
        };
        assert_eq!(advance(&state, keys, 0.0), state);
    }

    #[test]
    fn test_invalid_dt_is_treated_as_zero() {
        let state = VehicleState::default();
        let keys = HeldKeys {
            gas: true,
            ..Default::default()
        };
        assert_eq!(advance(&state, keys, f32::NAN), state);
        assert_eq!(advance(&state, keys, -1.0), state);
    }

    #[test]
    fn test_steering_moves_and_recenters() {
        let left = HeldKeys {
            left: true,
            ..Default::default()
        };
        let state = run(VehicleState::default(), left, 15);
        assert!((state.steer_norm + 0.5).abs() < 1e-4);

        let state = run(state, left, 60);
        assert_eq!(state.steer_norm, -1.0);

        let centered = run(state, HeldKeys::default(), 120);
        assert!(centered.steer_norm.abs() < 0.01);
        assert!(centered.steer_norm <= 0.0);
    }

    #[test]
    fn test_both_direction_keys_recenter() {
        let mut state = VehicleState::default();
        state.steer_norm = 0.6;
        let both = HeldKeys {
            left: true,
            right: true,
            ..Default::default()
        };
        let next = advance(&state, both, TICK);
        assert!((next.steer_norm - 0.6 * (1.0 - 3.0 * TICK)).abs() < 1e-6);
    }

    #[test]
    fn test_throttle_ramp_steps() {
        let gas = HeldKeys {
            gas: true,
            ..Default::default()
        };
        let state = advance(&VehicleState::default(), gas, TICK);
        assert_eq!(state.throttle, 7);

        let released = advance(&state, HeldKeys::default(), TICK);
        assert_eq!(released.throttle, 1);
    }

    #[test]
    fn test_tiny_dt_still_moves_pedals() {
        let keys = HeldKeys {
            gas: true,
            brake: true,
            ..Default::default()
        };
        let state = advance(&VehicleState::default(), keys, 0.0001);
        assert_eq!(state.throttle, 1);
        assert_eq!(state.brake, 1);
    }

    #[test]
    fn test_full_throttle_accelerates_and_revs() {
        let gas = HeldKeys {
            gas: true,
            ..Default::default()
        };
        let state = run(VehicleState::default(), gas, 600);
        assert_eq!(state.throttle, 255);
        assert!(state.speed_kmh > 100.0);
        assert!(state.rpm > 5000.0);
        assert!(state.rpm <= VehicleState::MAX_RPM);
    }

    #[test]
    fn test_braking_stops_the_car() {
        let mut state = VehicleState::default();
        state.speed_kmh = 120.0;
        let brake = HeldKeys {
            brake: true,
            ..Default::default()
        };
        let state = run(state, brake, 600);
        assert_eq!(state.speed_kmh, 0.0);
        assert_eq!(state.brake, 255);
    }

    #[test]
    fn test_rpm_lags_toward_target() {
        let mut state = VehicleState::default();
        state.rpm = 5000.0;
        let next = advance(&state, HeldKeys::default(), TICK);
        // target at standstill is idle, one tick closes 5/60 of the gap
        let expected = 5000.0 + (900.0 - 5000.0) * (5.0 * TICK);
        assert!((next.rpm - expected).abs() < 0.5);
    }

    #[test]
    fn test_temperature_rises_under_throttle() {
        let temp = advance_temperature(83.0, 10, TICK);
        assert!((temp - 83.02).abs() < 1e-4);

        let temp = advance_temperature(83.0, 0, TICK);
        assert!((temp - 82.985).abs() < 1e-4);
    }

    #[test]
    fn test_temperature_is_bounded() {
        assert_eq!(advance_temperature(104.99, 255, 10.0), 105.0);
        assert_eq!(advance_temperature(70.01, 0, 10.0), 70.0);
    }

    #[test]
    fn test_huge_dt_stays_bounded() {
        let keys = HeldKeys {
            gas: true,
            right: true,
            ..Default::default()
        };
        let state = advance(&VehicleState::default(), keys, 1.0e6);
        assert_eq!(state, state.clamped());
        assert_eq!(state.steer_norm, 1.0);
    }
}
