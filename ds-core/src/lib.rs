//! DriveSync Core Library
//!
//! This crate provides the vehicle data model, the steering-wheel telemetry
//! codec and decoder, the simplified physics model, lap timing, and the
//! link and sink traits the control loop is built on.

pub mod codec;
pub mod decoder;
pub mod input;
pub mod lap;
pub mod link;
pub mod model;
pub mod physics;
pub mod sink;
pub mod units;

pub use codec::TelemetryFrame;
pub use decoder::{DecoderStats, FrameDecoder};
pub use input::{Control, InputEvent};
pub use lap::{LapRecord, LapTimer};
pub use link::{LinkError, TelemetryLink};
pub use model::{InputSource, StateSnapshot, VehicleState};
pub use physics::HeldKeys;
pub use sink::{Button, GamepadReport, OutputSink, SinkError};
