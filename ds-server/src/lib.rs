//! DriveSync Server Library
//!
//! Exposes server components for integration testing.

pub mod api;
pub mod config;
pub mod control;
pub mod sinks;
pub mod state;
