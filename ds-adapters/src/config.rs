//! Link selection from configuration

use crate::{DemoLink, ReplayLink, TcpLink, UdpLink};
use ds_core::link::TelemetryLink;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which telemetry link to use
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkConfig {
    /// Listen for datagrams from a UART bridge
    Udp { bind: String },
    /// Connect to a serial-over-TCP bridge
    Tcp { addr: String },
    /// Replay a raw capture file
    Replay {
        path: PathBuf,
        #[serde(default = "default_bytes_per_read")]
        bytes_per_read: usize,
        #[serde(default)]
        looped: bool,
    },
    /// Synthetic wheel
    Demo {
        #[serde(default)]
        corruption: f32,
    },
}

fn default_bytes_per_read() -> usize {
    crate::replay::DEFAULT_BYTES_PER_READ
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig::Demo { corruption: 0.0 }
    }
}

/// Create a link from configuration. The link is returned closed.
pub fn create_link(config: &LinkConfig) -> Box<dyn TelemetryLink> {
    match config {
        LinkConfig::Udp { bind } => Box::new(UdpLink::new(bind.clone())),
        LinkConfig::Tcp { addr } => Box::new(TcpLink::new(addr.clone())),
        LinkConfig::Replay {
            path,
            bytes_per_read,
            looped,
        } => Box::new(ReplayLink::new(path, *bytes_per_read, *looped)),
        LinkConfig::Demo { corruption } => Box::new(DemoLink::new(*corruption)),
    }
}
