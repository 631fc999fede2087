//! Telemetry links for DriveSync

pub mod config;
pub mod demo;
pub mod replay;
pub mod tcp;
pub mod udp;

pub use config::{create_link, LinkConfig};
pub use demo::DemoLink;
pub use replay::ReplayLink;
pub use tcp::TcpLink;
pub use udp::UdpLink;
