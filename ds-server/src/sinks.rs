//! Output sink implementations
//!
//! Sinks stand in for the virtual gamepad. Each one stages the values set
//! during a tick and delivers a single [`GamepadReport`] on `commit`.

use crate::config::SinkConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ds_core::sink::{Button, GamepadReport, OutputSink, SinkError};
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::trace;

/// Logs every committed report at trace level
#[derive(Default)]
pub struct LogSink {
    staged: GamepadReport,
    last: Option<GamepadReport>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently committed report
    pub fn last(&self) -> Option<GamepadReport> {
        self.last
    }
}

impl OutputSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn set_steering(&mut self, value: i16) {
        self.staged.steering = value;
    }

    fn set_throttle(&mut self, value: u8) {
        self.staged.throttle = value;
    }

    fn set_brake(&mut self, value: u8) {
        self.staged.brake = value;
    }

    fn set_button(&mut self, button: Button, pressed: bool) {
        self.staged.set_button(button, pressed);
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        trace!(report = ?self.staged, "pad commit");
        self.last = Some(self.staged);
        Ok(())
    }

    fn reset(&mut self) {
        self.staged = GamepadReport::default();
    }
}

/// UDP sink: one JSON report per datagram, for a bridge process that owns
/// the virtual pad driver
pub struct UdpSink {
    socket: UdpSocket,
    addr: SocketAddr,
    staged: GamepadReport,
}

impl UdpSink {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .with_context(|| format!("no address for {}:{}", host, port))?;
        Ok(Self {
            socket,
            addr,
            staged: GamepadReport::default(),
        })
    }
}

impl OutputSink for UdpSink {
    fn name(&self) -> &str {
        "udp"
    }

    fn set_steering(&mut self, value: i16) {
        self.staged.steering = value;
    }

    fn set_throttle(&mut self, value: u8) {
        self.staged.throttle = value;
    }

    fn set_brake(&mut self, value: u8) {
        self.staged.brake = value;
    }

    fn set_button(&mut self, button: Button, pressed: bool) {
        self.staged.set_button(button, pressed);
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        let json = serde_json::to_vec(&self.staged)?;
        match self.socket.send_to(&json, self.addr) {
            Ok(_) => Ok(()),
            // Full send buffer: this report is dropped, the next tick carries fresh state
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                trace!("udp sink send buffer full, report dropped");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn reset(&mut self) {
        self.staged = GamepadReport::default();
    }
}

#[derive(Serialize)]
struct FileRecord<'a> {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a GamepadReport,
}

/// File sink (NDJSON)
pub struct FileSink {
    file: std::fs::File,
    staged: GamepadReport,
}

impl FileSink {
    pub fn new(path: &str) -> Result<Self> {
        use std::fs::OpenOptions;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open sink file {}", path))?;
        Ok(Self {
            file,
            staged: GamepadReport::default(),
        })
    }
}

impl OutputSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn set_steering(&mut self, value: i16) {
        self.staged.steering = value;
    }

    fn set_throttle(&mut self, value: u8) {
        self.staged.throttle = value;
    }

    fn set_brake(&mut self, value: u8) {
        self.staged.brake = value;
    }

    fn set_button(&mut self, button: Button, pressed: bool) {
        self.staged.set_button(button, pressed);
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        let record = FileRecord {
            timestamp: Utc::now(),
            report: &self.staged,
        };
        let json = serde_json::to_string(&record)?;
        writeln!(self.file, "{}", json)?;
        Ok(())
    }

    fn reset(&mut self) {
        self.staged = GamepadReport::default();
    }
}

/// Create a sink from configuration
pub fn create_sink(config: &SinkConfig) -> Result<Box<dyn OutputSink>> {
    match config {
        SinkConfig::Log => Ok(Box::new(LogSink::new())),
        SinkConfig::Udp { host, port } => Ok(Box::new(UdpSink::new(host, *port)?)),
        SinkConfig::File { path } => Ok(Box::new(FileSink::new(path)?)),
    }
}
