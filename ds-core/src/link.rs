//! Telemetry link trait definition

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link is not open")]
    NotOpen,

    #[error("link closed by peer")]
    Disconnected,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl LinkError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        LinkError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Byte-stream source carrying telemetry frames
///
/// Each implementation is responsible for:
/// - Acquiring its transport in `open` (socket, file, synthetic generator)
/// - Returning whatever bytes are ready without blocking
/// - Releasing the transport in `close`
///
/// Links know nothing about framing. Bytes may arrive in any chunking and
/// may be corrupted; the decoder deals with both.
pub trait TelemetryLink: Send {
    /// Human-readable name (e.g., "udp://0.0.0.0:5005")
    fn name(&self) -> &str;

    /// Acquire the transport. Calling `open` on an open link is a no-op.
    fn open(&mut self) -> Result<(), LinkError>;

    /// Read up to `max` bytes that are ready now.
    ///
    /// Returns an empty vector when nothing is pending. Never blocks.
    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, LinkError>;

    /// Release the transport. Safe to call more than once.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}
