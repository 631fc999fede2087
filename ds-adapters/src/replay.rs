//! Replay link: raw capture of a serial session, metered out per read
//!
//! A capture is the exact byte stream the wheel sent, with no framing of
//! its own. Reads are limited to `bytes_per_read` so a capture replays at
//! roughly the pace it was recorded when polled once per tick.

use ds_core::codec::FRAME_LEN;
use ds_core::link::{LinkError, TelemetryLink};
use std::path::{Path, PathBuf};

/// One frame per 60Hz poll
pub const DEFAULT_BYTES_PER_READ: usize = FRAME_LEN;

pub struct ReplayLink {
    name: String,
    path: PathBuf,
    bytes_per_read: usize,
    looped: bool,
    data: Option<Vec<u8>>,
    position: usize,
}

impl ReplayLink {
    pub fn new(path: impl AsRef<Path>, bytes_per_read: usize, looped: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("replay://{}", path.display()),
            path,
            bytes_per_read: bytes_per_read.max(1),
            looped,
            data: None,
            position: 0,
        }
    }

    /// True once a non-looping capture has been fully consumed
    pub fn is_finished(&self) -> bool {
        match &self.data {
            Some(data) => !self.looped && self.position >= data.len(),
            None => false,
        }
    }
}

impl TelemetryLink for ReplayLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&mut self) -> Result<(), LinkError> {
        if self.data.is_some() {
            return Ok(());
        }
        let data = std::fs::read(&self.path)
            .map_err(|e| LinkError::io(format!("read {}", self.path.display()), e))?;
        self.data = Some(data);
        self.position = 0;
        Ok(())
    }

    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, LinkError> {
        if self.is_finished() {
            return Ok(Vec::new());
        }
        let data = self.data.as_ref().ok_or(LinkError::NotOpen)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        if self.position >= data.len() {
            self.position = 0;
        }

        let take = max.min(self.bytes_per_read).min(data.len() - self.position);
        let chunk = data[self.position..self.position + take].to_vec();
        self.position += take;
        Ok(chunk)
    }

    fn close(&mut self) {
        self.data = None;
        self.position = 0;
    }

    fn is_open(&self) -> bool {
        self.data.is_some()
    }
}
