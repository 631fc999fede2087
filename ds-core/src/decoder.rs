//! Stateful byte-stream decoder for telemetry frames
//!
//! Bytes arrive from the link in arbitrary chunks: frames may be split
//! across reads, preceded by line noise, or damaged in transit. The decoder
//! keeps a bounded ring buffer of pending bytes and realigns on frame
//! boundaries one byte at a time:
//!
//! - a byte that is not the header is dropped on its own
//! - a header followed by a bad separator drops only the header byte, so a
//!   real frame starting one byte later is never skipped
//!
//! Corruption is an expected operating condition on a noisy link and is
//! never reported as an error. It shows up in [`DecoderStats`] instead.

use crate::codec::{Decoded, TelemetryFrame, FRAME_LEN, HEADER};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Upper bound on bytes held between calls
pub const MAX_BUFFERED: usize = FRAME_LEN * 64;

/// Diagnostic counters, monotonically increasing until [`FrameDecoder::reset`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderStats {
    /// Valid frames emitted
    pub frames: u64,
    /// Bytes dropped while searching for a header
    pub resync_bytes: u64,
    /// Candidate frames rejected for a separator mismatch
    pub corrupt_frames: u64,
    /// Decoded fields pulled back into their declared range
    pub clamped_fields: u64,
    /// Bytes evicted because the buffer was full
    pub overflow_bytes: u64,
}

impl DecoderStats {
    /// Total corruption events seen on the link
    pub fn corruption_count(&self) -> u64 {
        self.resync_bytes + self.corrupt_frames
    }
}

#[derive(Debug)]
pub struct FrameDecoder {
    buf: VecDeque<u8>,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buf: VecDeque::with_capacity(MAX_BUFFERED),
            stats: DecoderStats::default(),
        }
    }

    /// Feed bytes and iterate over the frames they complete.
    ///
    /// Input is moved into the buffer lazily as the iterator is pulled, so
    /// memory stays bounded regardless of the chunk size. Dropping the
    /// iterator early keeps the remaining input buffered for the next call.
    pub fn ingest<'d, 'b>(&'d mut self, bytes: &'b [u8]) -> Frames<'d, 'b> {
        Frames {
            decoder: self,
            input: bytes,
        }
    }

    /// Discard pending bytes and counters
    pub fn reset(&mut self) {
        self.buf.clear();
        self.stats = DecoderStats::default();
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Bytes waiting for the rest of a frame
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn free_space(&self) -> usize {
        MAX_BUFFERED.saturating_sub(self.buf.len())
    }

    /// Scan the buffer until a frame is found or fewer than
    /// [`FRAME_LEN`] bytes remain
    fn next_frame(&mut self) -> Option<TelemetryFrame> {
        while self.buf.len() >= FRAME_LEN {
            if self.buf.front() != Some(&HEADER) {
                self.buf.pop_front();
                self.stats.resync_bytes += 1;
                continue;
            }

            let mut candidate = [0u8; FRAME_LEN];
            for (slot, byte) in candidate.iter_mut().zip(self.buf.iter()) {
                *slot = *byte;
            }

            match TelemetryFrame::decode(&candidate) {
                Decoded::Frame { frame, clamped } => {
                    self.buf.drain(..FRAME_LEN);
                    self.stats.frames += 1;
                    self.stats.clamped_fields += u64::from(clamped);
                    return Some(frame);
                }
                Decoded::BadSeparator => {
                    self.buf.pop_front();
                    self.stats.corrupt_frames += 1;
                }
                Decoded::BadHeader => {
                    self.buf.pop_front();
                    self.stats.resync_bytes += 1;
                }
            }
        }
        None
    }

    /// Append without scanning, evicting the oldest bytes past the cap
    fn push_bounded(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().copied());
        let excess = self.buf.len().saturating_sub(MAX_BUFFERED);
        if excess > 0 {
            self.buf.drain(..excess);
            self.stats.overflow_bytes += excess as u64;
        }
    }
}

/// Lazy iterator returned by [`FrameDecoder::ingest`]
pub struct Frames<'d, 'b> {
    decoder: &'d mut FrameDecoder,
    input: &'b [u8],
}

impl Iterator for Frames<'_, '_> {
    type Item = TelemetryFrame;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(frame) = self.decoder.next_frame() {
                return Some(frame);
            }
            if self.input.is_empty() {
                return None;
            }
            // next_frame leaves fewer than FRAME_LEN bytes, so there is room
            let take = self.decoder.free_space().min(self.input.len());
            let (chunk, rest) = self.input.split_at(take);
            self.decoder.buf.extend(chunk.iter().copied());
            self.input = rest;
        }
    }
}

impl Drop for Frames<'_, '_> {
    fn drop(&mut self) {
        let rest = std::mem::take(&mut self.input);
        if !rest.is_empty() {
            self.decoder.push_bounded(rest);
        }
    }
}
