//! Lap timing from discrete "lap complete" events

use std::time::Duration;

/// Current, last and best lap times
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LapRecord {
    /// Time since the current lap started
    pub current: Duration,
    pub last: Option<Duration>,
    pub best: Option<Duration>,
    /// Completed laps
    pub count: u32,
}

/// Tracks lap durations against a monotonic clock.
///
/// Times are passed in as offsets from a caller-owned epoch (typically an
/// `Instant` captured at startup) so the timer can be driven
/// deterministically in tests.
#[derive(Debug, Clone)]
pub struct LapTimer {
    lap_start: Duration,
    record: LapRecord,
}

impl LapTimer {
    /// Start timing the first lap at `start`
    pub fn new(start: Duration) -> Self {
        Self {
            lap_start: start,
            record: LapRecord::default(),
        }
    }

    /// Close the running lap and start the next one at `now`
    pub fn on_lap_complete(&mut self, now: Duration) -> LapRecord {
        let lap = now.saturating_sub(self.lap_start);
        self.record.last = Some(lap);
        self.record.best = Some(match self.record.best {
            Some(best) => best.min(lap),
            None => lap,
        });
        self.record.count += 1;
        self.record.current = Duration::ZERO;
        self.lap_start = now;
        self.record
    }

    /// Refresh and return the running lap time
    pub fn tick(&mut self, now: Duration) -> Duration {
        self.record.current = now.saturating_sub(self.lap_start);
        self.record.current
    }

    pub fn record(&self) -> &LapRecord {
        &self.record
    }
}
