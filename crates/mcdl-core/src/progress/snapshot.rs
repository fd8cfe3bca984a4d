//! Progress snapshots and the rate/ETA math behind them.

use std::time::{Duration, Instant};

/// Snapshot of a download or batch, produced once per aggregator tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Bytes per second over the last tick.
    pub speed_bytes_per_sec: f64,
    pub downloaded_bytes: u64,
    /// Sum of known sizes; files of unknown size count as 0.
    pub total_bytes: u64,
    pub estimated_remaining: Duration,
    /// Files that reached a terminal outcome.
    pub completed_count: usize,
    pub total_count: usize,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return if self.completed_count == self.total_count { 1.0 } else { 0.0 };
        }
        (self.downloaded_bytes as f64 / self.total_bytes as f64).min(1.0)
    }

    /// Same counts with the rate (and the ETA derived from it) filled in.
    pub(crate) fn with_speed(self, speed: f64) -> Self {
        Self {
            speed_bytes_per_sec: speed,
            estimated_remaining: eta(self.downloaded_bytes, self.total_bytes, speed),
            ..self
        }
    }
}

/// Snapshot of one member of a batch, tagged with its position in the group.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSnapshot {
    pub index: usize,
    pub snapshot: ProgressSnapshot,
}

/// Rate over the interval between consecutive samples.
#[derive(Debug, Clone)]
pub struct SpeedMeter {
    prev_bytes: u64,
    prev_at: Instant,
}

impl SpeedMeter {
    pub fn new(start: Instant) -> Self {
        Self {
            prev_bytes: 0,
            prev_at: start,
        }
    }

    /// Bytes per second since the previous sample (0 if no time passed).
    /// A counter that went backwards (new attempt) counts as no progress.
    pub fn sample(&mut self, bytes: u64, at: Instant) -> f64 {
        let delta_bytes = bytes.saturating_sub(self.prev_bytes);
        let delta_t = at.saturating_duration_since(self.prev_at).as_secs_f64();
        self.prev_bytes = bytes;
        self.prev_at = at;
        if delta_t <= 0.0 {
            return 0.0;
        }
        delta_bytes as f64 / delta_t
    }
}

/// Time left at `speed`; zero when the speed is zero or nothing remains.
fn eta(downloaded: u64, total: u64, speed: f64) -> Duration {
    let remaining = total.saturating_sub(downloaded);
    if speed <= 0.0 || remaining == 0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(remaining as f64 / speed).unwrap_or(Duration::MAX)
}
