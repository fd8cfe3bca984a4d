//! Lock-free byte counters for one file.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

const UNKNOWN: u64 = u64::MAX;

/// Counters shared by a file's transfer workers and the aggregator.
///
/// Reset at the start of every attempt, so within one attempt `downloaded`
/// only grows; batch totals are re-summed from these on every tick.
#[derive(Debug)]
pub struct FileProgress {
    total: AtomicU64,
    downloaded: AtomicU64,
    finished: AtomicBool,
}

impl FileProgress {
    /// `expected` is the caller's size hint, reported until a probe resolves the real size.
    pub fn new(expected: Option<u64>) -> Self {
        Self {
            total: AtomicU64::new(expected.unwrap_or(UNKNOWN)),
            downloaded: AtomicU64::new(0),
            finished: AtomicBool::new(false),
        }
    }

    pub(crate) fn begin_attempt(&self, total: Option<u64>) {
        self.downloaded.store(0, Ordering::Release);
        if let Some(t) = total {
            self.total.store(t, Ordering::Release);
        }
    }

    pub(crate) fn add(&self, n: u64) {
        self.downloaded.fetch_add(n, Ordering::AcqRel);
    }

    /// Mark the file terminal (any outcome).
    pub(crate) fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::Acquire)
    }

    pub fn total(&self) -> Option<u64> {
        match self.total.load(Ordering::Acquire) {
            UNKNOWN => None,
            t => Some(t),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}
