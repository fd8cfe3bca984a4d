//! Segment type and fixed-size range planning.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default segment size: 1 MiB.
pub const DEFAULT_SEGMENT_SIZE: u64 = 1024 * 1024;

/// A single segment: byte range `[start, end]` (both inclusive, as in HTTP `Range`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment index within the plan.
    pub index: u64,
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl Segment {
    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Range in the form libcurl expects (`start-end`, no unit).
    pub fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Work queue of fixed-size segments for one file.
///
/// `next_segment` hands out each index exactly once, in increasing order,
/// to whichever worker asks first.
#[derive(Debug)]
pub struct SegmentPlanner {
    total_size: u64,
    segment_size: u64,
    total_segments: u64,
    next_index: AtomicU64,
}

impl SegmentPlanner {
    /// Plan `ceil(total_size / segment_size)` segments. A zero segment size is treated as 1.
    pub fn new(total_size: u64, segment_size: u64) -> Self {
        let segment_size = segment_size.max(1);
        Self {
            total_size,
            segment_size,
            total_segments: total_size.div_ceil(segment_size),
            next_index: AtomicU64::new(0),
        }
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn segment_size(&self) -> u64 {
        self.segment_size
    }

    pub fn total_segments(&self) -> u64 {
        self.total_segments
    }

    /// Claim the next unassigned segment, or `None` once all have been handed out.
    pub fn next_segment(&self) -> Option<Segment> {
        let index = self.next_index.fetch_add(1, Ordering::AcqRel);
        self.segment_at(index)
    }

    /// Bounds of segment `index` without claiming it.
    pub fn segment_at(&self, index: u64) -> Option<Segment> {
        if index >= self.total_segments {
            return None;
        }
        let start = index * self.segment_size;
        let end = (start + self.segment_size).min(self.total_size) - 1;
        Some(Segment { index, start, end })
    }
}
