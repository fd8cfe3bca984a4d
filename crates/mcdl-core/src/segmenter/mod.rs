//! Range math and segment planning.
//!
//! Splits a download into fixed-size segments and hands them out to workers
//! through a lock-free cursor.

mod range;

pub use range::{Segment, SegmentPlanner, DEFAULT_SEGMENT_SIZE};
