//! Byte transfer for one attempt: segmented (parallel ranged GETs) or a single stream.

pub mod segmented;
pub mod single;

use std::sync::Arc;

use crate::progress::FileProgress;
use crate::segmenter::SegmentPlanner;

/// State of one attempt of one file, created once the probe completes.
#[derive(Debug)]
pub struct TransferState {
    pub resolved_url: String,
    pub total_bytes: Option<u64>,
    /// Present only for segmented transfers.
    pub planner: Option<Arc<SegmentPlanner>>,
    pub progress: Arc<FileProgress>,
}
