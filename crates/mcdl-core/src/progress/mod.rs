//! Progress reporting: per-file byte counters, periodic snapshots (rate, ETA)
//! and human-readable sizes for the CLI.

mod aggregator;
mod counter;
mod format;
mod snapshot;

pub(crate) use aggregator::run_aggregator;
pub use counter::FileProgress;
pub use format::format_size;
pub use snapshot::{FileSnapshot, ProgressSnapshot, SpeedMeter};
