//! Disk I/O and file lifecycle.
//!
//! Each attempt writes into `<destination>.part`: created fresh (truncating a
//! leftover from a failed attempt), preallocated when the length is known,
//! written at explicit offsets by any number of workers, and finally renamed
//! onto the destination.

mod builder;
mod writer;

pub use builder::StorageWriterBuilder;
pub use writer::StorageWriter;

use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `client.jar` → `client.jar.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}
