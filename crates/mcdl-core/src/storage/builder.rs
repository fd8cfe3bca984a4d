//! Builder for creating and preallocating temp download files.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::writer::StorageWriter;
use crate::error::DownloadError;
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Builder for a new temp download file. Call `preallocate` then `build` to get
/// a `StorageWriter` that supports concurrent `write_at` from multiple workers.
pub struct StorageWriterBuilder {
    file: File,
    temp_path: PathBuf,
}

impl StorageWriterBuilder {
    /// Create a new temp file at `temp_path`, creating parent directories.
    /// Truncates whatever a previous attempt left behind.
    pub fn create(temp_path: &Path) -> Result<Self, DownloadError> {
        if let Some(parent) = temp_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DownloadError::io(parent, e))?;
        }
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .map_err(|e| DownloadError::io(temp_path, e))?;
        Ok(StorageWriterBuilder {
            file,
            temp_path: temp_path.to_path_buf(),
        })
    }

    /// Preallocate `size` bytes so workers can write any segment in any order.
    /// On Unix tries `posix_fallocate` first; falls back to `set_len`.
    pub fn preallocate(&mut self, size: u64) -> Result<(), DownloadError> {
        if size == 0 {
            return Ok(());
        }
        #[cfg(unix)]
        {
            let fd = self.file.as_raw_fd();
            let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
            if r == 0 {
                return Ok(());
            }
            tracing::debug!(errno = r, "posix_fallocate failed, falling back to set_len");
        }
        self.file
            .set_len(size)
            .map_err(|e| DownloadError::io(&self.temp_path, e))
    }

    /// Finish building and return a writer that can be shared for concurrent writes.
    pub fn build(self) -> StorageWriter {
        StorageWriter::from_file_and_path(self.file, self.temp_path)
    }
}
