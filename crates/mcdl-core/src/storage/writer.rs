//! Concurrent offset writer for temp download files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::DownloadError;

/// Writer for a temp download file. Safe to clone and use from multiple workers;
/// each `write_at` is independent (pwrite-style) and never moves a shared cursor.
#[derive(Clone)]
pub struct StorageWriter {
    file: Arc<File>,
    temp_path: PathBuf,
}

impl StorageWriter {
    pub(crate) fn from_file_and_path(file: File, temp_path: PathBuf) -> Self {
        Self {
            file: Arc::new(file),
            temp_path,
        }
    }

    /// Write all of `data` at `offset`.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<(), DownloadError> {
        write_all_at(&self.file, offset, data).map_err(|e| DownloadError::io(&self.temp_path, e))
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file onto `final_path`. Consumes the writer and closes its handle;
    /// worker clones must already be dropped.
    pub fn finalize(self, final_path: &Path) -> Result<(), DownloadError> {
        let temp_path = self.temp_path.clone();
        drop(self.file);

        std::fs::rename(&temp_path, final_path).map_err(|e| DownloadError::io(final_path, e))
    }

    /// Close and remove the temp file. Errors are ignored; the next attempt truncates anyway.
    pub fn discard(self) {
        let temp_path = self.temp_path.clone();
        drop(self.file);
        if let Err(e) = std::fs::remove_file(&temp_path) {
            tracing::debug!(path = %temp_path.display(), error = %e, "could not remove temp file");
        }
    }
}

#[cfg(unix)]
fn write_all_at(file: &File, offset: u64, data: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(data, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut offset: u64, mut data: &[u8]) -> std::io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !data.is_empty() {
        let n = file.seek_write(data, offset)?;
        if n == 0 {
            return Err(std::io::ErrorKind::WriteZero.into());
        }
        data = &data[n..];
        offset += n as u64;
    }
    Ok(())
}
