//! Error type shared by the probe, the transfer paths and the downloader facade.
//!
//! Every attempt of a file download ends in `Result<_, DownloadError>`. The
//! retry layer classifies the error (see [`crate::retry::classify`]) and the
//! facade turns the last one into [`crate::DownloadResult::Failed`].

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// libcurl reported a transport failure (timeout, reset, DNS, ...).
    #[error("curl: {0}")]
    Curl(#[from] curl::Error),

    /// Non-success status outside the handled redirects.
    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u32 },

    /// A ranged GET was answered with something other than 206.
    #[error("ranged GET answered with HTTP {status} instead of 206")]
    InvalidRangeResponse { status: u32 },

    /// Body length differs from the segment or file length.
    #[error("length mismatch: expected {expected} bytes, received {received}")]
    LengthMismatch { expected: u64, received: u64 },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("SHA-1 mismatch for {}: expected {expected}, got {actual}", path.display())]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("too many redirects starting at {url}")]
    TooManyRedirects { url: String },

    #[error("redirect from {url} carries no usable Location header")]
    BadRedirect { url: String },

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    /// A blocking transfer task panicked or was torn down by the runtime.
    #[error("transfer worker failed: {0}")]
    Worker(String),

    /// The caller's cancellation token fired. Never retried.
    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        DownloadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}

impl From<tokio::task::JoinError> for DownloadError {
    fn from(e: tokio::task::JoinError) -> Self {
        if e.is_cancelled() {
            DownloadError::Cancelled
        } else {
            DownloadError::Worker(e.to_string())
        }
    }
}
