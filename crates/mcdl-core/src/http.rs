//! Shared libcurl handle setup and stop signalling for blocking transfers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use curl::easy::Easy;
use tokio_util::sync::CancellationToken;

use crate::config::DownloaderConfig;
use crate::error::DownloadError;

/// Per-handle options derived from [`DownloaderConfig`].
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Bytes/s below which a transfer counts as stalled.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub buffer_size: Option<usize>,
    pub user_agent: String,
}

impl CurlOptions {
    pub fn from_config(cfg: &DownloaderConfig) -> Self {
        Self {
            connect_timeout: cfg.connect_timeout(),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: cfg.low_speed_time(),
            buffer_size: cfg.buffer_size,
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// New handle for `url` with timeouts, user agent and the progress callback enabled.
    pub(crate) fn easy(&self, url: &str) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        easy.url(url)?;
        easy.useragent(&self.user_agent)?;
        easy.connect_timeout(self.connect_timeout)?;
        // Stalls are caught by the low-speed check instead of a wall-clock timeout.
        if self.low_speed_limit > 0 {
            easy.low_speed_limit(self.low_speed_limit)?;
            easy.low_speed_time(self.low_speed_time)?;
        }
        if let Some(sz) = self.buffer_size {
            easy.buffer_size(sz)?;
        }
        easy.progress(true)?;
        Ok(easy)
    }
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self::from_config(&DownloaderConfig::default())
    }
}

/// Tells a blocking transfer to abort: either the caller cancelled, or a sibling
/// worker of the same file failed.
#[derive(Debug, Clone)]
pub(crate) struct StopSignal {
    cancel: CancellationToken,
    sibling_failed: Arc<AtomicBool>,
}

impl StopSignal {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            sibling_failed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.sibling_failed.load(Ordering::Acquire)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn sibling_failed(&self) -> bool {
        self.sibling_failed.load(Ordering::Acquire)
    }

    pub(crate) fn fail_siblings(&self) {
        self.sibling_failed.store(true, Ordering::Release);
    }
}

/// Map a `perform()` error, turning an abort requested by the caller into `Cancelled`.
pub(crate) fn perform_error(e: curl::Error, stop: &StopSignal) -> DownloadError {
    if e.is_aborted_by_callback() && stop.is_cancelled() {
        DownloadError::Cancelled
    } else {
        DownloadError::Curl(e)
    }
}

/// Status code from a header line such as `HTTP/1.1 206 Partial Content`.
pub(crate) fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}
