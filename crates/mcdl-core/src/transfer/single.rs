//! Single-stream fallback: one GET, body written sequentially from offset 0.

use std::cell::{Cell, RefCell};
use std::str;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::DownloadError;
use crate::http::{parse_status_line, perform_error, CurlOptions, StopSignal};
use crate::probe::MAX_REDIRECTS;
use crate::progress::FileProgress;
use crate::storage::StorageWriter;

/// Download `url` with one GET on the blocking pool. Returns the bytes written.
pub async fn run(
    url: &str,
    expected_len: Option<u64>,
    storage: &StorageWriter,
    opts: &CurlOptions,
    progress: Arc<FileProgress>,
    cancel: &CancellationToken,
) -> Result<u64, DownloadError> {
    tracing::debug!(url, size = ?expected_len, "starting single-stream transfer");
    let url = url.to_string();
    let storage = storage.clone();
    let opts = opts.clone();
    let stop = StopSignal::new(cancel.clone());
    tokio::task::spawn_blocking(move || {
        download_single(&url, expected_len, &storage, &opts, &progress, &stop)
    })
    .await?
}

fn download_single(
    url: &str,
    expected_len: Option<u64>,
    storage: &StorageWriter,
    opts: &CurlOptions,
    progress: &FileProgress,
    stop: &StopSignal,
) -> Result<u64, DownloadError> {
    let status = Cell::new(0u32);
    let written = Cell::new(0u64);
    let failure: RefCell<Option<DownloadError>> = RefCell::new(None);

    let mut easy = opts.easy(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS as u32)?;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Some(code) = str::from_utf8(data).ok().and_then(parse_status_line) {
                status.set(code);
            }
            true
        })?;
        transfer.write_function(|data| {
            let code = status.get();
            if !(200..300).contains(&code) {
                *failure.borrow_mut() = Some(DownloadError::HttpStatus {
                    url: url.to_string(),
                    status: code,
                });
                return Ok(0);
            }
            let off = written.get();
            let received = off + data.len() as u64;
            if let Some(expected) = expected_len {
                if received > expected {
                    *failure.borrow_mut() = Some(DownloadError::LengthMismatch { expected, received });
                    return Ok(0);
                }
            }
            if let Err(e) = storage.write_at(off, data) {
                *failure.borrow_mut() = Some(e);
                return Ok(0);
            }
            written.set(received);
            progress.add(data.len() as u64);
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !stop.should_stop())?;
        transfer.perform()
    };

    if let Some(e) = failure.into_inner() {
        return Err(e);
    }
    performed.map_err(|e| perform_error(e, stop))?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: code,
        });
    }
    let received = written.get();
    if let Some(expected) = expected_len {
        if received != expected {
            return Err(DownloadError::LengthMismatch { expected, received });
        }
    }
    Ok(received)
}
