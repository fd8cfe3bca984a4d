//! Multi-segment transfer: workers pull segments from a shared planner and
//! write each ranged body at its offset in the temp file.

use std::cell::{Cell, RefCell};
use std::str;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::DownloadError;
use crate::http::{parse_status_line, perform_error, CurlOptions, StopSignal};
use crate::progress::FileProgress;
use crate::segmenter::{Segment, SegmentPlanner};
use crate::storage::StorageWriter;

/// Download every segment of `planner` with `workers` blocking workers.
///
/// The first worker failure stops the others from taking new segments and
/// aborts their in-flight requests; that failure is the attempt's error.
pub async fn run(
    url: &str,
    planner: Arc<SegmentPlanner>,
    workers: usize,
    storage: &StorageWriter,
    opts: &CurlOptions,
    progress: Arc<FileProgress>,
    cancel: &CancellationToken,
) -> Result<(), DownloadError> {
    let stop = StopSignal::new(cancel.clone());
    let workers = workers.clamp(1, planner.total_segments().max(1) as usize);
    tracing::debug!(
        url,
        segments = planner.total_segments(),
        workers,
        "starting segmented transfer"
    );

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let url = url.to_string();
        let planner = Arc::clone(&planner);
        let storage = storage.clone();
        let opts = opts.clone();
        let progress = Arc::clone(&progress);
        let stop = stop.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            worker_loop(&url, &planner, &storage, &opts, &progress, &stop)
        }));
    }

    let mut first_err = None;
    for handle in handles {
        let res = handle.await.map_err(DownloadError::from).and_then(|r| r);
        if let Err(e) = res {
            first_err.get_or_insert(e);
        }
    }
    if cancel.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn worker_loop(
    url: &str,
    planner: &SegmentPlanner,
    storage: &StorageWriter,
    opts: &CurlOptions,
    progress: &FileProgress,
    stop: &StopSignal,
) -> Result<(), DownloadError> {
    while !stop.should_stop() {
        let Some(segment) = planner.next_segment() else {
            return Ok(());
        };
        if let Err(e) = fetch_segment(url, &segment, storage, opts, progress, stop) {
            if stop.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            // Aborted because another worker already failed: that error wins.
            if stop.sibling_failed() {
                return Ok(());
            }
            stop.fail_siblings();
            tracing::debug!(segment = segment.index, error = %e, "segment failed");
            return Err(e);
        }
    }
    if stop.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }
    Ok(())
}

/// GET one segment with `Range` and write it at `segment.start`.
fn fetch_segment(
    url: &str,
    segment: &Segment,
    storage: &StorageWriter,
    opts: &CurlOptions,
    progress: &FileProgress,
    stop: &StopSignal,
) -> Result<(), DownloadError> {
    let expected = segment.len();
    let status = Cell::new(0u32);
    let written = Cell::new(0u64);
    let failure: RefCell<Option<DownloadError>> = RefCell::new(None);

    let mut easy = opts.easy(url)?;
    easy.follow_location(true)?;
    easy.range(&segment.curl_range())?;
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
            if code != 206 {
                *failure.borrow_mut() = Some(bad_status(url, code));
                return Ok(0);
            }
            let off = written.get();
            let received = off + data.len() as u64;
            if received > expected {
                *failure.borrow_mut() = Some(DownloadError::LengthMismatch { expected, received });
                return Ok(0);
            }
            if let Err(e) = storage.write_at(segment.start + off, data) {
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
    if code != 206 {
        return Err(bad_status(url, code));
    }
    let received = written.get();
    if received != expected {
        return Err(DownloadError::LengthMismatch { expected, received });
    }
    Ok(())
}

/// A 2xx other than 206 means the server ignored `Range`; anything else is an HTTP failure.
fn bad_status(url: &str, status: u32) -> DownloadError {
    if (200..300).contains(&status) {
        DownloadError::InvalidRangeResponse { status }
    } else {
        DownloadError::HttpStatus {
            url: url.to_string(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_status_classes() {
        assert!(matches!(
            bad_status("http://x/", 200),
            DownloadError::InvalidRangeResponse { status: 200 }
        ));
        assert!(matches!(
            bad_status("http://x/", 500),
            DownloadError::HttpStatus { status: 500, .. }
        ));
    }
}
