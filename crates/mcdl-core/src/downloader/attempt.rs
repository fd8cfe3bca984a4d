//! One attempt of one file: probe, plan, transfer, verify, finalize.

use std::fs::File;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::Downloader;
use crate::checksum::{sha1_matches, sha1_reader};
use crate::error::DownloadError;
use crate::probe::probe_async;
use crate::progress::FileProgress;
use crate::request::DownloadRequest;
use crate::segmenter::SegmentPlanner;
use crate::storage::{temp_path, StorageWriter, StorageWriterBuilder};
use crate::transfer::{segmented, single, TransferState};

impl Downloader {
    /// Every attempt starts from scratch: a fresh probe and a truncated `.part` file.
    pub(super) async fn attempt(
        &self,
        request: &DownloadRequest,
        progress: &Arc<FileProgress>,
        cancel: &CancellationToken,
        attempt: u32,
    ) -> Result<(), DownloadError> {
        if attempt > 0 {
            tracing::info!(url = %request.url, attempt = attempt + 1, "retrying download");
        }
        let probe = probe_async(request.url.clone(), self.inner.curl.clone(), cancel.clone()).await?;
        let reported = probe.reported_size();
        if let (Some(received), Some(expected)) = (reported, request.expected_size) {
            if received != expected {
                return Err(DownloadError::LengthMismatch { expected, received });
            }
        }
        let total = reported.or(request.expected_size);
        progress.begin_attempt(total);

        let mut builder = StorageWriterBuilder::create(&temp_path(&request.destination))?;
        if let Some(size) = total {
            builder.preallocate(size)?;
        }
        let writer = builder.build();

        let cfg = &self.inner.config;
        // A caller's hint alone never drives segmenting; the single stream checks it instead.
        let planner = match reported {
            Some(size) if size > 0 && probe.supports_range && cfg.enable_fragment => {
                Some(Arc::new(SegmentPlanner::new(size, cfg.segment_size)))
            }
            _ => None,
        };
        let state = TransferState {
            resolved_url: probe.resolved_url,
            total_bytes: total,
            planner,
            progress: Arc::clone(progress),
        };

        let outcome = match self.transfer(&state, &writer, cancel).await {
            Ok(()) => self.verify(request, &writer).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => writer.finalize(&request.destination),
            Err(e) => {
                writer.discard();
                Err(e)
            }
        }
    }

    async fn transfer(
        &self,
        state: &TransferState,
        writer: &StorageWriter,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        let curl = &self.inner.curl;
        match &state.planner {
            Some(planner) => {
                let segments = usize::try_from(planner.total_segments()).unwrap_or(usize::MAX);
                let workers = self.inner.config.max_threads.min(segments);
                segmented::run(
                    &state.resolved_url,
                    Arc::clone(planner),
                    workers,
                    writer,
                    curl,
                    Arc::clone(&state.progress),
                    cancel,
                )
                .await
            }
            None => single::run(
                &state.resolved_url,
                state.total_bytes,
                writer,
                curl,
                Arc::clone(&state.progress),
                cancel,
            )
            .await
            .map(|_| ()),
        }
    }

    /// Compare the `.part` file against `request.sha1`, if one was given.
    async fn verify(
        &self,
        request: &DownloadRequest,
        writer: &StorageWriter,
    ) -> Result<(), DownloadError> {
        let Some(expected) = request.sha1.clone() else {
            return Ok(());
        };
        let path = writer.temp_path().to_path_buf();
        let actual = tokio::task::spawn_blocking(move || {
            File::open(&path)
                .and_then(sha1_reader)
                .map_err(|e| DownloadError::io(&path, e))
        })
        .await??;
        if !sha1_matches(&actual, &expected) {
            return Err(DownloadError::Sha1Mismatch {
                path: request.destination.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }
}
