//! Downloader facade: single files and batches, each file under one
//! concurrency slot and wrapped in the retry policy.
//!
//! ```no_run
//! # async fn demo() {
//! use mcdl_core::{Downloader, DownloaderConfig, DownloadRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! let downloader = Downloader::new(DownloaderConfig::default());
//! let request = DownloadRequest::new("https://example.com/client.jar", "client.jar");
//! let result = downloader.download(&request, &CancellationToken::new()).await;
//! assert!(result.is_successful());
//! # }
//! ```

mod attempt;
mod handle;

pub use handle::DownloadHandle;

use std::sync::Arc;

use handle::FileStreams;
use std::time::SystemTime;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::DownloaderConfig;
use crate::error::DownloadError;
use crate::gate::ConcurrencyGate;
use crate::http::CurlOptions;
use crate::progress::{run_aggregator, FileProgress, FileSnapshot};
use crate::request::{DownloadRequest, GroupDownloadRequest};
use crate::result::{DownloadResult, DownloadResultKind, FileEvent, GroupDownloadResult};
use crate::retry::{run_with_retry, RetryPolicy};

/// Snapshots buffered per handle before new ones are dropped.
const PROGRESS_CHANNEL_CAPACITY: usize = 16;
/// Per-member snapshots buffered for a batch handle.
const FILE_PROGRESS_CHANNEL_CAPACITY: usize = 64;

struct Inner {
    config: DownloaderConfig,
    curl: CurlOptions,
    policy: RetryPolicy,
    gate: ConcurrencyGate,
}

/// Entry point for downloads. Cheap to clone; clones share one concurrency gate.
#[derive(Clone)]
pub struct Downloader {
    inner: Arc<Inner>,
}

impl Downloader {
    pub fn new(config: DownloaderConfig) -> Self {
        let gate = ConcurrencyGate::new(config.max_threads);
        Self::with_gate(config, gate)
    }

    /// Use an existing gate, so several downloaders share one global bound.
    pub fn with_gate(config: DownloaderConfig, gate: ConcurrencyGate) -> Self {
        Self {
            inner: Arc::new(Inner {
                curl: CurlOptions::from_config(&config),
                policy: config.retry_policy(),
                config,
                gate,
            }),
        }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.inner.config
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.inner.gate
    }

    /// Download one file to `request.destination`.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        cancel: &CancellationToken,
    ) -> DownloadResult {
        let progress = Arc::new(FileProgress::new(request.expected_size));
        self.download_tracked(request, &progress, cancel).await
    }

    /// Download every file of `group`. Failures of one file never stop the others.
    pub async fn download_many(
        &self,
        group: &GroupDownloadRequest,
        cancel: &CancellationToken,
    ) -> GroupDownloadResult {
        let progress = group_progress(group);
        self.download_many_tracked(group, &progress, None, cancel).await
    }

    /// Spawn [`Downloader::download`] with a progress stream. Must be called inside a tokio runtime.
    pub fn start(&self, request: DownloadRequest) -> DownloadHandle<DownloadResult> {
        let progress = Arc::new(FileProgress::new(request.expected_size));
        let files: Arc<[Arc<FileProgress>]> = Arc::from(vec![Arc::clone(&progress)]);
        let this = self.clone();
        self.spawn_tracked(files, None, move |cancel| async move {
            this.download_tracked(&request, &progress, &cancel).await
        })
    }

    /// Spawn [`Downloader::download_many`] with a batch progress stream, plus
    /// per-member snapshots and one completion event per file.
    pub fn start_many(&self, group: GroupDownloadRequest) -> DownloadHandle<GroupDownloadResult> {
        let progress = group_progress(&group);
        let files: Arc<[Arc<FileProgress>]> = Arc::from(progress.clone());
        let (file_tx, file_rx) = mpsc::channel(FILE_PROGRESS_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let this = self.clone();
        self.spawn_tracked(files, Some(file_tx), move |cancel| async move {
            this.download_many_tracked(&group, &progress, Some(&event_tx), &cancel)
                .await
        })
        .with_file_streams(FileStreams {
            progress: file_rx,
            events: event_rx,
        })
    }

    fn spawn_tracked<T, F, Fut>(
        &self,
        files: Arc<[Arc<FileProgress>]>,
        file_tx: Option<mpsc::Sender<FileSnapshot>>,
        op: F,
    ) -> DownloadHandle<T>
    where
        T: Send + 'static,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: std::future::Future<Output = T> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let done = CancellationToken::new();
        let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        tokio::spawn(run_aggregator(
            files,
            self.inner.config.progress_interval(),
            tx,
            file_tx,
            done.clone(),
            cancel.clone(),
        ));
        let op = op(cancel.clone());
        let task = tokio::spawn(async move {
            let _done = done.drop_guard();
            op.await
        });
        DownloadHandle::new(rx, task, cancel)
    }

    async fn download_tracked(
        &self,
        request: &DownloadRequest,
        progress: &Arc<FileProgress>,
        cancel: &CancellationToken,
    ) -> DownloadResult {
        let outcome = match self.inner.gate.acquire(cancel).await {
            Ok(_permit) => {
                run_with_retry(&self.inner.policy, cancel, move |attempt| {
                    self.attempt(request, progress, cancel, attempt)
                })
                .await
            }
            Err(e) => Err(e),
        };
        progress.finish();

        let result = DownloadResult::from(outcome);
        match &result {
            DownloadResult::Successful => {
                tracing::info!(url = %request.url, path = %request.destination.display(), "download finished")
            }
            DownloadResult::Failed(e) => {
                tracing::warn!(url = %request.url, error = %e, "download failed")
            }
            DownloadResult::Cancelled => tracing::info!(url = %request.url, "download cancelled"),
        }
        result
    }

    async fn download_many_tracked(
        &self,
        group: &GroupDownloadRequest,
        progress: &[Arc<FileProgress>],
        events: Option<&mpsc::UnboundedSender<FileEvent>>,
        cancel: &CancellationToken,
    ) -> GroupDownloadResult {
        if group.is_empty() {
            return GroupDownloadResult::from_outcomes(Vec::new(), false);
        }
        tracing::info!(
            files = group.len(),
            expected_bytes = group.expected_total_bytes(),
            "starting batch"
        );

        let mut set = JoinSet::new();
        for (index, (request, progress)) in group.files.iter().zip(progress).enumerate() {
            let this = self.clone();
            let request = request.clone();
            let progress = Arc::clone(progress);
            let cancel = cancel.clone();
            let events = events.cloned();
            set.spawn(async move {
                let result = this.download_tracked(&request, &progress, &cancel).await;
                if let Some(events) = events {
                    let _ = events.send(FileEvent {
                        index,
                        kind: result.kind(),
                    });
                }
                (index, result)
            });
        }

        let mut results: Vec<Option<DownloadResult>> = group.files.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!(error = %e, "download task failed"),
            }
        }

        let outcomes = group
            .files
            .iter()
            .cloned()
            .zip(results)
            .enumerate()
            .map(|(index, (request, result))| {
                let result = result.unwrap_or_else(|| {
                    if let Some(events) = events {
                        let _ = events.send(FileEvent {
                            index,
                            kind: DownloadResultKind::Failed,
                        });
                    }
                    DownloadResult::Failed(DownloadError::Worker("download task panicked".into()))
                });
                (request, result)
            })
            .collect();
        let result = GroupDownloadResult::from_outcomes(outcomes, cancel.is_cancelled());
        let elapsed = SystemTime::now()
            .duration_since(group.start_time)
            .unwrap_or_default();
        tracing::info!(
            kind = ?result.kind,
            succeeded = result.succeeded,
            failed = result.failed.len(),
            cancelled = result.cancelled.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "batch finished"
        );
        result
    }
}

fn group_progress(group: &GroupDownloadRequest) -> Vec<Arc<FileProgress>> {
    group
        .files
        .iter()
        .map(|f| Arc::new(FileProgress::new(f.expected_size)))
        .collect()
}
