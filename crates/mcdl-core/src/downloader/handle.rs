use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::DownloadError;
use crate::progress::{FileSnapshot, ProgressSnapshot};
use crate::result::{FileEvent, GroupDownloadResult};

/// Per-member streams of a batch handle.
pub(super) struct FileStreams {
    pub progress: mpsc::Receiver<FileSnapshot>,
    pub events: mpsc::UnboundedReceiver<FileEvent>,
}

/// A running download or batch.
///
/// Snapshots arrive through [`next_progress`](Self::next_progress) until the
/// operation finishes; the terminal result comes from [`finish`](Self::finish).
pub struct DownloadHandle<T> {
    progress: mpsc::Receiver<ProgressSnapshot>,
    files: Option<FileStreams>,
    task: JoinHandle<T>,
    cancel: CancellationToken,
}

impl<T> DownloadHandle<T> {
    pub(super) fn new(
        progress: mpsc::Receiver<ProgressSnapshot>,
        task: JoinHandle<T>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            progress,
            files: None,
            task,
            cancel,
        }
    }

    /// Next snapshot, or `None` once the operation has finished and the stream is drained.
    pub async fn next_progress(&mut self) -> Option<ProgressSnapshot> {
        self.progress.recv().await
    }

    /// Ask the operation to stop. Pending files resolve to `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the terminal result. Errs only if the operation's task panicked.
    pub async fn finish(self) -> Result<T, DownloadError> {
        Ok(self.task.await?)
    }
}

impl DownloadHandle<GroupDownloadResult> {
    pub(super) fn with_file_streams(mut self, files: FileStreams) -> Self {
        self.files = Some(files);
        self
    }

    /// Next snapshot of a single member still in flight. Like batch snapshots,
    /// these are dropped rather than queued when the consumer falls behind.
    pub async fn next_file_progress(&mut self) -> Option<FileSnapshot> {
        match &mut self.files {
            Some(files) => files.progress.recv().await,
            None => None,
        }
    }

    /// Next member that reached its terminal outcome, in completion order.
    /// Each file is reported exactly once; `None` after the last one.
    pub async fn next_file_event(&mut self) -> Option<FileEvent> {
        match &mut self.files {
            Some(files) => files.events.recv().await,
            None => None,
        }
    }
}
