//! Terminal outcomes of single and batch downloads.

use crate::error::DownloadError;
use crate::request::DownloadRequest;

/// Outcome tag without the error payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadResultKind {
    Successful,
    Failed,
    Cancelled,
}

/// Terminal outcome of one file. Produced exactly once per request.
#[derive(Debug)]
pub enum DownloadResult {
    Successful,
    /// Retries exhausted; carries the last attempt's error.
    Failed(DownloadError),
    Cancelled,
}

impl DownloadResult {
    pub fn kind(&self) -> DownloadResultKind {
        match self {
            DownloadResult::Successful => DownloadResultKind::Successful,
            DownloadResult::Failed(_) => DownloadResultKind::Failed,
            DownloadResult::Cancelled => DownloadResultKind::Cancelled,
        }
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, DownloadResult::Successful)
    }

    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            DownloadResult::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Result<(), DownloadError>> for DownloadResult {
    fn from(res: Result<(), DownloadError>) -> Self {
        match res {
            Ok(()) => DownloadResult::Successful,
            Err(DownloadError::Cancelled) => DownloadResult::Cancelled,
            Err(e) => DownloadResult::Failed(e),
        }
    }
}

/// One member of a batch reached its terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEvent {
    /// Position of the file in [`crate::GroupDownloadRequest::files`].
    pub index: usize,
    pub kind: DownloadResultKind,
}

/// A request whose retries were exhausted.
#[derive(Debug)]
pub struct FailedDownload {
    pub request: DownloadRequest,
    pub error: DownloadError,
}

/// Terminal outcome of a batch.
#[derive(Debug)]
pub struct GroupDownloadResult {
    pub kind: DownloadResultKind,
    pub succeeded: usize,
    /// Every file that ended `Failed`, with its error.
    pub failed: Vec<FailedDownload>,
    /// Every file that ended `Cancelled`.
    pub cancelled: Vec<DownloadRequest>,
}

impl GroupDownloadResult {
    /// Fold per-file outcomes. The batch is `Cancelled` when the caller cancelled it,
    /// otherwise `Failed` if any file failed, otherwise `Successful`.
    pub(crate) fn from_outcomes(
        outcomes: Vec<(DownloadRequest, DownloadResult)>,
        batch_cancelled: bool,
    ) -> Self {
        let mut succeeded = 0;
        let mut failed = Vec::new();
        let mut cancelled = Vec::new();
        for (request, result) in outcomes {
            match result {
                DownloadResult::Successful => succeeded += 1,
                DownloadResult::Failed(error) => failed.push(FailedDownload { request, error }),
                DownloadResult::Cancelled => cancelled.push(request),
            }
        }
        let kind = if batch_cancelled {
            DownloadResultKind::Cancelled
        } else if !failed.is_empty() {
            DownloadResultKind::Failed
        } else if !cancelled.is_empty() {
            DownloadResultKind::Cancelled
        } else {
            DownloadResultKind::Successful
        };
        Self {
            kind,
            succeeded,
            failed,
            cancelled,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.kind == DownloadResultKind::Successful
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str) -> DownloadRequest {
        DownloadRequest::new(format!("http://x/{name}"), name)
    }

    #[test]
    fn result_from_outcome() {
        assert!(DownloadResult::from(Ok(())).is_successful());
        assert_eq!(
            DownloadResult::from(Err(DownloadError::Cancelled)).kind(),
            DownloadResultKind::Cancelled
        );
        let failed = DownloadResult::from(Err(DownloadError::Worker("boom".into())));
        assert_eq!(failed.kind(), DownloadResultKind::Failed);
        assert!(failed.error().is_some());
    }

    #[test]
    fn group_lists_every_failure() {
        let outcomes = vec![
            (req("a"), DownloadResult::Successful),
            (
                req("b"),
                DownloadResult::Failed(DownloadError::HttpStatus {
                    url: "http://x/b".into(),
                    status: 404,
                }),
            ),
            (req("c"), DownloadResult::Successful),
            (req("d"), DownloadResult::Failed(DownloadError::Worker("x".into()))),
        ];
        let g = GroupDownloadResult::from_outcomes(outcomes, false);
        assert_eq!(g.kind, DownloadResultKind::Failed);
        assert_eq!(g.succeeded, 2);
        let names: Vec<_> = g.failed.iter().map(|f| f.request.url.as_str()).collect();
        assert_eq!(names, ["http://x/b", "http://x/d"]);
    }

    #[test]
    fn group_cancelled_wins() {
        let outcomes = vec![
            (req("a"), DownloadResult::Successful),
            (req("b"), DownloadResult::Cancelled),
        ];
        let g = GroupDownloadResult::from_outcomes(outcomes, true);
        assert_eq!(g.kind, DownloadResultKind::Cancelled);
        assert_eq!(g.cancelled.len(), 1);
    }

    #[test]
    fn empty_group_successful() {
        let g = GroupDownloadResult::from_outcomes(Vec::new(), false);
        assert!(g.is_successful());
    }
}
