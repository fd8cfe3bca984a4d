//! Retry loop: run an async attempt until success, cancellation or the policy says stop.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::classify::{classify, ErrorKind};
use super::policy::{RetryDecision, RetryPolicy};
use crate::error::DownloadError;

/// Runs `attempt` (given the 0-based attempt index) until it succeeds or the policy gives up.
///
/// The token is checked before every attempt and raced against every backoff sleep.
/// Cancellation always comes back as `DownloadError::Cancelled`, never as the
/// error the aborted attempt happened to produce.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut attempt: F,
) -> Result<T, DownloadError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, DownloadError>>,
{
    let mut index = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        let err = match attempt(index).await {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let kind = classify(&err);
        if kind == ErrorKind::Cancelled || cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        match policy.decide(index, kind) {
            RetryDecision::NoRetry => {
                tracing::warn!(attempts = index + 1, ?kind, error = %err, "giving up");
                return Err(err);
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::debug!(
                    attempt = index + 1,
                    ?kind,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off"
                );
                tokio::select! {
                    _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                index += 1;
            }
        }
    }
}
