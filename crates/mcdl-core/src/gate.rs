//! Global concurrency gate shared by every download of one `Downloader`.
//!
//! One slot is held per file for its whole lifecycle (all attempts and
//! backoffs); segments of that file run under the file's slot. The permit
//! releases its slot on drop, so errors, panics and cancellation never leak one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::error::DownloadError;

#[derive(Debug)]
struct GateInner {
    max: usize,
    semaphore: Arc<Semaphore>,
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

/// Bounded counting semaphore with usage counters.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    inner: Arc<GateInner>,
}

impl ConcurrencyGate {
    /// Create a gate with `max` slots (at least 1).
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            inner: Arc::new(GateInner {
                max,
                semaphore: Arc::new(Semaphore::new(max)),
                in_use: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Wait for a free slot. Returns `Cancelled` if the token fires first.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<GatePermit, DownloadError> {
        let semaphore = Arc::clone(&self.inner.semaphore);
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            p = semaphore.acquire_owned() => p.map_err(|_| DownloadError::Worker("concurrency gate closed".into()))?,
        };
        let now = self.inner.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.inner.peak.fetch_max(now, Ordering::AcqRel);
        Ok(GatePermit {
            gate: Arc::clone(&self.inner),
            _permit: permit,
        })
    }

    pub fn max(&self) -> usize {
        self.inner.max
    }

    /// Slots currently held.
    pub fn in_use(&self) -> usize {
        self.inner.in_use.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.inner.max.saturating_sub(self.in_use())
    }

    /// Highest `in_use` value observed since the gate was created.
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::Acquire)
    }
}

/// Held slot; released when dropped.
#[derive(Debug)]
pub struct GatePermit {
    gate: Arc<GateInner>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        // Runs before the semaphore permit field is dropped, so `in_use` never
        // overshoots `max` when a waiter is woken.
        self.gate.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn acquire_and_release() {
        let gate = ConcurrencyGate::new(2);
        let cancel = CancellationToken::new();
        let a = gate.acquire(&cancel).await.unwrap();
        let b = gate.acquire(&cancel).await.unwrap();
        assert_eq!(gate.in_use(), 2);
        assert_eq!(gate.available(), 0);
        drop(a);
        assert_eq!(gate.in_use(), 1);
        drop(b);
        assert_eq!(gate.available(), 2);
        assert_eq!(gate.peak(), 2);
    }

    #[tokio::test]
    async fn zero_max_clamped_to_one() {
        let gate = ConcurrencyGate::new(0);
        assert_eq!(gate.max(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_use_never_exceeds_max() {
        let gate = ConcurrencyGate::new(4);
        let cancel = CancellationToken::new();
        let mut set = tokio::task::JoinSet::new();
        for _ in 0..64 {
            let gate = gate.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                let _permit = gate.acquire(&cancel).await.unwrap();
                assert!(gate.in_use() <= gate.max());
                tokio::time::sleep(Duration::from_millis(2)).await;
            });
        }
        while let Some(res) = set.join_next().await {
            res.unwrap();
        }
        assert!(gate.peak() <= 4);
        assert_eq!(gate.in_use(), 0);
    }

    #[tokio::test]
    async fn waiting_acquire_is_cancellable() {
        let gate = ConcurrencyGate::new(1);
        let cancel = CancellationToken::new();
        let _held = gate.acquire(&cancel).await.unwrap();
        let waiter_cancel = CancellationToken::new();
        let g = gate.clone();
        let c = waiter_cancel.clone();
        let waiter = tokio::spawn(async move { g.acquire(&c).await.map(|_| ()) });
        tokio::time::sleep(Duration::from_millis(20)).await;
        waiter_cancel.cancel();
        let res = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("cancelled waiter must resolve")
            .unwrap();
        assert!(matches!(res, Err(DownloadError::Cancelled)));
        assert_eq!(gate.in_use(), 1);
    }
}
