//! Periodic sampling of file counters into snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::counter::FileProgress;
use super::snapshot::{FileSnapshot, ProgressSnapshot, SpeedMeter};

/// Re-sum every member's counters into one snapshot with zero speed.
fn collect(files: &[Arc<FileProgress>]) -> ProgressSnapshot {
    let mut downloaded = 0u64;
    let mut total = 0u64;
    let mut completed = 0usize;
    for f in files {
        downloaded = downloaded.saturating_add(f.downloaded());
        total = total.saturating_add(f.total().unwrap_or(0));
        if f.is_finished() {
            completed += 1;
        }
    }
    ProgressSnapshot {
        speed_bytes_per_sec: 0.0,
        downloaded_bytes: downloaded,
        total_bytes: total,
        estimated_remaining: Duration::ZERO,
        completed_count: completed,
        total_count: files.len(),
    }
}

/// Every byte of every file is in, and every size is known.
fn bytes_complete(files: &[Arc<FileProgress>], snapshot: &ProgressSnapshot) -> bool {
    snapshot.total_bytes > 0
        && snapshot.downloaded_bytes >= snapshot.total_bytes
        && files.iter().all(|f| f.total().is_some())
}

/// Emit a snapshot every `period` until every file is terminal, `done` fires
/// (the operation returned) or `cancel` fires; then emit one final snapshot with
/// zero speed and ETA. Once all bytes are in, ticks go quiet after one snapshot
/// and resume only if a retry resets the counters. With `file_tx`, every tick
/// also reports each member still in flight. Sends never block: a full
/// channel drops the snapshot.
pub(crate) async fn run_aggregator(
    files: Arc<[Arc<FileProgress>]>,
    period: Duration,
    tx: mpsc::Sender<ProgressSnapshot>,
    file_tx: Option<mpsc::Sender<FileSnapshot>>,
    done: CancellationToken,
    cancel: CancellationToken,
) {
    let start = Instant::now();
    let mut ticker = interval_at(start + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut meter = SpeedMeter::new(start.into_std());
    let mut reported_complete = false;
    let mut file_meters: Vec<SpeedMeter> = files
        .iter()
        .map(|_| SpeedMeter::new(start.into_std()))
        .collect();

    loop {
        tokio::select! {
            _ = done.cancelled() => break,
            _ = cancel.cancelled() => break,
            at = ticker.tick() => {
                let at = at.into_std();
                if let Some(file_tx) = &file_tx {
                    for (index, (f, m)) in files.iter().zip(&mut file_meters).enumerate() {
                        if f.is_finished() {
                            continue;
                        }
                        let snapshot = collect(std::slice::from_ref(f));
                        let speed = m.sample(snapshot.downloaded_bytes, at);
                        let snapshot = snapshot.with_speed(speed);
                        let _ = file_tx.try_send(FileSnapshot { index, snapshot });
                    }
                }
                let snapshot = collect(&files);
                let speed = meter.sample(snapshot.downloaded_bytes, at);
                let snapshot = snapshot.with_speed(speed);
                let all_done = snapshot.completed_count == snapshot.total_count;
                let complete = bytes_complete(&files, &snapshot);
                if !(complete && reported_complete) {
                    let _ = tx.try_send(snapshot);
                }
                reported_complete = complete;
                if all_done {
                    break;
                }
            }
        }
    }

    let _ = tx.try_send(collect(&files));
}
