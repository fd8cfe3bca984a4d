//! Prints snapshots of a running handle and cancels it on Ctrl-C.

use std::future::Future;
use std::io;

use anyhow::Result;
use mcdl_core::{format_size, DownloadHandle, ProgressSnapshot};
use tokio_util::sync::CancellationToken;

fn print_snapshot(s: &ProgressSnapshot) {
    let pct = s.fraction() * 100.0;
    let total = if s.total_bytes > 0 {
        format_size(s.total_bytes, false)
    } else {
        "?".to_string()
    };
    println!(
        "\r  {} / {} ({:.1}%)  {}  ETA {}s  [{}/{} files]  ",
        format_size(s.downloaded_bytes, false),
        total,
        pct,
        format_size(s.speed_bytes_per_sec as u64, true),
        s.estimated_remaining.as_secs(),
        s.completed_count,
        s.total_count
    );
}

/// Cancel `cancel` once `signal` (normally `tokio::signal::ctrl_c()`) fires.
pub(crate) async fn cancel_on<F>(signal: F, cancel: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    if signal.await.is_ok() {
        eprintln!("\ninterrupted, cancelling...");
        cancel.cancel();
    }
}

/// Drain the handle's progress stream, then return its result.
pub async fn drive<T>(mut handle: DownloadHandle<T>) -> Result<T> {
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            snapshot = handle.next_progress() => match snapshot {
                Some(s) => print_snapshot(&s),
                None => break,
            },
            res = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if res.is_ok() {
                    eprintln!("\ninterrupted, cancelling...");
                    handle.cancel();
                }
            }
        }
    }
    println!();
    Ok(handle.finish().await?)
}
