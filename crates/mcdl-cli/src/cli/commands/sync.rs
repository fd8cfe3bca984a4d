//! `mcdl sync` – verify a dependency manifest and fetch what is missing or corrupt.

use anyhow::{bail, Result};
use mcdl_core::mirror::UrlRewriter;
use mcdl_core::resources::{self, ResourceSync};
use mcdl_core::{DownloadResultKind, Downloader};
use std::path::Path;
use tokio_util::sync::CancellationToken;

use super::progress;

pub async fn run_sync(
    downloader: &Downloader,
    rewriter: UrlRewriter,
    manifest: &Path,
    root: &Path,
    verify_parallelism: usize,
) -> Result<()> {
    let deps: Vec<_> = resources::load_manifest(manifest)?
        .into_iter()
        .map(|d| d.resolve(root))
        .collect();
    println!("verifying {} file(s)...", deps.len());

    let sync = ResourceSync::new(downloader.clone())
        .with_rewriter(rewriter)
        .with_verify_parallelism(verify_parallelism);
    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(progress::cancel_on(tokio::signal::ctrl_c(), cancel.clone()));
    let planned = sync.start_verify_and_download(&deps, &cancel).await;
    // From here on `drive` owns Ctrl-C.
    interrupt.abort();
    let handle = planned?;
    let result = progress::drive(handle).await?;

    for failed in &result.failed {
        eprintln!("  failed: {} ({})", failed.request.url, failed.error);
    }
    match result.kind {
        DownloadResultKind::Successful => {
            println!("{} file(s) downloaded, all dependencies valid", result.succeeded);
            Ok(())
        }
        DownloadResultKind::Failed => bail!("{} file(s) failed", result.failed.len()),
        DownloadResultKind::Cancelled => bail!(
            "sync cancelled ({} file(s) not downloaded)",
            result.cancelled.len()
        ),
    }
}
