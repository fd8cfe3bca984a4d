//! `mcdl get` – download a single URL.

use anyhow::{bail, Context, Result};
use mcdl_core::mirror::UrlRewriter;
use mcdl_core::{DownloadRequest, DownloadResult, Downloader};
use std::path::PathBuf;

use super::progress;

#[derive(Debug)]
pub struct GetArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub size: Option<u64>,
    pub sha1: Option<String>,
}

/// Last path segment of `url` (query and fragment stripped), or `download.bin`.
pub(crate) fn default_output(url: &str) -> PathBuf {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    match path.split_once('/') {
        Some((_, p)) => match p.rsplit('/').next() {
            Some(name) if !name.is_empty() => PathBuf::from(name),
            _ => PathBuf::from("download.bin"),
        },
        None => PathBuf::from("download.bin"),
    }
}

pub async fn run_get(downloader: &Downloader, rewriter: &UrlRewriter, args: GetArgs) -> Result<()> {
    let destination = args.output.unwrap_or_else(|| default_output(&args.url));
    let mut request = DownloadRequest::new(args.url, destination);
    request.expected_size = args.size;
    request.sha1 = args.sha1;
    let request = rewriter.apply(request);
    tracing::info!(url = %request.url, path = %request.destination.display(), "get");

    let destination = request.destination.clone();
    let handle = downloader.start(request);
    match progress::drive(handle).await? {
        DownloadResult::Successful => {
            println!("saved {}", destination.display());
            Ok(())
        }
        DownloadResult::Failed(e) => {
            Err(e).with_context(|| format!("download of {} failed", destination.display()))
        }
        DownloadResult::Cancelled => bail!("download cancelled"),
    }
}
