//! Dependency verification and verify-then-download for game resources.
//!
//! A dependency is a file the game needs at a known path, optionally pinned by
//! SHA-1 or size. Files that fail verification become one download batch.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::checksum::{sha1_matches, sha1_reader};
use crate::downloader::{DownloadHandle, Downloader};
use crate::error::DownloadError;
use crate::mirror::UrlRewriter;
use crate::request::{DownloadRequest, GroupDownloadRequest};
use crate::result::GroupDownloadResult;

/// Files verified at once by default.
pub const DEFAULT_VERIFY_PARALLELISM: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub url: String,
    pub path: PathBuf,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Dependency {
    /// Relative paths are resolved against `root`.
    pub fn resolve(mut self, root: &Path) -> Self {
        if self.path.is_relative() {
            self.path = root.join(&self.path);
        }
        self
    }

    pub fn to_request(&self, rewriter: &UrlRewriter) -> DownloadRequest {
        DownloadRequest {
            url: rewriter.rewrite(&self.url).into_owned(),
            destination: self.path.clone(),
            expected_size: self.size,
            sha1: self.sha1.clone(),
        }
    }
}

/// Is the file on disk usable? Missing ⇒ no. With a SHA-1 the digest decides;
/// otherwise with a size the length decides; otherwise presence is enough.
pub fn verify_dependency(dep: &Dependency) -> bool {
    let meta = match fs::metadata(&dep.path) {
        Ok(m) if m.is_file() => m,
        _ => return false,
    };
    if let Some(expected) = &dep.sha1 {
        return match File::open(&dep.path).and_then(sha1_reader) {
            Ok(actual) => sha1_matches(&actual, expected),
            Err(e) => {
                tracing::debug!(path = %dep.path.display(), error = %e, "hashing failed");
                false
            }
        };
    }
    if let Some(size) = dep.size {
        return meta.len() == size;
    }
    true
}

/// Dependencies that fail [`verify_dependency`], in input order. Hashing runs on
/// the blocking pool with at most `parallelism` files at once.
pub async fn find_invalid(
    deps: &[Dependency],
    parallelism: usize,
    cancel: &CancellationToken,
) -> Result<Vec<Dependency>> {
    ensure!(parallelism > 0, "verify parallelism must be greater than zero");
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut set = JoinSet::new();
    for (index, dep) in deps.iter().cloned().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();
        set.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                p = semaphore.acquire_owned() => p.map_err(|_| DownloadError::Worker("verify semaphore closed".into()))?,
            };
            if cancel.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            let valid = tokio::task::spawn_blocking(move || verify_dependency(&dep)).await?;
            Ok((index, valid))
        });
    }

    let mut valid = vec![true; deps.len()];
    while let Some(joined) = set.join_next().await {
        let (index, ok) = joined.map_err(DownloadError::from)??;
        valid[index] = ok;
    }
    let invalid: Vec<Dependency> = deps
        .iter()
        .zip(valid)
        .filter(|(_, ok)| !ok)
        .map(|(d, _)| d.clone())
        .collect();
    tracing::info!(checked = deps.len(), invalid = invalid.len(), "verified dependencies");
    Ok(invalid)
}

/// Read a JSON array of dependencies.
pub fn load_manifest(path: &Path) -> Result<Vec<Dependency>> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let deps: Vec<Dependency> =
        serde_json::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(deps)
}

/// Verify dependencies and download whatever is missing or corrupt.
pub struct ResourceSync {
    downloader: Downloader,
    rewriter: UrlRewriter,
    verify_parallelism: usize,
}

impl ResourceSync {
    /// Mirror rewriting follows the downloader's `enable_mirror`.
    pub fn new(downloader: Downloader) -> Self {
        let rewriter = UrlRewriter::from_config(downloader.config());
        Self {
            downloader,
            rewriter,
            verify_parallelism: DEFAULT_VERIFY_PARALLELISM,
        }
    }

    pub fn with_verify_parallelism(mut self, parallelism: usize) -> Self {
        self.verify_parallelism = parallelism;
        self
    }

    pub fn with_rewriter(mut self, rewriter: UrlRewriter) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// The batch that would bring `deps` up to date.
    pub async fn plan(
        &self,
        deps: &[Dependency],
        cancel: &CancellationToken,
    ) -> Result<GroupDownloadRequest> {
        let invalid = find_invalid(deps, self.verify_parallelism, cancel).await?;
        Ok(invalid
            .iter()
            .map(|d| d.to_request(&self.rewriter))
            .collect())
    }

    pub async fn verify_and_download(
        &self,
        deps: &[Dependency],
        cancel: &CancellationToken,
    ) -> Result<GroupDownloadResult> {
        let group = self.plan(deps, cancel).await?;
        Ok(self.downloader.download_many(&group, cancel).await)
    }

    /// Like [`verify_and_download`](Self::verify_and_download), but returns a
    /// handle for progress once verification is done.
    pub async fn start_verify_and_download(
        &self,
        deps: &[Dependency],
        cancel: &CancellationToken,
    ) -> Result<DownloadHandle<GroupDownloadResult>> {
        let group = self.plan(deps, cancel).await?;
        Ok(self.downloader.start_many(group))
    }
}
