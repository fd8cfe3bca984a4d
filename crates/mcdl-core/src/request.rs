//! Download request descriptors.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// One file to fetch.
///
/// Immutable once submitted; the resolved URL and size of an attempt live in
/// that attempt's transfer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    /// Size the caller expects; used when the server does not send `Content-Length`.
    #[serde(default)]
    pub expected_size: Option<u64>,
    /// Lowercase hex SHA-1 the finished file must match.
    #[serde(default)]
    pub sha1: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            expected_size: None,
            sha1: None,
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }
}

/// A batch of files sharing one concurrency gate and one progress aggregator.
#[derive(Debug, Clone)]
pub struct GroupDownloadRequest {
    pub files: Vec<DownloadRequest>,
    pub start_time: SystemTime,
}

impl GroupDownloadRequest {
    pub fn new(files: Vec<DownloadRequest>) -> Self {
        Self {
            files,
            start_time: SystemTime::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sum of the sizes callers declared (unknown sizes count as zero).
    pub fn expected_total_bytes(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|f| f.expected_size)
            .fold(0, u64::saturating_add)
    }
}

impl FromIterator<DownloadRequest> for GroupDownloadRequest {
    fn from_iter<I: IntoIterator<Item = DownloadRequest>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let r = DownloadRequest::new("https://x/file.bin", "/tmp/file.bin")
            .with_size(500_000)
            .with_sha1("abc");
        assert_eq!(r.expected_size, Some(500_000));
        assert_eq!(r.sha1.as_deref(), Some("abc"));
    }

    #[test]
    fn group_expected_total_skips_unknown() {
        let g: GroupDownloadRequest = vec![
            DownloadRequest::new("a", "a").with_size(10),
            DownloadRequest::new("b", "b"),
            DownloadRequest::new("c", "c").with_size(5),
        ]
        .into_iter()
        .collect();
        assert_eq!(g.len(), 3);
        assert_eq!(g.expected_total_bytes(), 15);
    }

    #[test]
    fn request_json_defaults() {
        let r: DownloadRequest =
            serde_json::from_str(r#"{"url":"https://x/a","destination":"a.jar"}"#).unwrap();
        assert!(r.expected_size.is_none());
        assert!(r.sha1.is_none());
    }
}
