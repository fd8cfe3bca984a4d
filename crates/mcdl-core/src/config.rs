use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::segmenter::DEFAULT_SEGMENT_SIZE;

/// Downloader configuration loaded from `~/.config/mcdl/config.toml`.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Global cap on files in flight; also caps segment workers per file.
    pub max_threads: usize,
    /// Segment length in bytes for ranged downloads.
    pub segment_size: u64,
    /// Attempts per file, including the first.
    pub max_retry_count: u32,
    /// Linear backoff base: attempt `i` waits `base * (i + 1)`.
    pub retry_base_delay_ms: u64,
    /// Progress snapshot period.
    pub progress_interval_ms: u64,
    /// Split ranged downloads into segments. When false every file is a single stream.
    pub enable_fragment: bool,
    /// Rewrite official URLs through the mirror table before submission.
    pub enable_mirror: bool,
    pub connect_timeout_secs: u64,
    /// Abort a transfer slower than `low_speed_limit` bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// libcurl receive buffer size in bytes (None = libcurl default).
    pub buffer_size: Option<usize>,
    pub user_agent: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_threads: 64,
            segment_size: DEFAULT_SEGMENT_SIZE,
            max_retry_count: 8,
            retry_base_delay_ms: 1000,
            progress_interval_ms: 1000,
            enable_fragment: true,
            enable_mirror: false,
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            buffer_size: None,
            user_agent: concat!("mcdl/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl DownloaderConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retry_count,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    /// Snapshot period, never shorter than 1 ms.
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn low_speed_time(&self) -> Duration {
        Duration::from_secs(self.low_speed_time_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mcdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DownloaderConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DownloaderConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        fs::write(&path, toml).with_context(|| format!("write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<DownloaderConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DownloaderConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
