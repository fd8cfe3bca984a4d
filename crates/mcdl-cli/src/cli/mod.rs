//! CLI for the mcdl resource downloader.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mcdl_core::config::{self, DownloaderConfig};
use mcdl_core::mirror::UrlRewriter;
use mcdl_core::resources::DEFAULT_VERIFY_PARALLELISM;
use mcdl_core::Downloader;
use std::path::PathBuf;

use commands::{run_checksum, run_get, run_sync, GetArgs};

/// Top-level CLI for the mcdl downloader.
#[derive(Debug, Parser)]
#[command(name = "mcdl")]
#[command(about = "mcdl: concurrent segmented downloader for game resources", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Flags that override values from config.toml.
#[derive(Debug, Default, Args)]
pub struct ConfigOverrides {
    /// Read this config file instead of ~/.config/mcdl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Maximum files in flight (also caps segment workers per file).
    #[arg(long, global = true, value_name = "N")]
    pub max_threads: Option<usize>,

    /// Attempts per file, including the first.
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// Always download as a single stream.
    #[arg(long, global = true)]
    pub no_fragment: bool,

    /// Rewrite official URLs to the BMCLAPI mirror.
    #[arg(long, global = true)]
    pub mirror: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, cfg: &mut DownloaderConfig) {
        if let Some(n) = self.max_threads {
            cfg.max_threads = n;
        }
        if let Some(n) = self.retries {
            cfg.max_retry_count = n;
        }
        if self.no_fragment {
            cfg.enable_fragment = false;
        }
        if self.mirror {
            cfg.enable_mirror = true;
        }
    }

    fn load(&self) -> Result<DownloaderConfig> {
        let mut cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        self.apply(&mut cfg);
        Ok(cfg)
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one URL.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Destination path (default: last URL path segment in the current directory).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Expected size in bytes, used when the server sends no Content-Length.
        #[arg(long, value_name = "BYTES")]
        size: Option<u64>,

        /// Expected SHA-1 (hex); the file is re-downloaded on mismatch.
        #[arg(long, value_name = "HEX")]
        sha1: Option<String>,
    },

    /// Verify the files of a JSON dependency manifest and download the invalid ones.
    Sync {
        /// Path to a JSON array of {url, path, sha1?, size?}.
        manifest: PathBuf,

        /// Directory that relative manifest paths are resolved against (default: current dir).
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Files hashed at once during verification.
        #[arg(long, default_value_t = DEFAULT_VERIFY_PARALLELISM, value_name = "N")]
        verify_parallelism: usize,
    },

    /// Compute SHA-1 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Checksum { path } = &cli.command {
            return run_checksum(path).await;
        }

        let cfg = cli.overrides.load()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let rewriter = UrlRewriter::from_config(&cfg);
        let downloader = Downloader::new(cfg);

        match cli.command {
            CliCommand::Get {
                url,
                output,
                size,
                sha1,
            } => {
                let args = GetArgs {
                    url,
                    output,
                    size,
                    sha1,
                };
                run_get(&downloader, &rewriter, args).await?
            }
            CliCommand::Sync {
                manifest,
                root,
                verify_parallelism,
            } => {
                let root = match root {
                    Some(r) => r,
                    None => std::env::current_dir()?,
                };
                run_sync(&downloader, rewriter, &manifest, &root, verify_parallelism).await?
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
