//! Tests for the get subcommand and global flags.

use super::{parse, parse_cli};
use crate::cli::commands::default_output;
use crate::cli::{Cli, CliCommand};
use clap::Parser;
use mcdl_core::DownloaderConfig;
use std::path::{Path, PathBuf};

#[test]
fn cli_parse_get() {
    match parse(&["mcdl", "get", "https://example.com/client.jar"]) {
        CliCommand::Get {
            url,
            output,
            size,
            sha1,
        } => {
            assert_eq!(url, "https://example.com/client.jar");
            assert!(output.is_none());
            assert!(size.is_none());
            assert!(sha1.is_none());
        }
        _ => panic!("expected Get"),
    }
}

#[test]
fn cli_parse_get_with_options() {
    match parse(&[
        "mcdl",
        "get",
        "https://example.com/x",
        "-o",
        "/tmp/x.bin",
        "--size",
        "500000",
        "--sha1",
        "abc",
    ]) {
        CliCommand::Get {
            output, size, sha1, ..
        } => {
            assert_eq!(output.as_deref(), Some(Path::new("/tmp/x.bin")));
            assert_eq!(size, Some(500000));
            assert_eq!(sha1.as_deref(), Some("abc"));
        }
        _ => panic!("expected Get with options"),
    }
}

#[test]
fn cli_parse_get_missing_url() {
    assert!(Cli::try_parse_from(["mcdl", "get"]).is_err());
}

#[test]
fn global_flags_override_config() {
    let cli = parse_cli(&[
        "mcdl",
        "get",
        "https://example.com/x",
        "--max-threads",
        "8",
        "--retries",
        "2",
        "--no-fragment",
        "--mirror",
    ]);
    let mut cfg = DownloaderConfig::default();
    cli.overrides.apply(&mut cfg);
    assert_eq!(cfg.max_threads, 8);
    assert_eq!(cfg.max_retry_count, 2);
    assert!(!cfg.enable_fragment);
    assert!(cfg.enable_mirror);
}

#[test]
fn no_flags_keep_config() {
    let cli = parse_cli(&["mcdl", "checksum", "f"]);
    let mut cfg = DownloaderConfig::default();
    cli.overrides.apply(&mut cfg);
    assert_eq!(cfg, DownloaderConfig::default());
}

#[test]
fn default_output_from_url() {
    assert_eq!(
        default_output("https://example.com/a/b/client.jar?x=1"),
        PathBuf::from("client.jar")
    );
    assert_eq!(default_output("https://example.com/"), PathBuf::from("download.bin"));
    assert_eq!(default_output("https://example.com"), PathBuf::from("download.bin"));
}
