//! Tests for the sync and checksum subcommands.

use super::parse;
use crate::cli::commands::cancel_on;
use crate::cli::CliCommand;
use std::io;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[test]
fn cli_parse_sync_defaults() {
    match parse(&["mcdl", "sync", "deps.json"]) {
        CliCommand::Sync {
            manifest,
            root,
            verify_parallelism,
        } => {
            assert_eq!(manifest, Path::new("deps.json"));
            assert!(root.is_none());
            assert_eq!(verify_parallelism, 10);
        }
        _ => panic!("expected Sync"),
    }
}

#[test]
fn cli_parse_sync_options() {
    match parse(&[
        "mcdl",
        "sync",
        "deps.json",
        "--root",
        "/games/.minecraft",
        "--verify-parallelism",
        "4",
    ]) {
        CliCommand::Sync {
            root,
            verify_parallelism,
            ..
        } => {
            assert_eq!(root.as_deref(), Some(Path::new("/games/.minecraft")));
            assert_eq!(verify_parallelism, 4);
        }
        _ => panic!("expected Sync with options"),
    }
}

#[test]
fn cli_parse_checksum() {
    match parse(&["mcdl", "checksum", "client.jar"]) {
        CliCommand::Checksum { path } => assert_eq!(path, Path::new("client.jar")),
        _ => panic!("expected Checksum"),
    }
}

#[tokio::test]
async fn interrupt_cancels_verification_token() {
    let cancel = CancellationToken::new();
    cancel_on(async { Ok(()) }, cancel.clone()).await;
    assert!(cancel.is_cancelled());
}

#[tokio::test]
async fn failed_signal_listener_leaves_token_alone() {
    let cancel = CancellationToken::new();
    cancel_on(
        async { Err(io::Error::new(io::ErrorKind::Other, "no signal handler")) },
        cancel.clone(),
    )
    .await;
    assert!(!cancel.is_cancelled());
}
