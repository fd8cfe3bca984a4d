//! Checksum command: compute SHA-1 of a file.

use anyhow::Result;
use mcdl_core::checksum;
use std::path::Path;

/// Compute and print SHA-1 of the given file.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let owned = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || checksum::sha1_path(&owned)).await??;
    println!("{}  {}", digest, path.display());
    Ok(())
}
