//! SHA-1 of finished files.
//!
//! Computed after a transfer completes, never inline with the write path.

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// SHA-1 of everything `reader` yields, as lowercase hex.
pub fn sha1_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute SHA-1 of a file and return the digest as lowercase hex.
pub fn sha1_path(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    sha1_reader(f).with_context(|| format!("read {}", path.display()))
}

/// Case-insensitive comparison of a computed digest against an expected hex string.
pub fn sha1_matches(actual: &str, expected: &str) -> bool {
    actual.eq_ignore_ascii_case(expected.trim())
}
