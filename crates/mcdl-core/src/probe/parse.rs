//! Parse collected HTTP response header lines.

use crate::http::parse_status_line;

/// Headers of the last response in a block of collected lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct HeadInfo {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    pub location: Option<String>,
}

/// Parse header lines. Only the block after the last status line counts, so
/// interim responses (`100 Continue`) do not leak into the result.
pub(crate) fn parse_headers(lines: &[String]) -> HeadInfo {
    let start = lines
        .iter()
        .rposition(|l| parse_status_line(l).is_some())
        .unwrap_or(0);
    let mut info = HeadInfo::default();

    for line in &lines[start..] {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(code) = parse_status_line(line) {
            info.status = Some(code);
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            info.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("accept-ranges") {
            info.accept_ranges = value.eq_ignore_ascii_case("bytes");
        } else if name.eq_ignore_ascii_case("location") && !value.is_empty() {
            info.location = Some(value.to_string());
        }
    }
    info
}

/// Complete length from a `Content-Range` value such as `bytes 0-0/300000`.
/// `None` when the length is unknown (`*`) or the value is malformed.
pub(crate) fn content_range_total(value: &str) -> Option<u64> {
    let rest = value.trim().strip_prefix("bytes")?;
    let (_, total) = rest.rsplit_once('/')?;
    total.trim().parse().ok()
}
