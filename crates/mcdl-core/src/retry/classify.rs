//! Classify HTTP status and curl errors into error kinds for retry decisions and logs.

use crate::error::DownloadError;

/// High-level classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read/low-speed).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, ...).
    Connection,
    /// Server-side HTTP failure.
    Http5xx(u16),
    /// Body did not match what was expected (length, range, SHA-1).
    Integrity,
    /// Local disk failure.
    Storage,
    /// Caller asked to stop.
    Cancelled,
    /// Anything else (4xx, bad redirects, worker failures).
    Other,
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_aborted_by_callback() {
        return ErrorKind::Cancelled;
    }
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return ErrorKind::Connection;
    }
    if e.is_write_error() {
        return ErrorKind::Storage;
    }
    ErrorKind::Other
}

/// Classify a download error.
pub fn classify(e: &DownloadError) -> ErrorKind {
    match e {
        DownloadError::Curl(ce) => classify_curl_error(ce),
        DownloadError::HttpStatus { status, .. } => classify_http_status(*status),
        DownloadError::InvalidRangeResponse { .. }
        | DownloadError::LengthMismatch { .. }
        | DownloadError::Sha1Mismatch { .. } => ErrorKind::Integrity,
        DownloadError::Io { .. } => ErrorKind::Storage,
        DownloadError::Cancelled => ErrorKind::Cancelled,
        DownloadError::TooManyRedirects { .. }
        | DownloadError::BadRedirect { .. }
        | DownloadError::InvalidUrl { .. }
        | DownloadError::Worker(_) => ErrorKind::Other,
    }
}
