//! Range-support probing.
//!
//! A HEAD request (redirects resolved by hand so the final URL is known)
//! gives the resolved URL and size; a `Range: bytes=0-0` GET against that URL
//! decides whether the file can be fetched in segments.

mod parse;

use std::cell::Cell;
use std::str;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::DownloadError;
use crate::http::{parse_status_line, perform_error, CurlOptions, StopSignal};

/// Redirect hops followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// What the server told us about a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// URL after following redirects; every transfer of this attempt uses it.
    pub resolved_url: String,
    /// `Content-Length` of the final HEAD response.
    pub content_length: Option<u64>,
    /// Complete length from the `Content-Range` of the ranged GET.
    pub range_total: Option<u64>,
    /// The ranged GET was answered with 206.
    pub supports_range: bool,
}

impl ProbeResult {
    /// Length reported by the server itself, never a caller's hint. The ranged
    /// GET describes the bytes segments will fetch, so it wins over HEAD.
    pub fn reported_size(&self) -> Option<u64> {
        self.range_total.or(self.content_length)
    }
}

/// Probe `url`. Blocking; use [`probe_async`] from async code.
pub fn probe(
    url: &str,
    opts: &CurlOptions,
    cancel: &CancellationToken,
) -> Result<ProbeResult, DownloadError> {
    let stop = StopSignal::new(cancel.clone());
    let (resolved_url, head) = resolve_head(url, opts, &stop)?;
    let ranged = range_probe(&resolved_url, opts, &stop)?;
    tracing::debug!(
        url,
        resolved = %resolved_url,
        size = ?head.content_length,
        range_total = ?ranged.total,
        accept_ranges = head.accept_ranges,
        supports_range = ranged.supported,
        "probe finished"
    );
    Ok(ProbeResult {
        resolved_url,
        content_length: head.content_length,
        range_total: ranged.total,
        supports_range: ranged.supported,
    })
}

/// Run [`probe`] on the blocking pool.
pub async fn probe_async(
    url: String,
    opts: CurlOptions,
    cancel: CancellationToken,
) -> Result<ProbeResult, DownloadError> {
    tokio::task::spawn_blocking(move || probe(&url, &opts, &cancel)).await?
}

fn resolve_head(
    url: &str,
    opts: &CurlOptions,
    stop: &StopSignal,
) -> Result<(String, parse::HeadInfo), DownloadError> {
    let mut current = Url::parse(url).map_err(|source| DownloadError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    for _ in 0..=MAX_REDIRECTS {
        let info = head_once(current.as_str(), opts, stop)?;
        let status = info.status.unwrap_or(0);
        match status {
            200..=299 => return Ok((current.into(), info)),
            301 | 302 | 303 | 307 | 308 => {
                let location = info.location.as_deref().ok_or_else(|| DownloadError::BadRedirect {
                    url: current.to_string(),
                })?;
                let next = current
                    .join(location)
                    .map_err(|source| DownloadError::InvalidUrl {
                        url: location.to_string(),
                        source,
                    })?;
                tracing::debug!(from = %current, to = %next, status, "following redirect");
                current = next;
            }
            _ => {
                return Err(DownloadError::HttpStatus {
                    url: current.to_string(),
                    status,
                })
            }
        }
    }
    Err(DownloadError::TooManyRedirects {
        url: url.to_string(),
    })
}

fn head_once(
    url: &str,
    opts: &CurlOptions,
    stop: &StopSignal,
) -> Result<parse::HeadInfo, DownloadError> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = opts.easy(url)?;
    easy.nobody(true)?;
    easy.follow_location(false)?;
    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.progress_function(|_, _, _, _| !stop.should_stop())?;
        transfer.perform().map_err(|e| perform_error(e, stop))?;
    }

    let mut info = parse::parse_headers(&headers);
    info.status = Some(easy.response_code()?);
    Ok(info)
}

struct RangeAnswer {
    supported: bool,
    total: Option<u64>,
}

/// GET `bytes=0-0`; supported iff answered with 206. Any other body is refused on
/// its first chunk so a server ignoring `Range` does not stream the whole file.
fn range_probe(
    url: &str,
    opts: &CurlOptions,
    stop: &StopSignal,
) -> Result<RangeAnswer, DownloadError> {
    let status = Cell::new(0u32);
    let total = Cell::new(None::<u64>);

    let mut easy = opts.easy(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(MAX_REDIRECTS as u32)?;
    easy.range("0-0")?;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            let Ok(line) = str::from_utf8(data) else {
                return true;
            };
            if let Some(code) = parse_status_line(line) {
                // New response after a redirect.
                status.set(code);
                total.set(None);
            } else if let Some((name, value)) = line.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-range") {
                    total.set(parse::content_range_total(value));
                }
            }
            true
        })?;
        transfer.write_function(|data| Ok(if status.get() == 206 { data.len() } else { 0 }))?;
        transfer.progress_function(|_, _, _, _| !stop.should_stop())?;
        transfer.perform()
    };
    match performed {
        Ok(()) => {}
        Err(e) if e.is_write_error() => {}
        Err(e) => return Err(perform_error(e, stop)),
    }

    let code = match easy.response_code()? {
        0 => status.get(),
        c => c,
    };
    let supported = code == 206;
    Ok(RangeAnswer {
        supported,
        total: if supported { total.get() } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(content_length: Option<u64>, range_total: Option<u64>) -> ProbeResult {
        ProbeResult {
            resolved_url: "http://example.invalid/f".into(),
            content_length,
            range_total,
            supports_range: range_total.is_some(),
        }
    }

    #[test]
    fn reported_size_prefers_content_range() {
        assert_eq!(result(Some(10), Some(300)).reported_size(), Some(300));
        assert_eq!(result(None, Some(300)).reported_size(), Some(300));
        assert_eq!(result(Some(10), None).reported_size(), Some(10));
        assert_eq!(result(None, None).reported_size(), None);
    }
}
