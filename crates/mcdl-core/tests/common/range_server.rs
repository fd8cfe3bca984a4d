//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body at every path except a few reserved ones:
//! `/missing*` answers 404, `/redirect/N` redirects N times before landing on
//! `/file`, and `/loop` redirects to itself forever.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, omit `Accept-Ranges: bytes` header even if ranges work.
    pub advertise_ranges: bool,
    /// Answer every request with this status and no body.
    pub forced_status: Option<u16>,
    /// The first N body GETs (not the `0-0` probe) send half their body and hang up.
    pub fail_first_gets: usize,
    /// Pause between 4 KiB body chunks.
    pub chunk_delay: Option<Duration>,
    /// HEAD responses carry no `Content-Length`.
    pub omit_head_length: bool,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            advertise_ranges: true,
            forced_status: None,
            fail_first_gets: 0,
            chunk_delay: None,
            omit_head_length: false,
        }
    }
}

/// Request counters.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub heads: AtomicUsize,
    pub gets: AtomicUsize,
    /// GETs carrying a Range header other than `bytes=0-0`.
    pub segment_gets: AtomicUsize,
    /// Body GETs seen so far, used to decide which ones to break.
    body_gets: AtomicUsize,
}

pub struct RangeServer {
    base: String,
    pub stats: Arc<ServerStats>,
}

impl RangeServer {
    /// Base URL, e.g. `http://127.0.0.1:12345/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of `path` (no leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn heads(&self) -> usize {
        self.stats.heads.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.stats.gets.load(Ordering::SeqCst)
    }

    pub fn segment_gets(&self) -> usize {
        self.stats.segment_gets.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body`. The server runs until the process exits.
pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior.
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let stats = Arc::new(ServerStats::default());
    let server_stats = Arc::clone(&stats);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let stats = Arc::clone(&server_stats);
            thread::spawn(move || handle(stream, &body, opts, &stats));
        }
    });
    RangeServer {
        base: format!("http://127.0.0.1:{}/", port),
        stats,
    }
}

struct Request<'a> {
    method: &'a str,
    path: &'a str,
    range: Option<(u64, u64)>,
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions, stats: &ServerStats) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(raw) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let req = parse_request(raw);
    let is_head = req.method.eq_ignore_ascii_case("HEAD");
    if is_head {
        stats.heads.fetch_add(1, Ordering::SeqCst);
    } else if req.method.eq_ignore_ascii_case("GET") {
        stats.gets.fetch_add(1, Ordering::SeqCst);
    } else {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }

    if let Some(status) = opts.forced_status {
        write_empty(&mut stream, &format!("{status} Forced"), "");
        return;
    }
    if req.path.starts_with("/missing") {
        write_empty(&mut stream, "404 Not Found", "");
        return;
    }
    if req.path == "/loop" {
        write_empty(&mut stream, "302 Found", "Location: /loop\r\n");
        return;
    }
    if let Some(n) = req.path.strip_prefix("/redirect/") {
        let n: u32 = n.parse().unwrap_or(0);
        let location = if n <= 1 {
            "/file".to_string()
        } else {
            format!("/redirect/{}", n - 1)
        };
        write_empty(&mut stream, "302 Found", &format!("Location: {location}\r\n"));
        return;
    }

    let total = body.len() as u64;
    let accept_ranges = if opts.advertise_ranges && opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };
    if is_head {
        let length = if opts.omit_head_length {
            String::new()
        } else {
            format!("Content-Length: {total}\r\n")
        };
        let response =
            format!("HTTP/1.1 200 OK\r\n{length}{accept_ranges}Connection: close\r\n\r\n");
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    let range = req.range.filter(|_| opts.support_ranges);
    let is_probe = range == Some((0, 0));
    if let Some((start, end_incl)) = range {
        if !is_probe {
            stats.segment_gets.fetch_add(1, Ordering::SeqCst);
        }
        let end_incl = end_incl.min(total.saturating_sub(1));
        if start >= total || start > end_incl {
            let extra = format!("Content-Range: bytes */{total}\r\n");
            write_empty(&mut stream, "416 Range Not Satisfiable", &extra);
            return;
        }
        let slice = &body[start as usize..=end_incl as usize];
        let head = format!(
            "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\n{}Connection: close\r\n\r\n",
            slice.len(),
            start,
            end_incl,
            total,
            accept_ranges
        );
        let _ = stream.write_all(head.as_bytes());
        write_body(&mut stream, slice, is_probe, opts, stats);
        return;
    }

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {total}\r\n{accept_ranges}Connection: close\r\n\r\n"
    );
    let _ = stream.write_all(head.as_bytes());
    write_body(&mut stream, body, is_probe, opts, stats);
}

fn write_empty(stream: &mut TcpStream, status: &str, extra_headers: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Length: 0\r\n{extra_headers}Connection: close\r\n\r\n"
    );
    let _ = stream.write_all(response.as_bytes());
}

fn write_body(
    stream: &mut TcpStream,
    slice: &[u8],
    is_probe: bool,
    opts: RangeServerOptions,
    stats: &ServerStats,
) {
    let mut slice = slice;
    if !is_probe && stats.body_gets.fetch_add(1, Ordering::SeqCst) < opts.fail_first_gets {
        slice = &slice[..slice.len() / 2];
        let _ = stream.write_all(slice);
        let _ = stream.flush();
        let _ = stream.shutdown(std::net::Shutdown::Both);
        return;
    }
    for chunk in slice.chunks(4096) {
        if stream.write_all(chunk).is_err() {
            return;
        }
        if let Some(delay) = opts.chunk_delay {
            thread::sleep(delay);
        }
    }
    let _ = stream.flush();
}

/// Parses the request line and an optional `Range: bytes=X-Y` header.
fn parse_request(request: &str) -> Request<'_> {
    let mut method = "";
    let mut path = "/";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            let mut parts = line.split_whitespace();
            method = parts.next().unwrap_or("");
            path = parts.next().unwrap_or("/");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    Request {
        method,
        path,
        range,
    }
}
