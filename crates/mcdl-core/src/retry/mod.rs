//! Retry and backoff policy.
//!
//! Wraps one file's whole download procedure (probe, plan, transfer, verify)
//! in a bounded loop with linear backoff. Errors are classified for logging;
//! everything except cancellation is retried until the attempt limit.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status, ErrorKind};
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
