use std::time::Duration;

use super::classify::ErrorKind;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop and surface the error (or the cancellation).
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Bounded retry with linear backoff: the wait after attempt `i` (0-based)
/// is `base_delay × (i + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first). Zero behaves like one.
    pub max_attempts: u32,
    /// Backoff unit.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Same policy with a different attempt limit (installers use 4 for some call sites).
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..self
        }
    }

    /// Backoff before the attempt following `attempt_index`.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay.saturating_mul(attempt_index.saturating_add(1))
    }

    /// Decide what to do after attempt `attempt_index` (0-based) failed with `kind`.
    pub fn decide(&self, attempt_index: u32, kind: ErrorKind) -> RetryDecision {
        if kind == ErrorKind::Cancelled {
            return RetryDecision::NoRetry;
        }
        if attempt_index.saturating_add(1) >= self.max_attempts.max(1) {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.delay_for(attempt_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_eight_attempts_one_second_unit() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 8);
        assert_eq!(p.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn linear_backoff() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(0, ErrorKind::Timeout), RetryDecision::RetryAfter(Duration::from_secs(1)));
        assert_eq!(p.decide(1, ErrorKind::Connection), RetryDecision::RetryAfter(Duration::from_secs(2)));
        assert_eq!(p.decide(6, ErrorKind::Http5xx(500)), RetryDecision::RetryAfter(Duration::from_secs(7)));
    }

    #[test]
    fn last_attempt_gives_up() {
        let p = RetryPolicy::default().with_max_attempts(4);
        assert!(matches!(p.decide(2, ErrorKind::Other), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(3, ErrorKind::Other), RetryDecision::NoRetry);
    }

    #[test]
    fn every_kind_but_cancelled_is_retried() {
        let p = RetryPolicy::default();
        for kind in [
            ErrorKind::Timeout,
            ErrorKind::Throttled,
            ErrorKind::Connection,
            ErrorKind::Http5xx(502),
            ErrorKind::Integrity,
            ErrorKind::Storage,
            ErrorKind::Other,
        ] {
            assert!(matches!(p.decide(0, kind), RetryDecision::RetryAfter(_)), "{kind:?}");
        }
        assert_eq!(p.decide(0, ErrorKind::Cancelled), RetryDecision::NoRetry);
    }

    #[test]
    fn zero_attempts_behaves_like_one() {
        let p = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(p.decide(0, ErrorKind::Timeout), RetryDecision::NoRetry);
    }
}
