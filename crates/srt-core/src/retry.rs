//! The uniform retry policy installed by tests.
//!
//! One policy is built per run and shared (by `Arc`) across every request in
//! that run; the unset-vs-set distinction on a request's metadata is what the
//! transport layer keys off.

use std::sync::Arc;
use std::time::Duration;

use crate::InvokeError;

/// Exponential backoff with optional jitter.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Initial backoff duration.
    pub base: Duration,
    /// Maximum backoff duration.
    pub cap: Duration,
    /// Multiplier for each attempt.
    pub multiplier: f64,
    /// Whether to randomize each delay.
    pub jitter: bool,
}

impl ExponentialBackoff {
    /// New backoff with the given base and cap, multiplier 2, jitter on.
    #[must_use]
    pub const fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            multiplier: 2.0,
            jitter: true,
        }
    }

    /// Enable or disable jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before the given retry attempt (0-based: the delay after the
    /// first failure is `delay(0)`).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let raw = self.base.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = raw.min(self.cap.as_secs_f64());
        let secs = if self.jitter {
            // 0.5x..1.5x, thundering-herd avoidance
            capped * (0.5 + rand::random::<f64>())
        } else {
            capped
        };
        Duration::from_secs_f64(secs.min(self.cap.as_secs_f64()))
    }
}

/// Retry policy shared by all requests within a run.
///
/// Deeply immutable once constructed; compare instances with
/// [`Arc::ptr_eq`] to observe sharing.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Wall-clock budget per attempt.
    pub attempt_timeout: Duration,
    /// Backoff schedule between attempts.
    pub backoff: ExponentialBackoff,
}

impl RetryPolicy {
    /// Whether a failed attempt should be retried.
    ///
    /// Transient transport failures and per-attempt timeouts always qualify;
    /// service errors qualify for the fixed set of retryable statuses.
    /// Cancellation never retries.
    #[must_use]
    pub fn is_retryable(&self, err: &InvokeError) -> bool {
        match err {
            InvokeError::Transport { .. } | InvokeError::Timeout => true,
            InvokeError::Service { status, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
            }
            InvokeError::Cancelled => false,
        }
    }
}

/// Builds the uniform policy used by replay tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicyFactory;

impl RetryPolicyFactory {
    /// The test policy: 3 attempts, 30s per attempt, exponential backoff
    /// with jitter from 1s capped at 30s.
    #[must_use]
    pub fn build_test_policy() -> Arc<RetryPolicy> {
        Arc::new(RetryPolicy {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(30),
            backoff: ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let b = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30))
            .with_jitter(false);
        assert_eq!(b.delay(0), Duration::from_secs(1));
        assert_eq!(b.delay(1), Duration::from_secs(2));
        assert_eq!(b.delay(2), Duration::from_secs(4));
        assert_eq!(b.delay(10), Duration::from_secs(30));
    }

    #[test]
    fn jitter_stays_under_cap() {
        let b = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(30));
        for attempt in 0..16 {
            assert!(b.delay(attempt) <= Duration::from_secs(30));
        }
    }

    #[test]
    fn retryable_classification() {
        let policy = RetryPolicyFactory::build_test_policy();
        assert!(policy.is_retryable(&InvokeError::transport("connection reset")));
        assert!(policy.is_retryable(&InvokeError::Timeout));
        assert!(policy.is_retryable(&InvokeError::service(503, "ServiceUnavailable", "")));
        assert!(policy.is_retryable(&InvokeError::service(429, "TooManyRequests", "")));
        assert!(!policy.is_retryable(&InvokeError::service(404, "NotFound", "")));
        assert!(!policy.is_retryable(&InvokeError::Cancelled));
    }

    #[test]
    fn test_policy_shape() {
        let policy = RetryPolicyFactory::build_test_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(30));
        assert_eq!(policy.backoff.base, Duration::from_secs(1));
        assert_eq!(policy.backoff.cap, Duration::from_secs(30));
    }
}
