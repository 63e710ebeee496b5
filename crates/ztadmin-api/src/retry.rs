// Retry policy for outbound controller calls.
//
// A fixed, small budget of extra attempts for idempotent-safe methods when
// the controller answers with a transient status or the connection fails.

use std::time::Duration;

use reqwest::{Method, StatusCode};

/// Statuses treated as transient: the same request may succeed later.
pub const TRANSIENT_STATUSES: [u16; 7] = [408, 413, 429, 500, 502, 503, 504];

/// When and how often a failed request is repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one. `2` means at most 3 requests.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each following one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Total number of requests this policy allows for `method`.
    pub fn max_attempts(&self, method: &Method) -> u32 {
        if Self::is_retryable_method(method) {
            self.max_retries.saturating_add(1)
        } else {
            1
        }
    }

    /// The controller treats GET, POST (merge-update) and DELETE as safe to repeat.
    pub fn is_retryable_method(method: &Method) -> bool {
        matches!(*method, Method::GET | Method::POST | Method::DELETE)
    }

    pub fn is_transient_status(status: StatusCode) -> bool {
        TRANSIENT_STATUSES.contains(&status.as_u16())
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}
