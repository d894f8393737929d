//! Exponential backoff for idempotent page fetches.

use std::time::Duration;

use crate::config::FetchSettings;

/// Retry policy for server-side error statuses.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay_ms: u64,
    /// Multiplier for each subsequent wait.
    pub backoff_factor: f64,
    /// Statuses worth retrying.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&FetchSettings::default())
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &FetchSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            base_delay_ms: settings.backoff_base_ms,
            backoff_factor: 2.0,
            retry_statuses: settings.retry_statuses.clone(),
        }
    }

    /// Delay after failed attempt `attempt_number` (1-indexed).
    pub fn delay_for(&self, attempt_number: u32) -> Duration {
        if attempt_number == 0 {
            return Duration::ZERO;
        }
        let delay_ms =
            self.base_delay_ms as f64 * self.backoff_factor.powi((attempt_number - 1) as i32);
        Duration::from_millis(delay_ms as u64)
    }

    /// Whether a response with `status` on attempt `attempt_number` should be retried.
    pub fn should_retry(&self, attempt_number: u32, status: u16) -> bool {
        attempt_number < self.max_attempts && self.retry_statuses.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_starts_at_base_and_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_only_server_errors_retry() {
        let policy = RetryPolicy::default();
        for status in [500, 502, 503, 504] {
            assert!(policy.should_retry(1, status));
        }
        for status in [400, 403, 404, 429, 501] {
            assert!(!policy.should_retry(1, status));
        }
    }

    #[test]
    fn test_exhaustion() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(2, 503));
        assert!(!policy.should_retry(3, 503));
    }
}
