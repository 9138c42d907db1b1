//! Retry policy with linear backoff.
//!
//! The governor consults the policy after every failed dispatch. The n-th
//! retry (0-indexed) waits `base_delay * (n + 1)`, so with the defaults a
//! request is retried after 10s and then 20s before its error is returned.

use gateway_core::ApodError;
use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries per request
    pub max_retries: u32,
    /// Backoff unit; retry `n` waits `base_delay * (n + 1)`
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(10),
        }
    }
}

/// Retry policy implementation
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Backoff before retry number `retry_count` (0-indexed)
    #[must_use]
    pub fn delay_for_attempt(&self, retry_count: u32) -> Duration {
        self.config.base_delay.saturating_mul(retry_count.saturating_add(1))
    }

    /// Check if an error is retryable
    #[must_use]
    pub fn is_retryable(&self, error: &ApodError) -> bool {
        error.is_retryable()
    }

    /// Backoff to apply before retrying, or `None` when the request must
    /// resolve with `error` now
    #[must_use]
    pub fn backoff_for(&self, error: &ApodError, retry_count: u32) -> Option<Duration> {
        if self.is_retryable(error) && retry_count < self.config.max_retries {
            Some(self.delay_for_attempt(retry_count))
        } else {
            None
        }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
