//! Consecutive-failure circuit breaker.
//!
//! The breaker counts back-to-back dispatch failures. Once the count reaches
//! the threshold the circuit is open and the governor rejects its queue. Only
//! a successful dispatch or an explicit [`CircuitBreaker::reset`] closes it
//! again; draining the queue does not.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Failures below threshold, requests flow normally
    Closed,
    /// Threshold reached, the next failure rejects queued work
    Open,
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures before the circuit opens
    pub failure_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
        }
    }
}

/// Circuit breaker for the upstream
pub struct CircuitBreaker {
    /// Upstream identifier
    upstream_id: String,
    /// Configuration
    config: CircuitBreakerConfig,
    /// Consecutive failures since the last success or reset
    consecutive_failures: AtomicU32,
    /// Number of times the threshold was hit
    trips: AtomicU64,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(upstream_id: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            upstream_id: upstream_id.into(),
            config: CircuitBreakerConfig {
                failure_threshold: config.failure_threshold.max(1),
            },
            consecutive_failures: AtomicU32::new(0),
            trips: AtomicU64::new(0),
        }
    }

    /// Get the current state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        if self.consecutive_failures() >= self.config.failure_threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        }
    }

    /// Consecutive failures since the last success or reset
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Record a successful dispatch
    pub fn record_success(&self) {
        let previous = self.consecutive_failures.swap(0, Ordering::AcqRel);
        if previous > 0 {
            debug!(
                upstream = %self.upstream_id,
                previous_failures = previous,
                "Circuit breaker failure streak cleared"
            );
        }
    }

    /// Record a failed dispatch.
    ///
    /// Returns `true` when the failure streak has reached the threshold and
    /// queued work must be rejected.
    pub fn record_failure(&self) -> bool {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;

        if failures >= self.config.failure_threshold {
            self.trips.fetch_add(1, Ordering::Relaxed);
            warn!(
                upstream = %self.upstream_id,
                failures = failures,
                threshold = self.config.failure_threshold,
                "Circuit breaker tripped"
            );
            true
        } else {
            debug!(
                upstream = %self.upstream_id,
                failures = failures,
                threshold = self.config.failure_threshold,
                "Circuit breaker recorded failure"
            );
            false
        }
    }

    /// Close the circuit regardless of the failure streak
    pub fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        info!(upstream = %self.upstream_id, "Circuit breaker reset");
    }

    /// Get current statistics
    #[must_use]
    pub fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state(),
            consecutive_failures: self.consecutive_failures(),
            failure_threshold: self.config.failure_threshold,
            trips: self.trips.load(Ordering::Relaxed),
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    /// Current state
    pub state: CircuitState,
    /// Consecutive failures
    pub consecutive_failures: u32,
    /// Configured threshold
    pub failure_threshold: u32,
    /// Times the threshold was reached
    pub trips: u64,
}
