//! Adaptive per-dispatch timeouts.
//!
//! Range lookups make the upstream assemble one record per day, so the
//! timeout grows with the number of days requested.

use gateway_core::LookupParams;
use std::time::Duration;

/// Timeout configuration
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for single-date lookups and short ranges
    pub base: Duration,
    /// `(min_days_exclusive, timeout)` tiers, ascending by day count
    pub range_tiers: Vec<(i64, Duration)>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(15),
            range_tiers: vec![
                (15, Duration::from_secs(20)),
                (30, Duration::from_secs(25)),
                (60, Duration::from_secs(30)),
            ],
        }
    }
}

/// Computes the timeout for a dispatch
#[derive(Debug, Clone, Default)]
pub struct TimeoutManager {
    config: TimeoutConfig,
}

impl TimeoutManager {
    /// Create a timeout manager
    #[must_use]
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    /// Timeout for a dispatch of `params`
    #[must_use]
    pub fn timeout_for(&self, params: &LookupParams) -> Duration {
        if !params.is_range() {
            return self.config.base;
        }

        let days = params.span_days();
        self.config
            .range_tiers
            .iter()
            .rev()
            .find(|(min_days, _)| days > *min_days)
            .map_or(self.config.base, |(_, timeout)| *timeout)
    }
}
