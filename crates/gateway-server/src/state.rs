//! Shared application state.

use gateway_core::{ApodError, ApodResult};
use gateway_lookup::LookupService;
use gateway_resilience::CircuitState;
use gateway_telemetry::{CacheSnapshot, GovernorSnapshot, Metrics};
use std::sync::Arc;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Lookup service
    pub lookup: Arc<LookupService>,
    /// Prometheus metrics
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a builder
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// Copy cache and governor stats into the metric gauges
    pub fn refresh_gauges(&self) {
        let cache = self.lookup.cache_stats();
        self.metrics.set_cache(CacheSnapshot {
            size: cache.size,
            max_entries: cache.max_entries,
            hits: cache.hits,
            misses: cache.misses,
        });

        let governor = self.lookup.governor_stats();
        self.metrics.set_governor(GovernorSnapshot {
            queue_depth: governor.queue_depth,
            consecutive_failures: governor.consecutive_failures,
            circuit_open: governor.circuit_state == CircuitState::Open,
            circuit_trips: governor.circuit_trips,
            total_dispatches: governor.total_dispatches,
        });
    }
}

/// Builder for [`AppState`]
#[derive(Default)]
pub struct AppStateBuilder {
    lookup: Option<Arc<LookupService>>,
    metrics: Option<Arc<Metrics>>,
}

impl AppStateBuilder {
    /// Set the lookup service
    #[must_use]
    pub fn lookup(mut self, lookup: LookupService) -> Self {
        self.lookup = Some(Arc::new(lookup));
        self
    }

    /// Set the metrics registry; a fresh one is created otherwise
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(Arc::new(metrics));
        self
    }

    /// Build the state
    pub fn build(self) -> ApodResult<AppState> {
        let lookup = self
            .lookup
            .ok_or_else(|| ApodError::internal("AppState requires a lookup service"))?;

        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Arc::new(
                Metrics::new()
                    .map_err(|e| ApodError::internal(format!("Failed to create metrics: {e}")))?,
            ),
        };

        Ok(AppState { lookup, metrics })
    }
}
