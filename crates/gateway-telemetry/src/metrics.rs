//! Prometheus metrics.
//!
//! Lookup counters and latencies are recorded as requests complete. Cache
//! and governor gauges are point-in-time values refreshed from stats
//! snapshots right before each scrape.

use crate::TelemetryError;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Lookup kind label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// Today or a single date
    Single,
    /// Date range
    Range,
}

impl LookupKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Range => "range",
        }
    }
}

/// Lookup outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Served from cache
    Hit,
    /// Fetched from upstream
    Miss,
    /// Placeholder content served
    Fallback,
    /// Error returned or annotated
    Error,
}

impl LookupOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Fallback => "fallback",
            Self::Error => "error",
        }
    }
}

/// Cache gauge values
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheSnapshot {
    /// Stored entries
    pub size: usize,
    /// Capacity
    pub max_entries: usize,
    /// Hits since last clear
    pub hits: u64,
    /// Misses since last clear
    pub misses: u64,
}

/// Governor gauge values
#[derive(Debug, Clone, Copy, Default)]
pub struct GovernorSnapshot {
    /// Queued requests
    pub queue_depth: usize,
    /// Current failure streak
    pub consecutive_failures: u32,
    /// Whether the failure streak has reached the threshold
    pub circuit_open: bool,
    /// Circuit trips since start
    pub circuit_trips: u64,
    /// Upstream calls since start
    pub total_dispatches: u64,
}

/// Gateway metrics
pub struct Metrics {
    registry: Registry,
    lookups_total: IntCounterVec,
    lookup_duration: HistogramVec,
    cache_entries: IntGauge,
    cache_capacity: IntGauge,
    cache_hits: IntGauge,
    cache_misses: IntGauge,
    queue_depth: IntGauge,
    consecutive_failures: IntGauge,
    circuit_open: IntGauge,
    circuit_trips: IntGauge,
    upstream_dispatches: IntGauge,
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, TelemetryError> {
    let gauge = IntGauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl Metrics {
    /// Create and register all metrics on a fresh registry
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new_custom(Some("apod".to_string()), None)?;

        let lookups_total = IntCounterVec::new(
            Opts::new("lookups_total", "APOD lookups by kind and outcome"),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(lookups_total.clone()))?;

        // Upstream waits include 6s spacing and 10s/20s retry backoffs
        let lookup_duration = HistogramVec::new(
            HistogramOpts::new("lookup_duration_seconds", "APOD lookup latency")
                .buckets(vec![0.005, 0.05, 0.25, 1.0, 2.5, 6.0, 15.0, 30.0, 60.0, 120.0]),
            &["kind"],
        )?;
        registry.register(Box::new(lookup_duration.clone()))?;

        Ok(Self {
            cache_entries: gauge(&registry, "cache_entries", "Entries in the response cache")?,
            cache_capacity: gauge(&registry, "cache_capacity", "Response cache capacity")?,
            cache_hits: gauge(&registry, "cache_hits", "Cache hits since last clear")?,
            cache_misses: gauge(&registry, "cache_misses", "Cache misses since last clear")?,
            queue_depth: gauge(&registry, "governor_queue_depth", "Requests waiting for dispatch")?,
            consecutive_failures: gauge(
                &registry,
                "governor_consecutive_failures",
                "Current upstream failure streak",
            )?,
            circuit_open: gauge(&registry, "governor_circuit_open", "1 while the circuit is open")?,
            circuit_trips: gauge(&registry, "governor_circuit_trips", "Times the queue was rejected")?,
            upstream_dispatches: gauge(
                &registry,
                "governor_dispatches",
                "Upstream calls made",
            )?,
            registry,
            lookups_total,
            lookup_duration,
        })
    }

    /// Record a completed lookup
    pub fn record_lookup(&self, kind: LookupKind, outcome: LookupOutcome, elapsed: Duration) {
        self.lookups_total
            .with_label_values(&[kind.as_str(), outcome.as_str()])
            .inc();
        self.lookup_duration
            .with_label_values(&[kind.as_str()])
            .observe(elapsed.as_secs_f64());
    }

    /// Refresh cache gauges
    pub fn set_cache(&self, snapshot: CacheSnapshot) {
        self.cache_entries.set(snapshot.size as i64);
        self.cache_capacity.set(snapshot.max_entries as i64);
        self.cache_hits.set(snapshot.hits as i64);
        self.cache_misses.set(snapshot.misses as i64);
    }

    /// Refresh governor gauges
    pub fn set_governor(&self, snapshot: GovernorSnapshot) {
        self.queue_depth.set(snapshot.queue_depth as i64);
        self.consecutive_failures
            .set(i64::from(snapshot.consecutive_failures));
        self.circuit_open.set(i64::from(snapshot.circuit_open));
        self.circuit_trips.set(snapshot.circuit_trips as i64);
        self.upstream_dispatches.set(snapshot.total_dispatches as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Init(e.to_string()))
    }
}
