//! # Gateway Telemetry
//!
//! Observability for the APOD gateway:
//! - Structured logging via `tracing-subscriber` (text or JSON)
//! - Prometheus metrics for lookups, the response cache and the governor

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{CacheSnapshot, GovernorSnapshot, LookupKind, LookupOutcome, Metrics};

/// Telemetry setup error
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the subscriber
    #[error("Failed to initialize logging: {0}")]
    Init(String),
    /// Metric registration or encoding failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
