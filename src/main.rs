//! # APOD Gateway
//!
//! Rate-limited, cached gateway in front of the NASA Astronomy Picture of
//! the Day API.
//!
//! ## Features
//!
//! - One upstream request at a time, spaced by a minimum interval
//! - Bounded TTL response cache with runtime reconfiguration
//! - Placeholder records while the upstream is rate limiting
//! - Prometheus metrics and structured logging
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults (API key from the environment)
//! NASA_API_KEY=... apod-gateway
//!
//! # Start with a config file
//! GATEWAY_CONFIG=/path/to/config.yaml apod-gateway
//!
//! # Start with environment overrides
//! PORT=9000 CACHE_TTL=600000 apod-gateway
//! ```

use gateway_config::{load_config, GatewayConfig};
use gateway_lookup::LookupService;
use gateway_providers::{NasaClient, NasaConfig};
use gateway_resilience::{
    CacheConfig, GovernorConfig, RequestGovernor, ResponseCache, RetryConfig, TimeoutConfig,
};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LoggingConfig};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Application failed");
        eprintln!("apod-gateway: {e}");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config().await {
        Ok(config) => config,
        Err(e) => {
            // Logging is configured by the file we failed to load
            let _ = init_logging(&LoggingConfig::default());
            return Err(e.into());
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.server.bind_address(),
        "Starting APOD gateway"
    );

    let lookup = build_lookup_service(&config)?;
    let state = AppState::builder().lookup(lookup).build()?;

    let server_config = ServerConfig::new()
        .with_host(&config.server.host)
        .with_port(config.server.port)
        .with_cors_origins(config.server.cors_origins.clone())
        .with_rate_limit(config.server.rate_limit_max, config.server.rate_limit_window);

    Server::new(server_config, state).run().await?;

    Ok(())
}

/// Wire the upstream client, governor and cache together
fn build_lookup_service(config: &GatewayConfig) -> Result<LookupService, Box<dyn std::error::Error>> {
    let api_key = config.api_key()?;

    let nasa = NasaClient::new(
        NasaConfig::new(api_key.expose_secret().as_str())
            .with_base_url(&config.nasa.base_url)
            .with_user_agent(&config.nasa.user_agent)
            .with_connect_timeout(config.nasa.connect_timeout),
    )?;

    let governor = RequestGovernor::new(
        Arc::new(nasa),
        GovernorConfig {
            min_request_interval: config.governor.min_request_interval,
            max_consecutive_failures: config.governor.max_consecutive_failures,
            retry: RetryConfig {
                max_retries: config.governor.max_retries,
                base_delay: config.governor.retry_base_delay,
            },
            timeouts: TimeoutConfig {
                base: config.governor.request_timeout,
                ..TimeoutConfig::default()
            },
        },
    );

    let cache = ResponseCache::new(CacheConfig {
        ttl: config.cache.ttl(),
        max_entries: config.cache.max_size,
    });

    info!(
        ttl_ms = config.cache.ttl_ms,
        max_size = config.cache.max_size,
        min_interval_ms = config.governor.min_request_interval.as_millis() as u64,
        "Lookup service configured"
    );

    Ok(LookupService::new(cache, governor))
}
