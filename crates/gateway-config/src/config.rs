//! Configuration types.

use gateway_core::{ApodError, ApodResult};
use gateway_telemetry::LoggingConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server
    #[validate(nested)]
    pub server: ServerConfig,
    /// NASA upstream
    #[validate(nested)]
    pub nasa: NasaConfig,
    /// Response cache
    #[validate(nested)]
    pub cache: CacheConfig,
    /// Request governor
    #[validate(nested)]
    pub governor: GovernorConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// The configured API key.
    ///
    /// Fails when no key is set. `DEMO_KEY` and keys shorter than 20
    /// characters are accepted with a warning since api.nasa.gov limits
    /// them much more strictly.
    pub fn api_key(&self) -> ApodResult<&SecretString> {
        let key = self
            .nasa
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or_else(|| ApodError::configuration("NASA API key not configured"))?;

        let raw = key.expose_secret();
        if raw == "DEMO_KEY" || raw.len() < 20 {
            warn!("Using demo or invalid API key - rate limits will be strict");
        } else {
            info!("Valid NASA API key configured");
        }

        Ok(key)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    #[validate(length(min = 1))]
    pub host: String,
    /// Bind port
    #[validate(range(min = 1))]
    pub port: u16,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Inbound requests admitted per window
    #[validate(range(min = 1))]
    pub rate_limit_max: u32,
    /// Inbound rate limit window
    #[serde(with = "humantime_serde")]
    pub rate_limit_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "https://nasa-apod-explorer-sepia.vercel.app".to_string(),
                "https://nasa-apod-explorer-backend.vercel.app".to_string(),
            ],
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
        }
    }
}

impl ServerConfig {
    /// `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// NASA upstream configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct NasaConfig {
    /// api.nasa.gov key
    pub api_key: Option<SecretString>,
    /// APOD endpoint
    #[validate(url)]
    pub base_url: String,
    /// User-Agent header
    #[validate(length(min = 1))]
    pub user_agent: String,
    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for NasaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.nasa.gov/planetary/apod".to_string(),
            user_agent: "NASA-APOD-Explorer/1.0".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds
    pub ttl_ms: u64,
    /// Maximum number of entries
    #[validate(range(min = 1))]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 3_600_000,
            max_size: 100,
        }
    }
}

impl CacheConfig {
    /// Entry lifetime
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Request governor configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct GovernorConfig {
    /// Minimum spacing between upstream dispatches
    #[serde(with = "humantime_serde")]
    pub min_request_interval: Duration,
    /// Failure streak that rejects the queue
    #[validate(range(min = 1, max = 100))]
    pub max_consecutive_failures: u32,
    /// Retries per request
    #[validate(range(max = 10))]
    pub max_retries: u32,
    /// Backoff unit; retry n waits `retry_base_delay * (n + 1)`
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    /// Timeout for single dates and short ranges
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_secs(6),
            max_consecutive_failures: 2,
            max_retries: 2,
            retry_base_delay: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
        }
    }
}
