//! # Gateway Config
//!
//! Configuration for the APOD gateway.
//!
//! Sources, later wins:
//! 1. Built-in defaults
//! 2. Optional file named by `GATEWAY_CONFIG` (`.yaml`, `.yml`, `.toml`, `.json`)
//! 3. Environment overrides (`PORT`, `NASA_API_KEY`, `CACHE_TTL`, ...)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod loader;

// Re-export main types
pub use config::{CacheConfig, GatewayConfig, GovernorConfig, NasaConfig, ServerConfig};
pub use loader::{load_config, ConfigLoader, CONFIG_PATH_ENV};
