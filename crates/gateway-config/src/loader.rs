//! Configuration loader.

use crate::config::GatewayConfig;
use gateway_core::{ApodError, ApodResult};
use gateway_telemetry::LogFormat;
use secrecy::SecretString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use validator::Validate;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

/// Load configuration from `GATEWAY_CONFIG` (if set) and the process
/// environment
pub async fn load_config() -> ApodResult<GatewayConfig> {
    ConfigLoader::from_env().load().await
}

#[derive(Debug, Clone, Default)]
enum EnvSource {
    #[default]
    Process,
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var(key).ok(),
            Self::Fixed(vars) => vars.get(key).cloned(),
        }
        .filter(|value| !value.is_empty())
    }
}

/// Configuration loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: EnvSource,
}

impl ConfigLoader {
    /// Loader without a file, reading the process environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader using the file named by `GATEWAY_CONFIG`, if any
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            path: std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from),
            env: EnvSource::Process,
        }
    }

    /// Read this file before applying environment overrides
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Take overrides from `vars` instead of the process environment
    #[must_use]
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = EnvSource::Fixed(vars);
        self
    }

    /// Load, override and validate
    pub async fn load(&self) -> ApodResult<GatewayConfig> {
        let mut config = match &self.path {
            Some(path) => Self::load_file(path).await?,
            None => GatewayConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;

        config.validate().map_err(|errors| {
            ApodError::configuration(format!("Configuration validation failed: {errors}"))
        })?;

        debug!(
            port = config.server.port,
            cache_ttl_ms = config.cache.ttl_ms,
            cache_max_size = config.cache.max_size,
            "Configuration loaded"
        );

        Ok(config)
    }

    async fn load_file(path: &Path) -> ApodResult<GatewayConfig> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            ApodError::configuration(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let config: GatewayConfig = match extension.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            Some("toml") => toml::from_str(&contents).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            _ => {
                return Err(ApodError::configuration(format!(
                    "Unsupported config file format: {}",
                    path.display()
                )))
            }
        }
        .map_err(|e| {
            ApodError::configuration(format!("Failed to parse config file {}: {e}", path.display()))
        })?;

        info!(path = %path.display(), "Configuration file loaded");
        Ok(config)
    }

    fn apply_env_overrides(&self, config: &mut GatewayConfig) -> ApodResult<()> {
        if let Some(host) = self.env.get("GATEWAY_HOST") {
            config.server.host = host;
        }
        // GATEWAY_PORT wins over the conventional PORT
        for key in ["PORT", "GATEWAY_PORT"] {
            if let Some(port) = self.parsed(key)? {
                config.server.port = port;
            }
        }

        if let Some(key) = self.env.get("NASA_API_KEY") {
            config.nasa.api_key = Some(SecretString::new(key));
        }
        if let Some(url) = self.env.get("NASA_API_BASE_URL") {
            config.nasa.base_url = url;
        }

        if let Some(ttl_ms) = self.parsed("CACHE_TTL")? {
            config.cache.ttl_ms = ttl_ms;
        }
        if let Some(max_size) = self.parsed("CACHE_MAX_SIZE")? {
            config.cache.max_size = max_size;
        }

        if let Some(level) = self.env.get("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = self.parsed::<LogFormat>("LOG_FORMAT")? {
            config.logging.format = format;
        }

        Ok(())
    }

    fn parsed<T>(&self, key: &str) -> ApodResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.env
            .get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| {
                    ApodError::configuration(format!("Invalid value for {key} '{raw}': {e}"))
                })
            })
            .transpose()
    }
}
