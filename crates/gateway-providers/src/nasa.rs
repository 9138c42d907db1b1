//! NASA APOD API client.
//!
//! Makes exactly one outbound GET per call and classifies the outcome into
//! an [`ApodError`] variant. Retrying, spacing and circuit breaking live in
//! the request governor; this client never retries on its own.
//!
//! # API Format
//! - `GET https://api.nasa.gov/planetary/apod?api_key=KEY[&date=D | &start_date=S&end_date=E]`
//! - Single date: one JSON object. Range: a JSON array.
//! - Errors: `{"msg": "..."}` or `{"error": {"code": "...", "message": "..."}}`

use async_trait::async_trait;
use gateway_core::{ApodError, LookupParams, UpstreamClient, UpstreamPayload};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, trace};
use url::Url;

/// Production APOD endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.nasa.gov/planetary/apod";

/// User-Agent sent with every request
pub const DEFAULT_USER_AGENT: &str = "NASA-APOD-Explorer/1.0";

/// NASA client configuration
#[derive(Debug, Clone)]
pub struct NasaConfig {
    /// Client identifier used in logs
    pub id: String,
    /// Full APOD endpoint URL
    pub base_url: String,
    /// api.nasa.gov key
    pub api_key: SecretString,
    /// User-Agent header value
    pub user_agent: String,
    /// TCP connect timeout; the overall timeout is chosen per call
    pub connect_timeout: Duration,
}

impl NasaConfig {
    /// Configuration for the production endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            id: "nasa".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::new(api_key.into()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Point the client at another endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the User-Agent header
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// NASA APOD upstream client
pub struct NasaClient {
    config: NasaConfig,
    client: Client,
    endpoint: Url,
}

impl NasaClient {
    /// Create a new client
    pub fn new(config: NasaConfig) -> Result<Self, ApodError> {
        if config.api_key.expose_secret().is_empty() {
            return Err(ApodError::configuration("NASA API key is required"));
        }

        let endpoint = Url::parse(&config.base_url).map_err(|e| {
            ApodError::configuration(format!("Invalid NASA base URL '{}': {e}", config.base_url))
        })?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ApodError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Endpoint this client calls
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify_send_error(err: &reqwest::Error, timeout: Duration) -> ApodError {
        if err.is_timeout() {
            ApodError::timeout(timeout)
        } else {
            ApodError::network(err.to_string())
        }
    }

    fn classify_body_error(err: &reqwest::Error, timeout: Duration) -> ApodError {
        if err.is_timeout() {
            ApodError::timeout(timeout)
        } else {
            ApodError::upstream(None, format!("Failed to read response: {err}"))
        }
    }
}

#[async_trait]
impl UpstreamClient for NasaClient {
    fn id(&self) -> &str {
        &self.config.id
    }

    async fn call(
        &self,
        params: &LookupParams,
        timeout: Duration,
    ) -> Result<UpstreamPayload, ApodError> {
        debug!(
            upstream = %self.config.id,
            params = %params,
            timeout_ms = timeout.as_millis() as u64,
            "Sending APOD request"
        );

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params.query_pairs())
            .query(&[("api_key", self.config.api_key.expose_secret())])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                error!(upstream = %self.config.id, params = %params, error = %e, "NASA API request failed");
                Self::classify_send_error(&e, timeout)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_body_error(&e, timeout))?;

        trace!(status = %status, body_len = body.len(), "Received NASA response");

        if !status.is_success() {
            let err = classify_status(status.as_u16(), &body);
            error!(
                upstream = %self.config.id,
                params = %params,
                status = status.as_u16(),
                error_type = err.error_type(),
                "NASA API returned an error"
            );
            return Err(err);
        }

        serde_json::from_str::<UpstreamPayload>(&body).map_err(|e| {
            ApodError::upstream(Some(status.as_u16()), format!("Invalid response JSON: {e}"))
        })
    }
}

/// Classify a non-success upstream response
#[must_use]
pub fn classify_status(status: u16, body: &str) -> ApodError {
    let message = extract_message(body);

    match status {
        400 => ApodError::invalid_request(message.unwrap_or_else(|| "Bad request".to_string())),
        403 => ApodError::AccessDenied,
        429 => ApodError::RateLimited,
        _ => ApodError::upstream(
            Some(status),
            message.unwrap_or_else(|| "Failed to fetch from NASA API".to_string()),
        ),
    }
}

fn extract_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        msg: Option<String>,
        error: Option<ErrorDetail>,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .msg
        .or_else(|| parsed.error.and_then(|detail| detail.message))
        .filter(|message| !message.is_empty())
}
