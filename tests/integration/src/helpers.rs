//! Test helper utilities for integration tests

use gateway_lookup::LookupService;
use gateway_providers::{NasaClient, NasaConfig};
use gateway_resilience::{
    CacheConfig, GovernorConfig, RequestGovernor, ResponseCache, RetryConfig, TimeoutConfig,
};
use gateway_server::{AppState, Server, ServerConfig};
use once_cell::sync::Lazy;
use reqwest::{Client, Response};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::mock_nasa::{MockNasa, TEST_API_KEY};

/// Origin allowed by the test server's CORS policy
pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Initialize tracing for tests (only once)
static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
});

/// Initialize tracing for tests
pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Knobs for the gateway under test. Defaults keep tests fast.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Spacing between upstream dispatches
    pub min_request_interval: Duration,
    /// Failure streak that trips the circuit
    pub max_consecutive_failures: u32,
    /// Retries per request
    pub max_retries: u32,
    /// Retry backoff unit
    pub retry_base_delay: Duration,
    /// Base upstream timeout
    pub request_timeout: Duration,
    /// Cache TTL
    pub cache_ttl: Duration,
    /// Cache capacity
    pub cache_max_entries: usize,
    /// Inbound requests admitted per window
    pub inbound_limit: u32,
    /// Inbound rate limit window
    pub inbound_window: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_millis(20),
            max_consecutive_failures: 5,
            max_retries: 0,
            retry_base_delay: Duration::from_millis(20),
            request_timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(3600),
            cache_max_entries: 100,
            inbound_limit: 100,
            inbound_window: Duration::from_secs(15 * 60),
        }
    }
}

/// Test server wrapper for integration tests
pub struct TestServer {
    /// The server address
    pub addr: SocketAddr,
    /// HTTP client for making requests
    pub client: Client,
    /// Base URL for the server
    pub base_url: String,
    /// Shared state, for inspecting governor and cache internals
    pub state: AppState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a gateway in front of `nasa` with default options
    pub async fn start(nasa: &MockNasa) -> Self {
        Self::with_options(nasa, GatewayOptions::default()).await
    }

    /// Start a gateway in front of `nasa`
    pub async fn with_options(nasa: &MockNasa, options: GatewayOptions) -> Self {
        init_tracing();

        let client = NasaClient::new(NasaConfig::new(TEST_API_KEY).with_base_url(nasa.base_url()))
            .expect("Failed to create NASA client");

        let governor = RequestGovernor::new(
            Arc::new(client),
            GovernorConfig {
                min_request_interval: options.min_request_interval,
                max_consecutive_failures: options.max_consecutive_failures,
                retry: RetryConfig {
                    max_retries: options.max_retries,
                    base_delay: options.retry_base_delay,
                },
                timeouts: TimeoutConfig {
                    base: options.request_timeout,
                    ..TimeoutConfig::default()
                },
            },
        );
        let cache = ResponseCache::new(CacheConfig {
            ttl: options.cache_ttl,
            max_entries: options.cache_max_entries,
        });

        let state = AppState::builder()
            .lookup(LookupService::new(cache, governor))
            .build()
            .expect("Failed to build state");

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = Server::new(
            ServerConfig::new()
                .with_cors_origins(vec![TEST_ORIGIN.to_string()])
                .with_rate_limit(options.inbound_limit, options.inbound_window),
            state.clone(),
        );

        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Server error");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create client");

        Self {
            addr,
            client,
            base_url: format!("http://{addr}"),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the full URL for a path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a GET request with headers
    pub async fn get_with_headers(&self, path: &str, headers: Vec<(&str, &str)>) -> Response {
        let mut builder = self.client.get(self.url(path));
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder.send().await.expect("Request failed")
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a POST request without a body
    pub async fn post(&self, path: &str) -> Response {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Make a PUT request with JSON body
    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    /// GET and parse the JSON body
    pub async fn get_json(&self, path: &str) -> Value {
        Self::json_body(self.get(path).await).await
    }

    /// Parse response body as JSON
    pub async fn json_body(response: Response) -> Value {
        response.json().await.expect("Failed to parse JSON")
    }

    /// Shutdown the test server
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Assert that a response has the expected status code
pub fn assert_status(response: &Response, expected: u16) {
    assert_eq!(
        response.status().as_u16(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert that a JSON response contains expected fields
pub fn assert_json_contains(json: &Value, expected: &Value) {
    for (key, value) in expected.as_object().expect("Expected object") {
        assert!(json.get(key).is_some(), "Missing key '{}' in response", key);
        if value.is_object() {
            assert_json_contains(&json[key], value);
        } else {
            assert_eq!(
                &json[key], value,
                "Mismatch for key '{}': expected {:?}, got {:?}",
                key, value, json[key]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_health() {
        let nasa = MockNasa::start().await;
        let server = TestServer::start(&nasa).await;

        let response = server.get("/health").await;
        assert_status(&response, 200);

        let json = TestServer::json_body(response).await;
        assert_eq!(json["status"], "OK");
        assert_eq!(nasa.request_count().await, 0);
    }
}
