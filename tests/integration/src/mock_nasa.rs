//! Mock NASA APOD API for integration testing
//!
//! Provides a wiremock server that answers on the real APOD path.

use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the NASA client requests
pub const APOD_PATH: &str = "/planetary/apod";

/// API key the test gateway sends
pub const TEST_API_KEY: &str = "integration-test-key-0123456789";

/// Mock NASA API server
pub struct MockNasa {
    /// The underlying wiremock server
    pub server: MockServer,
}

impl MockNasa {
    /// Start a new mock server with no mounted responses
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for the NASA client
    pub fn base_url(&self) -> String {
        format!("{}{APOD_PATH}", self.server.uri())
    }

    /// Number of requests the mock has received
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }

    /// Respond to a specific date
    pub async fn mock_date(&self, date: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .and(query_param("api_key", TEST_API_KEY))
            .and(query_param("date", date))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Respond to a date after `delay`
    pub async fn mock_date_delayed(&self, date: &str, body: Value, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .and(query_param("date", date))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    /// Respond to requests without date parameters
    pub async fn mock_today(&self, body: Value) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .and(query_param_is_missing("date"))
            .and(query_param_is_missing("start_date"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Respond to a range
    pub async fn mock_range(&self, start: &str, end: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .and(query_param("start_date", start))
            .and(query_param("end_date", end))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer the next `times` requests with an error status, whatever they ask for
    pub async fn mock_error_times(&self, status: u16, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Answer every request with an error status
    pub async fn mock_error(&self, status: u16, body: Value) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Answer every request with a body that is not JSON
    pub async fn mock_garbage(&self) {
        Mock::given(method("GET"))
            .and(path(APOD_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&self.server)
            .await;
    }
}
