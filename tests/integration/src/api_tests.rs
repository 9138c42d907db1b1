//! API endpoint integration tests
//!
//! Tests for the HTTP surface: lookups, validation, service info,
//! metrics, CORS, hardening headers, the inbound limit and unknown routes.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_nasa::MockNasa;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Test health endpoint shape
#[tokio::test]
async fn test_health_endpoint() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let response = server.get("/health").await;
    assert_status(&response, 200);

    let body = TestServer::json_body(response).await;
    assert_eq!(body["status"], "OK");

    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

/// Test service description endpoints
#[tokio::test]
async fn test_info_endpoints() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let api = server.get_json("/api").await;
    assert_eq!(api["message"], "NASA APOD Explorer API");
    assert!(api["endpoints"]["GET /apod/:date"].is_string());

    let info = server.get_json("/apod/info").await;
    assert_json_contains(
        &info,
        &json!({
            "cache": { "ttl": 3_600_000, "maxSize": 100 },
            "limits": { "startDate": "1995-06-16" }
        }),
    );
    assert!(info["endpoints"]["POST /apod/rate-limit/reset"].is_string());
}

/// Test a specific date is fetched and passed through
#[tokio::test]
async fn test_get_apod_by_date() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-01-15", apod_json("2024-01-15")).await;
    let server = TestServer::start(&nasa).await;

    let response = server.get("/apod/2024-01-15").await;
    assert_status(&response, 200);

    let body = TestServer::json_body(response).await;
    let mut expected = apod_json("2024-01-15");
    expected["cached"] = json!(false);
    assert_eq!(body, expected);
}

/// Test fields the gateway does not model survive the round trip
#[tokio::test]
async fn test_unknown_upstream_fields_preserved() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-02-01", video_apod_json("2024-02-01")).await;
    let server = TestServer::start(&nasa).await;

    let body = server.get_json("/apod/2024-02-01").await;
    assert_eq!(body["media_type"], "video");
    assert_eq!(body["thumbnail_url"], "https://img.youtube.com/vi/example/0.jpg");
    assert!(body.get("copyright").is_none());
    assert!(body.get("isFallback").is_none());
}

/// Test today's record
#[tokio::test]
async fn test_get_today() {
    let nasa = MockNasa::start().await;
    let today = today().to_string();
    nasa.mock_today(apod_json(&today)).await;
    let server = TestServer::start(&nasa).await;

    let body = server.get_json("/apod").await;
    assert_eq!(body["date"], today);
    assert_eq!(body["cached"], false);
}

/// Test a date range
#[tokio::test]
async fn test_get_range() {
    let nasa = MockNasa::start().await;
    nasa.mock_range(
        "2024-01-01",
        "2024-01-07",
        range_json(date("2024-01-01"), date("2024-01-07")),
    )
    .await;
    let server = TestServer::start(&nasa).await;

    let body = server
        .get_json("/apod?start_date=2024-01-01&end_date=2024-01-07")
        .await;

    let apods = body["apods"].as_array().unwrap();
    assert_eq!(apods.len(), 7);
    assert_eq!(apods[0]["date"], "2024-01-01");
    assert_eq!(apods[6]["date"], "2024-01-07");
    assert_eq!(body["cached"], false);
    assert!(body.get("error").is_none());
}

/// Test a lone range bound is ignored and today is served
#[tokio::test]
async fn test_partial_range_serves_today() {
    let nasa = MockNasa::start().await;
    let today = today().to_string();
    nasa.mock_today(apod_json(&today)).await;
    let server = TestServer::start(&nasa).await;

    let body = server.get_json("/apod?end_date=2024-01-07").await;
    assert_eq!(body["date"], today);
}

/// Test empty range bounds are treated as absent
#[tokio::test]
async fn test_empty_range_params_serve_today() {
    let nasa = MockNasa::start().await;
    let today = today().to_string();
    nasa.mock_today(apod_json(&today)).await;
    let server = TestServer::start(&nasa).await;

    let response = server.get("/apod?start_date=&end_date=").await;
    assert_status(&response, 200);
    assert_eq!(TestServer::json_body(response).await["date"], today);
}

/// Test malformed and out-of-bounds dates never reach the upstream
#[tokio::test]
async fn test_date_validation() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let tomorrow = days_ago(-1);
    let cases = [
        ("/apod/2024-1-5".to_string(), "Invalid date format. Use YYYY-MM-DD".to_string()),
        ("/apod/2023-02-30".to_string(), "Invalid date format. Use YYYY-MM-DD".to_string()),
        (
            "/apod/1995-06-15".to_string(),
            "Date cannot be before June 16, 1995 (APOD start date)".to_string(),
        ),
        (
            format!("/apod/{tomorrow}"),
            format!("Date cannot be in the future. Today is {}", today()),
        ),
        (
            "/apod?start_date=2024-01-10&end_date=2024-01-01".to_string(),
            "Start date cannot be after end date".to_string(),
        ),
        (
            format!("/apod?start_date=2024-01-01&end_date={tomorrow}"),
            format!("Dates cannot be in the future. Today is {}", today()),
        ),
        (
            "/apod?start_date=1990-01-01&end_date=2024-01-01".to_string(),
            "Dates cannot be before June 16, 1995 (APOD start date)".to_string(),
        ),
    ];

    for (path, message) in cases {
        let response = server.get(&path).await;
        assert_status(&response, 400);
        assert_eq!(TestServer::json_body(response).await, json!({ "error": message }), "{path}");
    }

    assert_eq!(nasa.request_count().await, 0);
}

/// Test the first APOD date is accepted
#[tokio::test]
async fn test_epoch_date_accepted() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("1995-06-16", apod_json("1995-06-16")).await;
    let server = TestServer::start(&nasa).await;

    let response = server.get("/apod/1995-06-16").await;
    assert_status(&response, 200);
}

/// Test metrics reflect lookups
#[tokio::test]
async fn test_metrics_endpoint() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-03-01", apod_json("2024-03-01")).await;
    let server = TestServer::start(&nasa).await;

    server.get("/apod/2024-03-01").await;
    server.get("/apod/2024-03-01").await;

    let response = server.get("/metrics").await;
    assert_status(&response, 200);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = response.text().await.unwrap();
    assert!(text.contains(r#"apod_lookups_total{kind="single",outcome="miss"} 1"#));
    assert!(text.contains(r#"apod_lookups_total{kind="single",outcome="hit"} 1"#));
    assert!(text.contains("apod_cache_entries 1"));
    assert!(text.contains("apod_governor_dispatches 1"));
}

/// Test CORS headers for the allowed origin
#[tokio::test]
async fn test_cors_headers() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let response = server
        .get_with_headers("/health", vec![("Origin", TEST_ORIGIN)])
        .await;

    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        TEST_ORIGIN
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-credentials")
            .unwrap(),
        "true"
    );

    let response = server
        .get_with_headers("/health", vec![("Origin", "http://elsewhere.example")])
        .await;
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

/// Test CORS preflight for the cache config endpoint
#[tokio::test]
async fn test_cors_preflight() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let response = server
        .client
        .request(reqwest::Method::OPTIONS, server.url("/apod/cache/config"))
        .header("Origin", TEST_ORIGIN)
        .header("Access-Control-Request-Method", "PUT")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_status(&response, 200);
    let methods = response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(methods.contains("PUT"));
    assert!(methods.contains("DELETE"));
}

/// Test unknown routes
#[tokio::test]
async fn test_not_found() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let response = server.get("/v1/models").await;
    assert_status(&response, 404);
    assert_eq!(
        TestServer::json_body(response).await,
        json!({ "error": "Route not found" })
    );
}

/// Test every response carries the hardening headers
#[tokio::test]
async fn test_security_headers() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    for path in ["/health", "/apod/info", "/v1/models"] {
        let response = server.get(path).await;
        let headers = response.headers();

        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert_eq!(headers["referrer-policy"], "no-referrer");
        assert_eq!(headers["cross-origin-opener-policy"], "same-origin");
        assert!(headers.contains_key("content-security-policy"));
        assert!(headers.contains_key("strict-transport-security"));
    }
}

/// Test the inbound limit answers 429 once the window is spent
#[tokio::test]
async fn test_inbound_rate_limit() {
    let nasa = MockNasa::start().await;
    let server = TestServer::with_options(
        &nasa,
        GatewayOptions {
            inbound_limit: 3,
            ..GatewayOptions::default()
        },
    )
    .await;

    for _ in 0..3 {
        assert_status(&server.get("/health").await, 200);
    }

    let response = server.get("/apod/info").await;
    assert_status(&response, 429);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert_eq!(
        TestServer::json_body(response).await,
        json!({ "error": "Too many requests, please try again later." })
    );
    assert_eq!(nasa.request_count().await, 0);
}
