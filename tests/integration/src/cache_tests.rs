//! Cache integration tests
//!
//! Tests for caching behavior including hits, misses, range caching
//! limits, clearing and runtime reconfiguration.

use crate::fixtures::*;
use crate::helpers::*;
use crate::mock_nasa::MockNasa;
use chrono::Duration as ChronoDuration;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

/// Test repeated lookups are served from the cache
#[tokio::test]
async fn test_cache_hit() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-01-01", apod_json("2024-01-01")).await;
    let server = TestServer::start(&nasa).await;

    let first = server.get_json("/apod/2024-01-01").await;
    let second = server.get_json("/apod/2024-01-01").await;

    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);
    assert_eq!(first["title"], second["title"]);
    assert_eq!(nasa.request_count().await, 1);
}

/// Test cache statistics
#[tokio::test]
async fn test_cache_info() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-01-01", apod_json("2024-01-01")).await;
    nasa.mock_date("2024-01-02", apod_json("2024-01-02")).await;
    let server = TestServer::start(&nasa).await;

    server.get("/apod/2024-01-01").await;
    server.get("/apod/2024-01-01").await;
    server.get("/apod/2024-01-02").await;

    let info = server.get_json("/apod/cache/info").await;
    assert_eq!(
        info,
        json!({
            "size": 2,
            "maxSize": 100,
            "ttl": 3_600_000,
            "hits": 1,
            "misses": 2,
            "hitRate": "33.33%"
        })
    );
}

/// Test ranges are cached under their own key
#[tokio::test]
async fn test_range_cached() {
    let nasa = MockNasa::start().await;
    nasa.mock_range(
        "2024-01-01",
        "2024-01-03",
        range_json(date("2024-01-01"), date("2024-01-03")),
    )
    .await;
    let server = TestServer::start(&nasa).await;

    let path = "/apod?start_date=2024-01-01&end_date=2024-01-03";
    let first = server.get_json(path).await;
    let second = server.get_json(path).await;

    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], true);
    assert_eq!(first["apods"], second["apods"]);
    assert_eq!(nasa.request_count().await, 1);
}

/// Test very large ranges are not cached
#[tokio::test]
async fn test_large_range_not_cached() {
    let nasa = MockNasa::start().await;
    let start = date("2023-01-01");
    let end = start + ChronoDuration::days(100);
    nasa.mock_range(&start.to_string(), &end.to_string(), range_json(start, end))
        .await;
    let server = TestServer::start(&nasa).await;

    let path = format!("/apod?start_date={start}&end_date={end}");
    let first = server.get_json(&path).await;
    let second = server.get_json(&path).await;

    assert_eq!(first["apods"].as_array().unwrap().len(), 101);
    assert_eq!(second["cached"], false);
    assert_eq!(nasa.request_count().await, 2);
}

/// Test clearing the cache forces a refetch
#[tokio::test]
async fn test_clear_cache() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-01-01", apod_json("2024-01-01")).await;
    let server = TestServer::start(&nasa).await;

    server.get("/apod/2024-01-01").await;

    let response = server.delete("/apod/cache/clear").await;
    assert_status(&response, 200);
    let body = TestServer::json_body(response).await;
    assert_eq!(body["message"], "Cache cleared successfully");
    assert!(body["timestamp"].is_string());

    let info = server.get_json("/apod/cache/info").await;
    assert_eq!(info["size"], 0);
    assert_eq!(info["hits"], 0);
    assert_eq!(info["misses"], 0);

    let again = server.get_json("/apod/2024-01-01").await;
    assert_eq!(again["cached"], false);
    assert_eq!(nasa.request_count().await, 2);
}

/// Test a shorter TTL applies to entries already stored
#[tokio::test]
async fn test_ttl_update_expires_entries() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-01-01", apod_json("2024-01-01")).await;
    let server = TestServer::start(&nasa).await;

    server.get("/apod/2024-01-01").await;

    let response = server
        .put_json("/apod/cache/config", &json!({ "ttl": 100 }))
        .await;
    assert_status(&response, 200);
    let body = TestServer::json_body(response).await;
    assert_eq!(body["ttl"], 100);
    assert_eq!(body["maxSize"], 100);

    tokio::time::sleep(Duration::from_millis(250)).await;

    let again = server.get_json("/apod/2024-01-01").await;
    assert_eq!(again["cached"], false);
    assert_eq!(nasa.request_count().await, 2);
}

/// Test shrinking the cache keeps the newest entries
#[tokio::test]
async fn test_max_size_update_evicts_oldest() {
    let nasa = MockNasa::start().await;
    nasa.mock_date("2024-01-01", apod_json("2024-01-01")).await;
    nasa.mock_date("2024-01-02", apod_json("2024-01-02")).await;
    let server = TestServer::start(&nasa).await;

    server.get("/apod/2024-01-01").await;
    server.get("/apod/2024-01-02").await;

    let response = server
        .put_json("/apod/cache/config", &json!({ "maxSize": 1 }))
        .await;
    assert_status(&response, 200);

    let info = server.get_json("/apod/cache/info").await;
    assert_eq!(info["size"], 1);
    assert_eq!(info["maxSize"], 1);

    let newest = server.get_json("/apod/2024-01-02").await;
    assert_eq!(newest["cached"], true);
    assert_eq!(nasa.request_count().await, 2);
}

/// Test invalid updates are rejected without partial application
#[tokio::test]
async fn test_invalid_config_rejected() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let response = server
        .put_json("/apod/cache/config", &json!({ "ttl": 5000, "maxSize": 0 }))
        .await;
    assert_status(&response, 400);
    assert_eq!(
        TestServer::json_body(response).await,
        json!({ "error": "Max size must be at least 1" })
    );

    let response = server
        .put_json("/apod/cache/config", &json!({ "ttl": "later" }))
        .await;
    assert_status(&response, 400);
    assert_eq!(
        TestServer::json_body(response).await,
        json!({ "error": "TTL must be a positive number" })
    );

    let info = server.get_json("/apod/cache/info").await;
    assert_eq!(info["ttl"], 3_600_000);
    assert_eq!(info["maxSize"], 100);
}

/// Test numeric strings are accepted
#[tokio::test]
async fn test_config_accepts_numeric_strings() {
    let nasa = MockNasa::start().await;
    let server = TestServer::start(&nasa).await;

    let response = server
        .put_json("/apod/cache/config", &json!({ "ttl": "60000", "maxSize": "25" }))
        .await;
    assert_status(&response, 200);

    let info = server.get_json("/apod/info").await;
    assert_eq!(info["cache"], json!({ "ttl": 60000, "maxSize": 25 }));
}
