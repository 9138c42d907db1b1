//! HTTP request handlers.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, SecondsFormat, Utc};
use gateway_core::{apod_epoch, ApodRangeResponse};
use gateway_resilience::CacheReconfigure;
use gateway_telemetry::{LookupKind, LookupOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::{
    error::ApiError,
    state::AppState,
    validation::{validate_date, validate_range},
};

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Acknowledgement for administrative actions
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// What happened
    pub message: &'static str,
    /// ISO-8601 time of the action
    pub timestamp: String,
}

impl ActionResponse {
    fn new(message: &'static str) -> Json<Self> {
        Json(Self {
            message,
            timestamp: timestamp(),
        })
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "OK"
    pub status: &'static str,
    /// ISO-8601 time of the check
    pub timestamp: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: timestamp(),
    })
}

/// Service description
pub async fn api_info() -> Json<Value> {
    Json(json!({
        "message": "NASA APOD Explorer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /apod": "Get today's APOD or date range",
            "GET /apod/:date": "Get APOD for specific date",
            "GET /apod/cache/info": "Cache statistics",
            "DELETE /apod/cache/clear": "Clear cache",
            "PUT /apod/cache/config": "Update cache config"
        }
    }))
}

/// APOD endpoint description with live cache settings
pub async fn apod_info(State(state): State<AppState>) -> Json<Value> {
    let settings = state.lookup.cache_settings();

    Json(json!({
        "message": "NASA APOD Explorer API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /apod": "Get today's APOD or date range with query params",
            "GET /apod/:date": "Get APOD for specific date (YYYY-MM-DD)",
            "GET /apod/cache/info": "Get cache statistics",
            "DELETE /apod/cache/clear": "Clear cache",
            "PUT /apod/cache/config": "Update cache configuration",
            "POST /apod/rate-limit/reset": "Reset rate limit cooldown (dev)"
        },
        "cache": settings,
        "limits": {
            "startDate": apod_epoch().to_string()
        }
    }))
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> Result<Response, ApiError> {
    state.refresh_gauges();
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// `GET /apod` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    /// First day of a range
    pub start_date: Option<String>,
    /// Last day of a range
    pub end_date: Option<String>,
}

impl RangeQuery {
    /// Both bounds, when each is present and non-empty
    fn bounds(&self) -> Option<(&str, &str)> {
        let start = self.start_date.as_deref().filter(|s| !s.is_empty())?;
        let end = self.end_date.as_deref().filter(|s| !s.is_empty())?;
        Some((start, end))
    }
}

/// Today's record, or a range when both dates are given
#[instrument(skip(state))]
pub async fn get_apod(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, ApiError> {
    match query.bounds() {
        Some((start, end)) => {
            let (start, end) = validate_range(start, end, today())?;
            debug!(start = %start, end = %end, days = (end - start).num_days() + 1, "Range requested");
            Ok(Json(range_lookup(&state, start, end).await).into_response())
        }
        _ => single_lookup(&state, None).await,
    }
}

/// Record for a specific date
#[instrument(skip(state))]
pub async fn get_apod_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Response, ApiError> {
    let date = validate_date(&date, today())?;
    single_lookup(&state, Some(date)).await
}

async fn single_lookup(state: &AppState, date: Option<NaiveDate>) -> Result<Response, ApiError> {
    let started = Instant::now();
    let result = state.lookup.get_one(date).await;

    let outcome = match &result {
        Ok(response) if response.cached => LookupOutcome::Hit,
        Ok(response) if response.apod.is_fallback => LookupOutcome::Fallback,
        Ok(_) => LookupOutcome::Miss,
        Err(_) => LookupOutcome::Error,
    };
    state
        .metrics
        .record_lookup(LookupKind::Single, outcome, started.elapsed());

    Ok(Json(result?).into_response())
}

async fn range_lookup(state: &AppState, start: NaiveDate, end: NaiveDate) -> ApodRangeResponse {
    let started = Instant::now();
    let response = state.lookup.get_range(start, end).await;

    let outcome = if response.cached {
        LookupOutcome::Hit
    } else if response.is_fallback {
        LookupOutcome::Fallback
    } else if response.error.is_some() {
        LookupOutcome::Error
    } else {
        LookupOutcome::Miss
    };
    state
        .metrics
        .record_lookup(LookupKind::Range, outcome, started.elapsed());

    response
}

/// Cache statistics with the hit rate rendered as a percentage string
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfoResponse {
    /// Stored entries
    pub size: usize,
    /// Capacity
    pub max_size: usize,
    /// TTL in milliseconds
    pub ttl: u64,
    /// Hits since last clear
    pub hits: u64,
    /// Misses since last clear
    pub misses: u64,
    /// e.g. "75.00%"
    pub hit_rate: String,
}

/// Cache statistics
pub async fn cache_info(State(state): State<AppState>) -> Json<CacheInfoResponse> {
    let stats = state.lookup.cache_stats();

    Json(CacheInfoResponse {
        size: stats.size,
        max_size: stats.max_entries,
        ttl: stats.ttl_ms,
        hits: stats.hits,
        misses: stats.misses,
        hit_rate: format!("{:.2}%", stats.hit_rate),
    })
}

/// Drop every cached response
pub async fn clear_cache(State(state): State<AppState>) -> Json<ActionResponse> {
    state.lookup.clear_cache();
    ActionResponse::new("Cache cleared successfully")
}

/// Result of a cache reconfiguration
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfigResponse {
    /// Outcome
    pub message: &'static str,
    /// Effective TTL in milliseconds
    pub ttl: u64,
    /// Effective capacity
    pub max_size: usize,
    /// ISO-8601 time of the change
    pub timestamp: String,
}

/// Lenient integer reading: JSON numbers (fractions truncated) and numeric
/// strings. `None` means the value is unusable.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Change cache TTL and/or capacity
pub async fn update_cache_config(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<CacheConfigResponse>, ApiError> {
    let field = |name: &str, error: &'static str| -> Result<Option<i64>, ApiError> {
        match body.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => coerce_int(value)
                .map(Some)
                .ok_or_else(|| ApiError::bad_request(error)),
        }
    };

    let update = CacheReconfigure {
        ttl_ms: field("ttl", "TTL must be a positive number")?,
        max_entries: field("maxSize", "Max size must be at least 1")?,
    };

    let settings = state.lookup.reconfigure_cache(update)?;
    info!(ttl_ms = settings.ttl_ms, max_size = settings.max_entries, "Cache configuration updated");

    Ok(Json(CacheConfigResponse {
        message: "Cache configuration updated successfully",
        ttl: settings.ttl_ms,
        max_size: settings.max_entries,
        timestamp: timestamp(),
    }))
}

/// Clear the upstream failure streak
pub async fn reset_rate_limit(State(state): State<AppState>) -> Json<ActionResponse> {
    state.lookup.reset_rate_limit_cooldown();
    ActionResponse::new("Rate limit cooldown reset successfully")
}

/// Unknown route
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
