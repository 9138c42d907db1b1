//! Test fixtures: NASA API response bodies and date helpers

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde_json::{json, Value};

/// Parse a `YYYY-MM-DD` literal
pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

/// Today (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// `days` before today, formatted for a URL
pub fn days_ago(days: i64) -> String {
    (today() - ChronoDuration::days(days)).to_string()
}

/// A NASA APOD record as the API returns it
pub fn apod_json(date: &str) -> Value {
    json!({
        "date": date,
        "title": format!("Nebula of {date}"),
        "explanation": "Gas and dust glow in the light of young stars.",
        "url": format!("https://apod.nasa.gov/apod/image/{date}_1024.jpg"),
        "hdurl": format!("https://apod.nasa.gov/apod/image/{date}.jpg"),
        "media_type": "image",
        "service_version": "v1",
        "copyright": "Example Observatory"
    })
}

/// A video record with a thumbnail field the gateway does not model
pub fn video_apod_json(date: &str) -> Value {
    json!({
        "date": date,
        "title": "Rotating Moon",
        "explanation": "A time-lapse of lunar libration.",
        "url": "https://www.youtube.com/embed/example",
        "media_type": "video",
        "service_version": "v1",
        "thumbnail_url": "https://img.youtube.com/vi/example/0.jpg"
    })
}

/// Range body for `start..=end`
pub fn range_json(start: NaiveDate, end: NaiveDate) -> Value {
    let days = (end - start).num_days();
    Value::Array(
        (0..=days)
            .map(|offset| apod_json(&(start + ChronoDuration::days(offset)).to_string()))
            .collect(),
    )
}

/// api.data.gov style error body
pub fn gateway_error_json(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// APOD service style error body
pub fn service_error_json(code: u16, msg: &str) -> Value {
    json!({
        "code": code,
        "msg": msg,
        "service_version": "v1"
    })
}
