//! Date parameter validation.
//!
//! Dates must be `YYYY-MM-DD`, exist in the calendar, and fall between the
//! first APOD (1995-06-16) and today (UTC).

use crate::error::ApiError;
use chrono::NaiveDate;
use gateway_core::apod_epoch;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

const INVALID_FORMAT: &str = "Invalid date format. Use YYYY-MM-DD";

fn parse(raw: &str) -> Result<NaiveDate, ApiError> {
    if !DATE_FORMAT.is_match(raw) {
        return Err(ApiError::bad_request(INVALID_FORMAT));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::bad_request(INVALID_FORMAT))
}

/// Validate a single date path parameter
pub fn validate_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, ApiError> {
    let date = parse(raw)?;

    if date > today {
        return Err(ApiError::bad_request(format!(
            "Date cannot be in the future. Today is {today}"
        )));
    }
    if date < apod_epoch() {
        return Err(ApiError::bad_request(
            "Date cannot be before June 16, 1995 (APOD start date)",
        ));
    }

    Ok(date)
}

/// Validate a `start_date`/`end_date` pair
pub fn validate_range(
    start_raw: &str,
    end_raw: &str,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = parse(start_raw)?;
    let end = parse(end_raw)?;

    if start > today || end > today {
        return Err(ApiError::bad_request(format!(
            "Dates cannot be in the future. Today is {today}"
        )));
    }
    if start < apod_epoch() || end < apod_epoch() {
        return Err(ApiError::bad_request(
            "Dates cannot be before June 16, 1995 (APOD start date)",
        ));
    }
    if start > end {
        return Err(ApiError::bad_request("Start date cannot be after end date"));
    }

    Ok((start, end))
}
