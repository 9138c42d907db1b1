//! Domain types shared by every gateway crate.
//!
//! [`LookupParams`] doubles as the upstream query and the cache key source,
//! so both are derived here to keep them in lockstep.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Date of the first Astronomy Picture of the Day
#[must_use]
pub fn apod_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or(NaiveDate::MIN)
}

/// Parameters of a single upstream lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupParams {
    /// Whatever the upstream considers today
    Today,
    /// A specific date
    Date(NaiveDate),
    /// An inclusive date range
    Range {
        /// First day
        start: NaiveDate,
        /// Last day
        end: NaiveDate,
    },
}

impl LookupParams {
    /// Query parameters sent to the upstream (excluding credentials)
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Today => Vec::new(),
            Self::Date(date) => vec![("date", date.to_string())],
            Self::Range { start, end } => vec![
                ("start_date", start.to_string()),
                ("end_date", end.to_string()),
            ],
        }
    }

    /// Deterministic cache key.
    ///
    /// Today, single dates and ranges serialize to differently shaped
    /// objects, so the three key spaces never overlap.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let fields: Vec<String> = self
            .query_pairs()
            .into_iter()
            .map(|(name, value)| format!("\"{name}\":\"{value}\""))
            .collect();
        format!("apod:{{{}}}", fields.join(","))
    }

    /// Number of days covered, counting both ends
    #[must_use]
    pub fn span_days(&self) -> i64 {
        match self {
            Self::Today | Self::Date(_) => 1,
            Self::Range { start, end } => (*end - *start).num_days().abs() + 1,
        }
    }

    /// Whether this is a range lookup
    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range { .. })
    }
}

impl std::fmt::Display for LookupParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Today => write!(f, "today"),
            Self::Date(date) => write!(f, "{date}"),
            Self::Range { start, end } => write!(f, "{start}..={end}"),
        }
    }
}

/// One Astronomy Picture of the Day record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Apod {
    /// Publication date
    pub date: NaiveDate,
    /// Title
    pub title: String,
    /// Explanation text
    #[serde(default)]
    pub explanation: String,
    /// Media URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// High resolution media URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdurl: Option<String>,
    /// "image" or "video"
    #[serde(default)]
    pub media_type: String,
    /// Upstream service version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_version: Option<String>,
    /// Copyright holder, absent for public domain images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    /// Marks synthesized placeholder content
    #[serde(rename = "isFallback", default, skip_serializing_if = "is_false")]
    pub is_fallback: bool,
    /// Fields this gateway does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// Body returned by the upstream: one record for a date, a list for a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpstreamPayload {
    /// Range responses
    Many(Vec<Apod>),
    /// Single date responses
    One(Apod),
}

impl UpstreamPayload {
    /// Normalize to a list, wrapping a single record
    #[must_use]
    pub fn into_list(self) -> Vec<Apod> {
        match self {
            Self::Many(apods) => apods,
            Self::One(apod) => vec![apod],
        }
    }

    /// Single record, taking the first entry of a list
    #[must_use]
    pub fn into_single(self) -> Option<Apod> {
        match self {
            Self::One(apod) => Some(apod),
            Self::Many(apods) => apods.into_iter().next(),
        }
    }
}

/// Single-date lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApodResponse {
    /// The record
    #[serde(flatten)]
    pub apod: Apod,
    /// Served from the response cache
    pub cached: bool,
}

/// Range lookup result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApodRangeResponse {
    /// Records, oldest first
    pub apods: Vec<Apod>,
    /// Served from the response cache
    pub cached: bool,
    /// Entries are synthesized placeholders
    #[serde(rename = "isFallback", default, skip_serializing_if = "is_false")]
    pub is_fallback: bool,
    /// Failure that produced an empty result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
