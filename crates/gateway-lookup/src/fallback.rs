//! Placeholder content served when the upstream is rate limiting or
//! unreachable.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use gateway_core::Apod;
use serde_json::Map;

/// Upper bound on placeholder entries for a range
pub const MAX_FALLBACK_DAYS: i64 = 7;

const FALLBACK_TITLE: &str = "Exploring Our Universe - NASA Astronomy";
const FALLBACK_EXPLANATION: &str = "Welcome to NASA's Astronomy Picture of the Day! \
This feature showcases a different image or photograph of our universe each day, along \
with a brief explanation written by a professional astronomer. Due to high demand or \
network issues, we're currently showing sample content. The actual APOD will load \
automatically when available.";
const FALLBACK_IMAGE_URL: &str = "https://apod.nasa.gov/apod/image/2401/NGC1232_1024.jpg";

/// Builds placeholder records
#[derive(Debug, Clone, Default)]
pub struct FallbackProvider {
    today: Option<NaiveDate>,
}

impl FallbackProvider {
    /// Provider using the current UTC date
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "today" to a fixed date
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// One placeholder dated `date`, or today when absent
    #[must_use]
    pub fn single(&self, date: Option<NaiveDate>) -> Apod {
        Self::placeholder(date.unwrap_or_else(|| self.today()))
    }

    /// Placeholders for the first days of `start..=end`, at most
    /// [`MAX_FALLBACK_DAYS`], never dated after today
    #[must_use]
    pub fn range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Apod> {
        let today = self.today();
        let days = ((end - start).num_days() + 1).clamp(0, MAX_FALLBACK_DAYS);

        (0..days)
            .map(|offset| start + ChronoDuration::days(offset))
            .filter(|date| *date <= today)
            .map(Self::placeholder)
            .collect()
    }

    fn placeholder(date: NaiveDate) -> Apod {
        Apod {
            date,
            title: FALLBACK_TITLE.to_string(),
            explanation: FALLBACK_EXPLANATION.to_string(),
            url: Some(FALLBACK_IMAGE_URL.to_string()),
            hdurl: Some(FALLBACK_IMAGE_URL.to_string()),
            media_type: "image".to_string(),
            service_version: Some("v1".to_string()),
            copyright: None,
            is_fallback: true,
            extra: Map::new(),
        }
    }
}
