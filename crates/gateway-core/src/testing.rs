//! Scripted upstream for tests.
//!
//! Outcomes are consumed in order; once the script runs out every call gets
//! the fallback outcome, which by default synthesizes records for the
//! requested dates.

use crate::error::ApodError;
use crate::types::{Apod, LookupParams, UpstreamPayload};
use crate::upstream::UpstreamClient;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use parking_lot::Mutex;
use serde_json::Map;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// One recorded upstream call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Parameters passed to the call
    pub params: LookupParams,
    /// Timeout passed to the call
    pub timeout: Duration,
    /// When the call started (tokio clock, honours paused time)
    pub started_at: Instant,
}

/// Upstream double that replays a script of outcomes
#[derive(Default)]
pub struct ScriptedUpstream {
    script: Mutex<VecDeque<Result<UpstreamPayload, ApodError>>>,
    fallback: Mutex<Option<ApodError>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Decrements the in-flight count when a call ends or is dropped
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedUpstream {
    /// Upstream that always succeeds
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upstream that always fails with `error` once the script is exhausted
    #[must_use]
    pub fn failing(error: ApodError) -> Self {
        let upstream = Self::default();
        *upstream.fallback.lock() = Some(error);
        upstream
    }

    /// Append an outcome to the script
    pub fn push(&self, outcome: Result<UpstreamPayload, ApodError>) {
        self.script.lock().push_back(outcome);
    }

    /// Append an error to the script
    pub fn push_error(&self, error: ApodError) {
        self.push(Err(error));
    }

    /// Simulated duration of every call
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of calls that were running at the same time
    pub fn max_concurrent_calls(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn synthesize(params: &LookupParams) -> UpstreamPayload {
        match params {
            LookupParams::Today => UpstreamPayload::One(sample_apod(Utc::now().date_naive())),
            LookupParams::Date(date) => UpstreamPayload::One(sample_apod(*date)),
            LookupParams::Range { start, end } => {
                let days = (*end - *start).num_days().max(0);
                UpstreamPayload::Many(
                    (0..=days)
                        .map(|offset| sample_apod(*start + ChronoDuration::days(offset)))
                        .collect(),
                )
            }
        }
    }
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn call(
        &self,
        params: &LookupParams,
        timeout: Duration,
    ) -> Result<UpstreamPayload, ApodError> {
        self.calls.lock().push(RecordedCall {
            params: *params,
            timeout,
            started_at: Instant::now(),
        });

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => match self.fallback.lock().clone() {
                Some(error) => Err(error),
                None => Ok(Self::synthesize(params)),
            },
        }
    }
}

/// A plausible record for `date`
#[must_use]
pub fn sample_apod(date: NaiveDate) -> Apod {
    Apod {
        date,
        title: format!("Picture for {date}"),
        explanation: "A sample astronomy picture.".to_string(),
        url: Some(format!("https://apod.nasa.gov/apod/image/{date}.jpg")),
        hdurl: None,
        media_type: "image".to_string(),
        service_version: Some("v1".to_string()),
        copyright: None,
        is_fallback: false,
        extra: Map::new(),
    }
}
