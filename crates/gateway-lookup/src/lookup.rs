//! Cache-first lookups.
//!
//! Single-date and range lookups consult the response cache, fall through to
//! the request governor on a miss, and fill the cache on success. Failures in
//! the fallback set are answered with placeholder content, which is never
//! cached.
//!
//! The two lookups fail differently: a single-date lookup propagates its
//! error, while a range lookup always succeeds and reports the failure in the
//! `error` field of an empty result.

use crate::fallback::FallbackProvider;
use chrono::NaiveDate;
use gateway_core::{
    ApodError, ApodRangeResponse, ApodResponse, ApodResult, LookupParams, UpstreamPayload,
};
use gateway_resilience::{
    CacheReconfigure, CacheSettings, CacheStats, GovernorStats, RequestGovernor, ResponseCache,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest range result stored in the cache
pub const MAX_CACHED_RANGE_LEN: usize = 100;

/// Lookup service
pub struct LookupService {
    cache: Arc<ResponseCache<UpstreamPayload>>,
    governor: RequestGovernor,
    fallback: FallbackProvider,
}

impl LookupService {
    /// Create a lookup service
    #[must_use]
    pub fn new(cache: ResponseCache<UpstreamPayload>, governor: RequestGovernor) -> Self {
        Self {
            cache: Arc::new(cache),
            governor,
            fallback: FallbackProvider::new(),
        }
    }

    /// Replace the fallback provider
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackProvider) -> Self {
        self.fallback = fallback;
        self
    }

    /// Enqueue `params` and store a successful result under `key`.
    ///
    /// Runs on its own task so the cache is filled even when the caller
    /// stops waiting; the governor dispatches queued requests regardless.
    async fn fetch_and_fill(&self, params: LookupParams, key: String) -> ApodResult<UpstreamPayload> {
        let governor = self.governor.clone();
        let cache = Arc::clone(&self.cache);

        let task = tokio::spawn(async move {
            let payload = governor.enqueue(params).await?;

            if params.is_range() {
                let apods = payload.into_list();
                if (1..=MAX_CACHED_RANGE_LEN).contains(&apods.len()) {
                    cache.set(key, UpstreamPayload::Many(apods.clone()));
                } else {
                    debug!(len = apods.len(), "Range result not cached");
                }
                Ok(UpstreamPayload::Many(apods))
            } else {
                let apod = payload
                    .into_single()
                    .ok_or_else(|| ApodError::upstream(None, "Upstream returned no record"))?;
                cache.set(key, UpstreamPayload::One(apod.clone()));
                Ok(UpstreamPayload::One(apod))
            }
        });

        task.await
            .map_err(|e| ApodError::internal(format!("Lookup task failed: {e}")))?
    }

    /// Record for `date`, or for today when absent.
    ///
    /// Rate limiting and network failures yield a placeholder record; every
    /// other failure is returned as an error.
    pub async fn get_one(&self, date: Option<NaiveDate>) -> ApodResult<ApodResponse> {
        let params = date.map_or(LookupParams::Today, LookupParams::Date);
        let key = params.cache_key();

        if let Some(apod) = self.cache.get(&key).and_then(UpstreamPayload::into_single) {
            debug!(key = %key, "Cache hit");
            return Ok(ApodResponse { apod, cached: true });
        }

        debug!(key = %key, "Cache miss, fetching from upstream");
        let outcome = self.fetch_and_fill(params, key).await.and_then(|payload| {
            payload
                .into_single()
                .ok_or_else(|| ApodError::upstream(None, "Upstream returned no record"))
        });

        match outcome {
            Ok(apod) => Ok(ApodResponse { apod, cached: false }),
            Err(error) if error.triggers_single_fallback() => {
                warn!(params = %params, error_type = error.error_type(), "Serving fallback record");
                Ok(ApodResponse {
                    apod: self.fallback.single(date),
                    cached: false,
                })
            }
            Err(error) => Err(error),
        }
    }

    /// Records for `start..=end`. Never fails; see the module docs.
    pub async fn get_range(&self, start: NaiveDate, end: NaiveDate) -> ApodRangeResponse {
        let params = LookupParams::Range { start, end };
        let key = params.cache_key();

        if let Some(payload) = self.cache.get(&key) {
            debug!(key = %key, "Cache hit for range");
            return ApodRangeResponse {
                apods: payload.into_list(),
                cached: true,
                ..Default::default()
            };
        }

        info!(start = %start, end = %end, days = params.span_days(), "Fetching range from upstream");

        match self.fetch_and_fill(params, key).await {
            Ok(payload) => ApodRangeResponse {
                apods: payload.into_list(),
                ..Default::default()
            },
            Err(error) if error.triggers_range_fallback() => {
                warn!(params = %params, error_type = error.error_type(), "Serving fallback range");
                ApodRangeResponse {
                    apods: self.fallback.range(start, end),
                    is_fallback: true,
                    ..Default::default()
                }
            }
            Err(error) => {
                warn!(params = %params, error = %error, "Range lookup failed");
                ApodRangeResponse {
                    error: Some(error.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    /// Cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Current cache settings
    pub fn cache_settings(&self) -> CacheSettings {
        self.cache.settings()
    }

    /// Drop every cached response and reset hit/miss counters
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Cache cleared");
    }

    /// Change TTL and/or capacity. Nothing changes if either value is invalid.
    pub fn reconfigure_cache(&self, update: CacheReconfigure) -> ApodResult<CacheSettings> {
        let settings = self.cache.reconfigure(update)?;
        info!(ttl_ms = settings.ttl_ms, max_entries = settings.max_entries, "Cache reconfigured");
        Ok(settings)
    }

    /// Clear the governor's failure streak
    pub fn reset_rate_limit_cooldown(&self) {
        self.governor.reset_cooldown();
    }

    /// Governor statistics
    pub fn governor_stats(&self) -> GovernorStats {
        self.governor.stats()
    }
}
