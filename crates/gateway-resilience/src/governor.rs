//! Request governor: a serializing queue in front of the upstream.
//!
//! Every lookup that misses the cache is queued here. A single worker task
//! drains the queue, so at most one upstream call is in flight. Dispatch
//! start times are spaced at least `min_request_interval` apart. Transient
//! failures are retried with linear backoff and re-queued at the head.
//! After `max_consecutive_failures` back-to-back failures every queued request
//! is rejected with [`ApodError::ServiceUnavailable`].
//!
//! The worker exists only while there is work: it is spawned by the first
//! `enqueue` on an idle governor and exits once the queue is empty or the
//! circuit trips.

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::timeout::{TimeoutConfig, TimeoutManager};
use gateway_core::{ApodError, ApodResult, LookupParams, UpstreamClient, UpstreamPayload};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Governor configuration
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    /// Minimum spacing between dispatch start times
    pub min_request_interval: Duration,
    /// Consecutive failures that trip the circuit
    pub max_consecutive_failures: u32,
    /// Retry policy settings
    pub retry: RetryConfig,
    /// Per-dispatch timeout settings
    pub timeouts: TimeoutConfig,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_request_interval: Duration::from_secs(6),
            max_consecutive_failures: 2,
            retry: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Governor statistics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernorStats {
    /// Requests waiting for dispatch
    pub queue_depth: usize,
    /// Whether the worker is running
    pub is_dispatching: bool,
    /// Current failure streak
    pub consecutive_failures: u32,
    /// Failure streak that trips the circuit
    pub max_consecutive_failures: u32,
    /// Open once the streak reaches `max_consecutive_failures`
    pub circuit_state: CircuitState,
    /// Times the circuit tripped
    pub circuit_trips: u64,
    /// Upstream calls made
    pub total_dispatches: u64,
    /// Configured spacing
    pub min_request_interval: Duration,
}

struct QueuedRequest {
    params: LookupParams,
    retry_count: u32,
    sink: oneshot::Sender<ApodResult<UpstreamPayload>>,
}

impl QueuedRequest {
    fn resolve(self, outcome: ApodResult<UpstreamPayload>) {
        // The caller may have gone away; nothing to do then
        let _ = self.sink.send(outcome);
    }
}

#[derive(Default)]
struct GovernorState {
    queue: VecDeque<QueuedRequest>,
    last_dispatch_at: Option<Instant>,
    is_dispatching: bool,
}

struct Shared {
    upstream: Arc<dyn UpstreamClient>,
    state: Mutex<GovernorState>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    timeouts: TimeoutManager,
    min_request_interval: Duration,
    max_consecutive_failures: u32,
    total_dispatches: AtomicU64,
}

enum Flow {
    Continue,
    Stop,
}

/// Serializing, rate-limiting dispatcher for upstream calls
#[derive(Clone)]
pub struct RequestGovernor {
    shared: Arc<Shared>,
}

impl RequestGovernor {
    /// Create a governor in front of `upstream`
    #[must_use]
    pub fn new(upstream: Arc<dyn UpstreamClient>, config: GovernorConfig) -> Self {
        info!(
            upstream = upstream.id(),
            min_request_interval_ms = config.min_request_interval.as_millis() as u64,
            max_consecutive_failures = config.max_consecutive_failures,
            "Request governor initialized"
        );

        let breaker = CircuitBreaker::new(
            upstream.id(),
            CircuitBreakerConfig {
                failure_threshold: config.max_consecutive_failures,
            },
        );

        Self {
            shared: Arc::new(Shared {
                upstream,
                state: Mutex::new(GovernorState::default()),
                breaker,
                retry: RetryPolicy::new(config.retry),
                timeouts: TimeoutManager::new(config.timeouts),
                min_request_interval: config.min_request_interval,
                max_consecutive_failures: config.max_consecutive_failures.max(1),
                total_dispatches: AtomicU64::new(0),
            }),
        }
    }

    /// Queue a lookup and wait for its outcome.
    ///
    /// The request is appended to the tail; the worker is started if idle.
    pub async fn enqueue(&self, params: LookupParams) -> ApodResult<UpstreamPayload> {
        let (sink, outcome) = oneshot::channel();

        let start_worker = {
            let mut state = self.shared.state.lock();
            state.queue.push_back(QueuedRequest {
                params,
                retry_count: 0,
                sink,
            });
            debug!(params = %params, queue_depth = state.queue.len(), "Request queued");

            !std::mem::replace(&mut state.is_dispatching, true)
        };

        if start_worker {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.run().await });
        }

        outcome
            .await
            .unwrap_or_else(|_| Err(ApodError::internal("dispatch worker dropped the request")))
    }

    /// Clear the failure streak. The queue and dispatch spacing are untouched.
    pub fn reset_cooldown(&self) {
        self.shared.breaker.reset();
    }

    /// Statistics snapshot
    pub fn stats(&self) -> GovernorStats {
        let (queue_depth, is_dispatching) = {
            let state = self.shared.state.lock();
            (state.queue.len(), state.is_dispatching)
        };
        let breaker = self.shared.breaker.stats();

        GovernorStats {
            queue_depth,
            is_dispatching,
            consecutive_failures: breaker.consecutive_failures,
            max_consecutive_failures: self.shared.max_consecutive_failures,
            circuit_state: breaker.state,
            circuit_trips: breaker.trips,
            total_dispatches: self.shared.total_dispatches.load(Ordering::Relaxed),
            min_request_interval: self.shared.min_request_interval,
        }
    }
}

/// Marks the governor idle if the worker unwinds without doing so itself
struct WorkerGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let drained: Vec<QueuedRequest> = {
                let mut state = self.shared.state.lock();
                state.is_dispatching = false;
                state.queue.drain(..).collect()
            };
            for request in drained {
                request.resolve(Err(ApodError::internal("dispatch worker stopped")));
            }
        }
    }
}

impl Shared {
    async fn run(self: Arc<Self>) {
        let mut guard = WorkerGuard {
            shared: &self,
            armed: true,
        };

        loop {
            let wait = {
                let mut state = self.state.lock();
                if state.queue.is_empty() {
                    state.is_dispatching = false;
                    guard.armed = false;
                    debug!("Dispatch queue drained, worker idle");
                    return;
                }
                state.last_dispatch_at.map_or(Duration::ZERO, |last| {
                    self.min_request_interval.saturating_sub(last.elapsed())
                })
            };

            if !wait.is_zero() {
                debug!(wait_ms = wait.as_millis() as u64, "Waiting before next dispatch");
                tokio::time::sleep(wait).await;
            }

            let request = {
                let mut state = self.state.lock();
                let request = state.queue.pop_front();
                if request.is_some() {
                    state.last_dispatch_at = Some(Instant::now());
                }
                request
            };

            let Some(request) = request else { continue };

            if let Flow::Stop = self.dispatch(request).await {
                guard.armed = false;
                return;
            }
        }
    }

    async fn dispatch(&self, request: QueuedRequest) -> Flow {
        let timeout = self.timeouts.timeout_for(&request.params);
        let span = info_span!(
            "upstream_dispatch",
            upstream = self.upstream.id(),
            params = %request.params,
            retry = request.retry_count,
            timeout_ms = timeout.as_millis() as u64,
        );

        let outcome = async {
            debug!("Dispatching upstream request");
            tokio::time::timeout(timeout, self.upstream.call(&request.params, timeout))
                .await
                .unwrap_or_else(|_| Err(ApodError::timeout(timeout)))
        }
        .instrument(span)
        .await;

        self.total_dispatches.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Ok(payload) => {
                self.breaker.record_success();
                debug!(params = %request.params, "Upstream request succeeded");
                request.resolve(Ok(payload));
                Flow::Continue
            }
            Err(error) => self.handle_failure(request, error).await,
        }
    }

    async fn handle_failure(&self, request: QueuedRequest, error: ApodError) -> Flow {
        warn!(
            params = %request.params,
            error = %error,
            error_type = error.error_type(),
            "Upstream request failed"
        );

        if self.breaker.record_failure() {
            let drained: Vec<QueuedRequest> = {
                let mut state = self.state.lock();
                state.is_dispatching = false;
                state.queue.drain(..).collect()
            };
            warn!(
                rejected = drained.len() + 1,
                "Too many consecutive failures, rejecting queued requests"
            );

            request.resolve(Err(ApodError::ServiceUnavailable));
            for queued in drained {
                queued.resolve(Err(ApodError::ServiceUnavailable));
            }
            return Flow::Stop;
        }

        match self.retry.backoff_for(&error, request.retry_count) {
            Some(backoff) => {
                let max_retries = self.retry.config().max_retries;
                info!(
                    params = %request.params,
                    retry = request.retry_count + 1,
                    max_retries = max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying after backoff"
                );
                tokio::time::sleep(backoff).await;

                self.state.lock().queue.push_front(QueuedRequest {
                    retry_count: request.retry_count + 1,
                    ..request
                });
            }
            None => request.resolve(Err(error)),
        }

        Flow::Continue
    }
}
