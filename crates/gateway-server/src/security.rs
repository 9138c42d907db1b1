//! Response hardening headers and the inbound request limit.

use axum::{
    http::{header, HeaderName, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::Instant;
use tower::{Layer, Service};
use tracing::warn;

use crate::error::ApiError;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self';base-uri 'self';\
font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';\
img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';\
style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests";

const HSTS: &str = "max-age=15552000; includeSubDomains";

/// Message returned once the inbound limit is exhausted
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Adds the hardening header set to every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeadersLayer;

impl SecurityHeadersLayer {
    /// Create a security headers layer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders { inner }
    }
}

/// Security headers service.
#[derive(Debug, Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for SecurityHeaders<S>
where
    S: Service<Request<ReqBody>, Response = axum::http::Response<ResBody>>,
    S::Future: Send + 'static,
{
    type Response = axum::http::Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let future = self.inner.call(request);

        Box::pin(async move {
            let mut response = future.await?;
            apply_security_headers(response.headers_mut());
            Ok(response)
        })
    }
}

/// Apply the hardening headers to a header map.
pub fn apply_security_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static(HSTS),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    // Disables legacy XSS auditors
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(
        header::X_DNS_PREFETCH_CONTROL,
        HeaderValue::from_static("off"),
    );

    for (name, value) in [
        ("x-download-options", "noopen"),
        ("x-permitted-cross-domain-policies", "none"),
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-resource-policy", "same-origin"),
        ("origin-agent-cluster", "?1"),
    ] {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    headers.remove(header::SERVER);
    headers.remove("x-powered-by");
}

/// Fixed-window request counter shared by every clone of a [`RateLimitLayer`].
#[derive(Debug)]
struct FixedWindow {
    max_requests: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    started: Instant,
    hits: u32,
}

impl FixedWindow {
    /// Count one request; `Some(remaining)` when it is admitted.
    fn hit(&self) -> Option<u32> {
        let now = Instant::now();
        let mut state = self.state.lock();

        if now.duration_since(state.started) >= self.window {
            state.started = now;
            state.hits = 0;
        }

        state.hits = state.hits.saturating_add(1);
        if state.hits > self.max_requests {
            None
        } else {
            Some(self.max_requests - state.hits)
        }
    }
}

/// Per-process inbound limit: at most `max_requests` per `window`.
///
/// Clones share one counter, so the limit covers the whole router.
#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    window: Arc<FixedWindow>,
}

impl RateLimitLayer {
    /// Admit `max_requests` per `window`.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            window: Arc::new(FixedWindow {
                max_requests,
                window,
                state: Mutex::new(WindowState {
                    started: Instant::now(),
                    hits: 0,
                }),
            }),
        }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimit<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimit {
            inner,
            window: Arc::clone(&self.window),
        }
    }
}

/// Inbound rate limit service.
#[derive(Debug, Clone)]
pub struct RateLimit<S> {
    inner: S,
    window: Arc<FixedWindow>,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimit<S>
where
    S: Service<Request<ReqBody>, Response = Response>,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        let limit = self.window.max_requests;

        let Some(remaining) = self.window.hit() else {
            warn!(
                path = %request.uri().path(),
                limit,
                "Inbound rate limit exceeded"
            );
            let mut response = ApiError::too_many_requests(RATE_LIMIT_MESSAGE).into_response();
            apply_limit_headers(response.headers_mut(), limit, 0);
            return Box::pin(async move { Ok(response) });
        };

        let future = self.inner.call(request);
        Box::pin(async move {
            let mut response = future.await?;
            apply_limit_headers(response.headers_mut(), limit, remaining);
            Ok(response)
        })
    }
}

fn apply_limit_headers(headers: &mut axum::http::HeaderMap, limit: u32, remaining: u32) {
    headers.insert(HeaderName::from_static("x-ratelimit-limit"), HeaderValue::from(limit));
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(remaining),
    );
}
