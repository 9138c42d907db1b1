//! Error taxonomy for the gateway.
//!
//! Every upstream failure is classified into one of a fixed set of variants
//! before it leaves the upstream client. The governor, the lookup service and
//! the HTTP layer all branch on the variant, never on message text.

use std::time::Duration;
use thiserror::Error;

/// Result type for gateway operations
pub type ApodResult<T> = Result<T, ApodError>;

/// Classified gateway error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApodError {
    /// Upstream rejected the request parameters (HTTP 400)
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Message reported by the upstream
        message: String,
    },

    /// Upstream rejected the API key (HTTP 403)
    #[error("Invalid API key or access denied")]
    AccessDenied,

    /// Upstream rate limit hit (HTTP 429)
    #[error("NASA API rate limit exceeded. Please wait a few seconds.")]
    RateLimited,

    /// The outbound call did not complete within its timeout
    #[error("Request timeout. Please try again.")]
    Timeout {
        /// Timeout that was applied to the call
        timeout: Duration,
    },

    /// No response was received from the upstream
    #[error("Network error. Please check your connection.")]
    NetworkUnavailable {
        /// Transport-level detail
        message: String,
    },

    /// Any other non-success outcome
    #[error("{message}")]
    UnknownUpstreamFailure {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Failure description
        message: String,
    },

    /// Circuit breaker tripped; queued work was rejected
    #[error("Service temporarily unavailable. Please try again.")]
    ServiceUnavailable,

    /// Runtime reconfiguration arguments out of bounds
    #[error("{message}")]
    ConfigValidation {
        /// Offending field
        field: String,
        /// Human readable reason
        message: String,
    },

    /// Startup configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Internal invariant broken
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

impl ApodError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            message: message.into(),
        }
    }

    /// Create an unknown upstream failure
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UnknownUpstreamFailure {
            status,
            message: message.into(),
        }
    }

    /// Create a reconfiguration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a startup configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the governor may retry a dispatch that failed with this error.
    ///
    /// Rate limits and timeouts are transient. An unknown failure without an
    /// HTTP status means the transport broke after connecting, which is
    /// treated the same way.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited
                | Self::Timeout { .. }
                | Self::UnknownUpstreamFailure { status: None, .. }
        )
    }

    /// Whether a single-date lookup serves placeholder content for this error
    #[must_use]
    pub fn triggers_single_fallback(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkUnavailable { .. })
    }

    /// Whether a range lookup serves placeholder content for this error
    #[must_use]
    pub fn triggers_range_fallback(&self) -> bool {
        self.triggers_single_fallback() || matches!(self, Self::Timeout { .. })
    }

    /// HTTP status code used when the error reaches a client
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } | Self::ConfigValidation { .. } => 400,
            Self::AccessDenied => 403,
            Self::RateLimited => 429,
            Self::Timeout { .. } => 504,
            Self::NetworkUnavailable { .. } | Self::UnknownUpstreamFailure { .. } => 502,
            Self::ServiceUnavailable => 503,
            Self::Configuration { .. } | Self::Internal { .. } => 500,
        }
    }

    /// Stable tag for logs and JSON bodies
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::AccessDenied => "access_denied",
            Self::RateLimited => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::NetworkUnavailable { .. } => "network_unavailable",
            Self::UnknownUpstreamFailure { .. } => "upstream_failure",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ConfigValidation { .. } => "config_validation",
            Self::Configuration { .. } => "configuration",
            Self::Internal { .. } => "internal",
        }
    }
}
