//! # Gateway Resilience
//!
//! Everything that stands between a lookup and the upstream:
//! - Response cache with TTL and insertion-order eviction
//! - Request governor serializing and spacing upstream calls
//! - Retry policy with linear backoff
//! - Consecutive-failure circuit breaker
//! - Adaptive timeouts for range lookups

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod circuit_breaker;
pub mod governor;
pub mod retry;
pub mod timeout;

// Re-export main types
pub use cache::{CacheConfig, CacheReconfigure, CacheSettings, CacheStats, ResponseCache};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState};
pub use governor::{GovernorConfig, GovernorStats, RequestGovernor};
pub use retry::{RetryConfig, RetryPolicy};
pub use timeout::{TimeoutConfig, TimeoutManager};
