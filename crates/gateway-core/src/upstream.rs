//! Upstream client abstraction.

use crate::error::ApodError;
use crate::types::{LookupParams, UpstreamPayload};
use async_trait::async_trait;
use std::time::Duration;

/// A client that performs exactly one outbound call per invocation.
///
/// Implementations must classify every failure into an [`ApodError`]
/// variant. Retrying, spacing and circuit breaking are the caller's job.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Identifier used in logs
    fn id(&self) -> &str;

    /// Perform one call bounded by `timeout`
    async fn call(
        &self,
        params: &LookupParams,
        timeout: Duration,
    ) -> Result<UpstreamPayload, ApodError>;
}
