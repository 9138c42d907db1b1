//! # Gateway Core
//!
//! Core types, traits, and error handling for the APOD gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - Lookup parameters and the cache keys derived from them
//! - APOD records and the response envelopes returned to callers
//! - The [`UpstreamClient`] trait implemented by the NASA client
//! - The classified error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod types;
pub mod upstream;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export commonly used types
pub use error::{ApodError, ApodResult};
pub use types::{
    apod_epoch, Apod, ApodRangeResponse, ApodResponse, LookupParams, UpstreamPayload,
};
pub use upstream::UpstreamClient;
