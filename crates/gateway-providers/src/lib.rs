//! # Gateway Providers
//!
//! Upstream client implementations for the APOD gateway.
//!
//! Currently a single provider: the NASA Astronomy Picture of the Day API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod nasa;

// Re-export main types
pub use nasa::{classify_status, NasaClient, NasaConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
