//! # Gateway Lookup
//!
//! The lookup service ties the response cache, the request governor and the
//! fallback provider together into the operations the HTTP layer exposes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fallback;
pub mod lookup;

// Re-export main types
pub use fallback::{FallbackProvider, MAX_FALLBACK_DAYS};
pub use lookup::{LookupService, MAX_CACHED_RANGE_LEN};
