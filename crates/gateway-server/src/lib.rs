//! # Gateway Server
//!
//! HTTP server for the APOD gateway.
//!
//! This crate provides:
//! - Axum router exposing APOD lookups and cache administration
//! - Date parameter validation
//! - Prometheus metrics endpoint
//! - CORS, hardening headers, inbound rate limit and request tracing middleware
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod handlers;
pub mod routes;
pub mod security;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod validation;

// Re-export main types
pub use error::ApiError;
pub use routes::create_router;
pub use security::{RateLimitLayer, SecurityHeadersLayer};
pub use server::{Server, ServerConfig};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
