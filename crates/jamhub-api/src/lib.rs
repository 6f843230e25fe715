//! # jamhub-api
//!
//! HTTP API layer for JamHub built on Axum.
//!
//! Serves the `/ws` upgrade that carries the jam protocol, health checks,
//! and read-only jam discovery endpoints, with CORS and request tracing.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
