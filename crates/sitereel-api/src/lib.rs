//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video job submission (sync and async modes)
//! - Job status lookup, with optional bounded waiting
//! - Artifact streaming
//! - Health endpoint and CORS

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
