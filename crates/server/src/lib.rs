//! HTTP service for CacheCow.
//!
//! This crate provides:
//! - The transform-on-miss handler the CDN falls back to
//! - A local edge emulation for development and end-to-end tests
//! - Health and Prometheus endpoints under `/_cachecow`

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod trace;
pub mod verifier;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use trace::TraceId;
pub use verifier::TokenVerifier;
