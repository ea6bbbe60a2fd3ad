//! HTTP request handlers.

pub mod edge;
pub mod health;
pub mod transform;

pub use edge::edge_fallback;
pub use health::{HealthResponse, health_check};
pub use transform::{TransformOutcome, handle_transform, transform_fallback};
