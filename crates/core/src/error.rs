//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid asset path: {0}")]
    InvalidAssetPath(String),

    #[error("invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
