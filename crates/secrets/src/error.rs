//! Secret retrieval errors.

use thiserror::Error;

/// Secret store errors.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret not found: {0}")]
    NotFound(String),

    #[error("secret has no string value: {0}")]
    Empty(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secrets manager error: {0}")]
    Aws(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for secret operations.
pub type SecretResult<T> = std::result::Result<T, SecretError>;
