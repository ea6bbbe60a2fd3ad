//! Imaging error types.

use thiserror::Error;

/// Errors from decoding, resizing or encoding an image.
#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to decode source image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Result type for imaging operations.
pub type ImagingResult<T> = std::result::Result<T, ImagingError>;
