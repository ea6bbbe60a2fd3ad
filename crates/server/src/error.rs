//! API error types.

use axum::Json;
use axum::http::header::{ALLOW, CACHE_CONTROL};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use cachecow_core::NO_STORE_CACHE_CONTROL;
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Terminal outcomes of a failed request.
///
/// Every variant renders with a non-cacheable directive so that a transient
/// failure is never pinned at the CDN.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("original not found: {0}")]
    OriginNotFound(String),

    #[error("transform failed: {0}")]
    TransformFailed(String),

    #[error("variant write failed: {0}")]
    StoreWriteFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::Forbidden(_) => "forbidden",
            Self::OriginNotFound(_) => "origin_not_found",
            Self::TransformFailed(_) => "transform_failed",
            Self::StoreWriteFailed(_) => "store_write_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::OriginNotFound(_) => StatusCode::NOT_FOUND,
            Self::TransformFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StoreWriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static(NO_STORE_CACHE_CONTROL),
        );
        if matches!(self, Self::MethodNotAllowed(_)) {
            headers.insert(ALLOW, HeaderValue::from_static("GET"));
        }
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
