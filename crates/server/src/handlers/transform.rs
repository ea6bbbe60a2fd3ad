//! Transform-on-miss handler.
//!
//! Invoked for `/{assetPath}/{canonicalOperationString}` after the edge failed to
//! serve the variant. Runs a linear pipeline with no retries:
//! method check, auth, fetch original, transform, write variant, redirect.

use crate::error::{ApiError, ApiResult};
use crate::metrics::{TRANSFORM_DURATION, VARIANT_BYTES_WRITTEN, record_transform};
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use cachecow_core::config::MissingOriginalPolicy;
use cachecow_core::{CacheKey, NO_STORE_CACHE_CONTROL, VARIANT_CACHE_CONTROL};
use cachecow_imaging::{TransformedImage, generate_placeholder};
use cachecow_storage::PutOptions;
use std::time::Instant as StdInstant;
use tokio::time::{Instant, timeout_at};

/// Terminal success of the pipeline.
#[derive(Debug)]
pub enum TransformOutcome {
    /// The variant was written; send the client back to the public URL.
    Redirect { location: String },
    /// The original is missing and the deployment serves a placeholder.
    Placeholder(TransformedImage),
}

impl TransformOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Redirect { .. } => "redirect",
            Self::Placeholder(_) => "placeholder",
        }
    }
}

impl IntoResponse for TransformOutcome {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect { location } => (
                StatusCode::FOUND,
                [
                    (LOCATION, location),
                    (CACHE_CONTROL, NO_STORE_CACHE_CONTROL.to_string()),
                ],
            )
                .into_response(),
            Self::Placeholder(image) => (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, image.content_type),
                    (CACHE_CONTROL, NO_STORE_CACHE_CONTROL),
                ],
                image.data,
            )
                .into_response(),
        }
    }
}

/// Fallback route used when the server runs in the transform role.
pub async fn transform_fallback(State(state): State<AppState>, req: Request) -> Response {
    let (parts, _body) = req.into_parts();
    handle_transform(&state, &parts.method, parts.uri.path(), &parts.headers).await
}

/// Run the pipeline for one request and render its terminal response.
///
/// Shared by the transform route and the edge emulation's fallback.
pub async fn handle_transform(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> Response {
    let started = StdInstant::now();
    let result = run_transform(state, method, path, headers).await;
    TRANSFORM_DURATION.observe(started.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => {
            record_transform(outcome.label());
            tracing::info!(
                path = %path,
                outcome = outcome.label(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Transform request completed"
            );
            outcome.into_response()
        }
        Err(error) => {
            record_transform(error.code());
            if error.status_code().is_server_error() {
                tracing::error!(path = %path, code = error.code(), error = %error, "Transform request failed");
            } else {
                tracing::info!(path = %path, code = error.code(), error = %error, "Transform request rejected");
            }
            error.into_response()
        }
    }
}

async fn run_transform(
    state: &AppState,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
) -> ApiResult<TransformOutcome> {
    let deadline = Instant::now() + state.config.transform.request_timeout();

    if method != Method::GET {
        return Err(ApiError::MethodNotAllowed(method.to_string()));
    }

    let presented = headers
        .get(state.config.server.secret_header.as_str())
        .and_then(|value| value.to_str().ok());
    let authorized = timeout_at(deadline, state.verifier.verify(presented))
        .await
        .unwrap_or(false);
    if !authorized {
        return Err(ApiError::Forbidden("missing or invalid credential".to_string()));
    }

    let key = CacheKey::from_canonical_path(path)
        .map_err(|e| ApiError::OriginNotFound(e.to_string()))?;

    let original = match timeout_at(deadline, state.source.get(key.asset().as_str())).await {
        Ok(Ok(data)) if data.is_empty() => {
            return Err(ApiError::OriginNotFound(format!(
                "original is empty: {}",
                key.asset()
            )));
        }
        Ok(Ok(data)) => data,
        Ok(Err(e))
            if e.is_not_found()
                && state.config.transform.missing_original == MissingOriginalPolicy::Placeholder =>
        {
            return placeholder(state);
        }
        Ok(Err(e)) => {
            return Err(ApiError::OriginNotFound(format!("{}: {e}", key.asset())));
        }
        Err(_) => {
            return Err(ApiError::OriginNotFound(format!(
                "timed out fetching original: {}",
                key.asset()
            )));
        }
    };

    let image = transform(state, deadline, original, &key).await?;
    let size = image.data.len() as u64;

    let storage_key = key.storage_key();
    let options = PutOptions::new(image.content_type, VARIANT_CACHE_CONTROL);
    match timeout_at(deadline, state.cache.put(&storage_key, image.data, &options)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(ApiError::StoreWriteFailed(format!("{storage_key}: {e}"))),
        Err(_) => {
            return Err(ApiError::StoreWriteFailed(format!(
                "timed out writing variant: {storage_key}"
            )));
        }
    }
    VARIANT_BYTES_WRITTEN.inc_by(size);

    tracing::debug!(key = %storage_key, size, "Variant written");

    Ok(TransformOutcome::Redirect {
        location: key.public_location(),
    })
}

async fn transform(
    state: &AppState,
    deadline: Instant,
    original: Bytes,
    key: &CacheKey,
) -> ApiResult<TransformedImage> {
    let transformer = state.transformer.clone();
    let operations = key.operations().clone();
    let task = tokio::task::spawn_blocking(move || transformer.transform(&original, &operations));

    match timeout_at(deadline, task).await {
        Ok(Ok(Ok(image))) => Ok(image),
        Ok(Ok(Err(e))) => Err(ApiError::TransformFailed(format!("{key}: {e}"))),
        Ok(Err(e)) => Err(ApiError::TransformFailed(format!("transform task failed: {e}"))),
        Err(_) => Err(ApiError::TransformFailed(format!("timed out transforming {key}"))),
    }
}

fn placeholder(state: &AppState) -> ApiResult<TransformOutcome> {
    let transform = &state.config.transform;
    generate_placeholder(
        &transform.placeholder,
        transform.output_format,
        transform.jpeg_quality,
    )
    .map(TransformOutcome::Placeholder)
    .map_err(|e| ApiError::TransformFailed(format!("placeholder: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_response() {
        let response = TransformOutcome::Redirect {
            location: "/a.jpg?width=50".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/a.jpg?width=50");
        assert_eq!(response.headers()[CACHE_CONTROL], NO_STORE_CACHE_CONTROL);
    }

    #[test]
    fn test_placeholder_response_is_not_cacheable() {
        let image = TransformedImage {
            data: Bytes::from_static(b"img"),
            content_type: "image/png",
            width: 1,
            height: 1,
        };
        let response = TransformOutcome::Placeholder(image).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[CACHE_CONTROL], NO_STORE_CACHE_CONTROL);
    }
}
