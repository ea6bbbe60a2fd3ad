//! Local edge emulation.
//!
//! Plays the CDN's part: rewrite the request to its canonical key, serve the
//! variant from the cache store on a hit, and on a failover status forward the
//! same rewritten request once to the transform handler with the credential
//! attached.

use super::transform::handle_transform;
use crate::metrics::record_edge;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use cachecow_core::{CacheKey, NO_STORE_CACHE_CONTROL, RewrittenUri, rewrite_uri};
use cachecow_storage::StoredObject;

/// Fallback route used when the server runs in the edge role.
pub async fn edge_fallback(State(state): State<AppState>, req: Request) -> Response {
    let (parts, _body) = req.into_parts();
    let rewritten = rewrite_uri(parts.uri.path(), parts.uri.query());

    tracing::debug!(
        path = %parts.uri.path(),
        rewritten = %rewritten.as_uri(),
        "Edge request rewritten"
    );

    let readable = parts.method == Method::GET || parts.method == Method::HEAD;

    // The transform handler owns method rejection, so other methods skip the
    // lookup and always fall back.
    let forward = if readable {
        match lookup(&state, &rewritten).await {
            Ok(object) => {
                record_edge("hit");
                return serve(object, parts.method == Method::HEAD);
            }
            Err(status) if state.config.edge.fails_over(status.as_u16()) => Ok(()),
            Err(status) => Err(status),
        }
    } else {
        Ok(())
    };

    if let Err(status) = forward {
        record_edge("passthrough");
        return (status, [(CACHE_CONTROL, NO_STORE_CACHE_CONTROL)]).into_response();
    }

    record_edge("fallback");
    let headers = forward_headers(&state, &parts.headers).await;
    handle_transform(&state, &parts.method, rewritten.as_uri(), &headers).await
}

/// Read the variant for a rewritten request, mapping failures to the status the
/// origin would have answered with.
async fn lookup(state: &AppState, rewritten: &RewrittenUri) -> Result<StoredObject, StatusCode> {
    let key = CacheKey::from_canonical_path(rewritten.as_uri()).map_err(|_| StatusCode::NOT_FOUND)?;
    let storage_key = key.storage_key();

    match state.cache.get_object(&storage_key).await {
        Ok(object) => Ok(object),
        Err(e) if e.is_not_found() => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::warn!(key = %storage_key, error = %e, "Cache store read failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn serve(object: StoredObject, head_only: bool) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(object.data.len() as u64));
    if let Some(content_type) = object
        .meta
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(CONTENT_TYPE, content_type);
    }
    if let Some(cache_control) = object
        .meta
        .cache_control
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(CACHE_CONTROL, cache_control);
    }

    let body = if head_only {
        Body::empty()
    } else {
        Body::from(object.data)
    };
    (StatusCode::OK, headers, body).into_response()
}

/// Client headers plus the credential the transform handler expects.
async fn forward_headers(state: &AppState, client: &HeaderMap) -> HeaderMap {
    let mut headers = client.clone();
    let Ok(name) = HeaderName::from_bytes(state.config.server.secret_header.as_bytes()) else {
        return headers;
    };
    headers.remove(&name);

    match state.verifier.credential().await {
        Some(credential) => match HeaderValue::from_str(&credential) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => tracing::warn!(error = %e, "Credential is not a valid header value"),
        },
        None => tracing::warn!("No credential available, forwarding without it"),
    }
    headers
}
