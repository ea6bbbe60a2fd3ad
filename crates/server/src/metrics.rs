//! Prometheus metrics for the CacheCow server.
//!
//! The `/_cachecow/metrics` endpoint is unauthenticated so Prometheus can scrape
//! it. Labels never carry asset paths, only bounded outcome names. Keep the
//! endpoint off public networks all the same.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static TRANSFORM_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cachecow_transform_requests_total",
            "Transform requests by terminal outcome",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static TRANSFORM_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "cachecow_transform_duration_seconds",
            "Time from request receipt to terminal transform response",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0]),
    )
    .expect("metric creation failed")
});

pub static VARIANT_BYTES_WRITTEN: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cachecow_variant_bytes_written_total",
        "Total bytes of transformed variants written to the cache store",
    )
    .expect("metric creation failed")
});

pub static EDGE_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cachecow_edge_requests_total",
            "Edge requests by result (hit, fallback or passthrough)",
        ),
        &["result"],
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// Idempotent, so tests building several routers can call it freely.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(TRANSFORM_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(TRANSFORM_DURATION.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(VARIANT_BYTES_WRITTEN.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(EDGE_REQUESTS.clone()))
            .expect("metric registration failed");
    });
}

/// GET /_cachecow/metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record a terminal transform outcome.
pub fn record_transform(outcome: &str) {
    TRANSFORM_REQUESTS.with_label_values(&[outcome]).inc();
}

/// Record how an edge request was served.
pub fn record_edge(result: &str) {
    EDGE_REQUESTS.with_label_values(&[result]).inc();
}
