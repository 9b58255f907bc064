//! Prometheus metrics for the gridkeep server.
//!
//! Counts certificate and assignment changes made through the admin API.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no identifiers (no LFDIs, aggregator or certificate ids),
//! only aggregate counts. Restrict the endpoint to the scraper's network
//! at the infrastructure level all the same.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{self, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static CERTIFICATES_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gridkeep_certificates_created_total",
        "Total number of certificates created, directly or by batch assignment",
    )
    .expect("metric creation failed")
});

pub static ASSIGNMENTS_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gridkeep_assignments_created_total",
        "Total number of aggregator certificate assignments created",
    )
    .expect("metric creation failed")
});

pub static ASSIGNMENTS_REMOVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gridkeep_assignments_removed_total",
        "Total number of aggregator certificate assignments removed",
    )
    .expect("metric creation failed")
});

pub static ASSIGNMENT_BATCHES_REJECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gridkeep_assignment_batches_rejected_total",
            "Total assignment batches rolled back, by error kind",
        ),
        &["error_kind"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(CERTIFICATES_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ASSIGNMENTS_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ASSIGNMENTS_REMOVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ASSIGNMENT_BATCHES_REJECTED.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
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

/// Record an assignment batch that was rolled back.
pub fn record_batch_rejected(error_kind: &str) {
    ASSIGNMENT_BATCHES_REJECTED
        .with_label_values(&[error_kind])
        .inc();
}
