//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Pipeline (submissions, edits, publishes)
//! - Edit queue depth
//! - External services (staging, publishing)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Items submitted total.
pub static ITEMS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("cliprelay_items_submitted_total", "Total items submitted").unwrap()
});

/// Edits total by result.
pub static EDITS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cliprelay_edits_total", "Total edit jobs"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Edit duration in seconds.
pub static EDIT_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("cliprelay_edit_duration_seconds", "Duration of edit jobs")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
    )
    .unwrap()
});

/// Current edit queue depth (queued plus running).
pub static EDIT_QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("cliprelay_edit_queue_depth", "Current edit queue depth").unwrap()
});

/// Publish trigger firings by outcome.
pub static PUBLISH_TICKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cliprelay_publish_ticks_total",
            "Total publish trigger firings",
        ),
        &["outcome"], // "published", "nothing_eligible", "in_flight", "failed"
    )
    .unwrap()
});

/// Publish duration in seconds.
pub static PUBLISH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "cliprelay_publish_duration_seconds",
            "Duration of publish operations",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
    )
    .unwrap()
});

/// Items that reached the uploaded state.
pub static ITEMS_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cliprelay_items_uploaded_total",
        "Total items published successfully",
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cliprelay_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ITEMS_SUBMITTED.clone()),
        Box::new(EDITS_TOTAL.clone()),
        Box::new(EDIT_DURATION.clone()),
        Box::new(EDIT_QUEUE_DEPTH.clone()),
        Box::new(PUBLISH_TICKS.clone()),
        Box::new(PUBLISH_DURATION.clone()),
        Box::new(ITEMS_UPLOADED.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}
