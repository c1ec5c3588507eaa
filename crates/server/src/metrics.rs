//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ClipRelay server:
//! - HTTP request metrics (latency, counts, errors)
//! - Item counts by state (collected dynamically)
//! - Core pipeline metrics (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use cliprelay_core::item::{ItemFilter, ItemState};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cliprelay_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cliprelay_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cliprelay_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Item Metrics (collected dynamically)
// =============================================================================

/// Items by current state (collected dynamically).
pub static ITEMS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("cliprelay_items_by_state", "Current item count by state"),
        &["state"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Items
    registry.register(Box::new(ITEMS_BY_STATE.clone())).unwrap();

    // Core metrics (pipeline, edit queue, external services)
    for metric in cliprelay_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding metrics so the per-state gauges reflect the
/// store at scrape time.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    for item_state in [
        ItemState::Pending,
        ItemState::Editing,
        ItemState::Edited,
        ItemState::ProcessingPublish,
        ItemState::Uploaded,
        ItemState::Failed,
    ] {
        let filter = ItemFilter::new().with_state(item_state);
        if let Ok(count) = state.store().count(&filter) {
            ITEMS_BY_STATE
                .with_label_values(&[item_state.as_str()])
                .set(count);
        }
    }
}

/// Normalize a path for metric labels (replace item ids with a
/// placeholder so label cardinality stays bounded).
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| if looks_like_id(segment) { "{id}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}

fn looks_like_id(segment: &str) -> bool {
    // UUID form: 8-4-4-4-12 hex groups.
    segment.len() == 36
        && segment
            .chars()
            .enumerate()
            .all(|(i, c)| match i {
                8 | 13 | 18 | 23 => c == '-',
                _ => c.is_ascii_hexdigit(),
            })
}
