//! Prometheus metrics for observability.
//!
//! - HTTP request metrics (latency, counts, in flight)
//! - Torznab authentication failures
//! - Search cache lookups and backend queries issued
//! - Add outcomes per submitted link

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;

use mulearr_core::{AddOutcome, SearchOutcome};

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
            "mulearr_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mulearr_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mulearr_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures on the indexer endpoint.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mulearr_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Search cache lookups by result (hit, miss).
pub static SEARCH_CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "mulearr_search_cache_lookups_total",
            "Search requests by cache result",
        ),
        &["result"],
    )
    .unwrap()
});

/// Plain-text queries sent to the backend.
pub static BACKEND_SEARCH_QUERIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mulearr_backend_search_queries_total",
        "Search queries issued to the backend",
    )
    .unwrap()
});

/// Searches that failed and were answered with an empty feed.
pub static SEARCH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mulearr_search_failures_total",
        "Searches answered with an empty feed after a failure",
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Links submitted through torrents/add, by outcome.
pub static ADD_ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mulearr_add_items_total", "Links submitted for download"),
        &["outcome"],
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
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Search
    registry
        .register(Box::new(SEARCH_CACHE_LOOKUPS.clone()))
        .unwrap();
    registry
        .register(Box::new(BACKEND_SEARCH_QUERIES.clone()))
        .unwrap();
    registry
        .register(Box::new(SEARCH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Downloads
    registry
        .register(Box::new(ADD_ITEMS_TOTAL.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

pub fn record_search(outcome: &SearchOutcome) {
    let result = if outcome.cache_hit { "hit" } else { "miss" };
    SEARCH_CACHE_LOOKUPS.with_label_values(&[result]).inc();
    BACKEND_SEARCH_QUERIES.inc_by(outcome.queries_issued as u64);
}

pub fn record_add(outcome: &AddOutcome) {
    ADD_ITEMS_TOTAL
        .with_label_values(&["ok"])
        .inc_by(outcome.succeeded() as u64);
    ADD_ITEMS_TOTAL
        .with_label_values(&["failed"])
        .inc_by(outcome.failed() as u64);
}

static HASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]{32,40}").unwrap());
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace hashes and ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = HASH_RE.replace_all(path, "{hash}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}
