//! Prometheus metrics for parrot-proxy.
//!
//! Tracks proxied traffic, filter short-circuits, verifications and the size
//! of the request log.
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, register_int_gauge, Counter,
    CounterVec, Encoder, HistogramVec, IntGauge, TextEncoder,
};
use tracing::warn;

lazy_static! {
    /// Total number of proxied requests, by final status returned to the caller
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "parrot_requests_total",
        "Total number of requests processed by the proxy",
        &["method", "status"]
    )
    .unwrap();

    /// Requests dropped by a request filter
    pub static ref FILTER_SHORT_CIRCUITS_TOTAL: Counter = register_counter!(
        "parrot_filter_short_circuits_total",
        "Total number of requests a request filter stopped before forwarding"
    )
    .unwrap();

    /// Verification outcomes
    pub static ref VERIFICATIONS_TOTAL: CounterVec = register_counter_vec!(
        "parrot_verifications_total",
        "Total number of verifications run against the request log",
        &["kind", "result"]  // kind: count|sequence, result: pass|fail
    )
    .unwrap();

    /// Upstream request duration
    pub static ref UPSTREAM_REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "parrot_upstream_request_duration_ms",
        "Duration of upstream requests in milliseconds",
        &["method", "status"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .unwrap();

    /// Entries currently held in the request log
    pub static ref LOG_ENTRIES: IntGauge = register_int_gauge!(
        "parrot_log_entries",
        "Number of request/response pairs in the request log"
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_request(method: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
}

pub fn record_short_circuit() {
    FILTER_SHORT_CIRCUITS_TOTAL.inc();
}

/// `kind` is `count` or `sequence`.
pub fn record_verification(kind: &str, passed: bool) {
    let result = if passed { "pass" } else { "fail" };
    VERIFICATIONS_TOTAL.with_label_values(&[kind, result]).inc();
}

pub fn record_upstream_duration(method: &str, status: u16, duration_ms: f64) {
    UPSTREAM_REQUEST_DURATION_MS
        .with_label_values(&[method, &status.to_string()])
        .observe(duration_ms);
}

pub fn set_log_entries(count: usize) {
    LOG_ENTRIES.set(count as i64);
}
