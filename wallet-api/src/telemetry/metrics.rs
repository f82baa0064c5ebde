//! Prometheus Metrics Definitions
//!
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, Encoder,
    HistogramVec, IntCounter, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once on first use
pub static METRICS: Lazy<ApiResult<WalletMetrics>> = Lazy::new(WalletMetrics::new);

/// Why an identifier rotation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationTrigger {
    /// Settlement counter reached the cap
    Cap,
    /// Operator forced a rotation
    Manual,
    /// The active identifier was removed
    Retire,
}

impl RotationTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationTrigger::Cap => "cap",
            RotationTrigger::Manual => "manual",
            RotationTrigger::Retire => "retire",
        }
    }
}

/// Container for all wallet metrics.
#[derive(Clone)]
pub struct WalletMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Identifier rotations - labels: trigger
    pub identifier_rotations_total: CounterVec,

    /// Settlement bookkeeping that failed after the ledger credit committed
    /// - labels: reason
    pub settlement_bookkeeping_failures_total: CounterVec,

    /// Approved transactions - labels: kind
    pub ledger_settlements_total: CounterVec,

    /// Investment payouts made by daily growth runs
    pub growth_payouts_total: IntCounter,
}

fn registration_failed(name: &'static str) -> impl Fn(prometheus::Error) -> ApiError {
    move |e| ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

impl WalletMetrics {
    /// Register every metric with the default Prometheus registry.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "wallet_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(registration_failed("http_requests_total"))?,

            http_request_duration_seconds: register_histogram_vec!(
                "wallet_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(registration_failed("http_request_duration_seconds"))?,

            identifier_rotations_total: register_counter_vec!(
                "wallet_identifier_rotations_total",
                "Payment identifier rotations",
                &["trigger"]
            )
            .map_err(registration_failed("identifier_rotations_total"))?,

            settlement_bookkeeping_failures_total: register_counter_vec!(
                "wallet_settlement_bookkeeping_failures_total",
                "Identifier bookkeeping failures after a committed recharge credit",
                &["reason"]
            )
            .map_err(registration_failed("settlement_bookkeeping_failures_total"))?,

            ledger_settlements_total: register_counter_vec!(
                "wallet_ledger_settlements_total",
                "Transactions approved by an admin",
                &["kind"]
            )
            .map_err(registration_failed("ledger_settlements_total"))?,

            growth_payouts_total: register_int_counter!(
                "wallet_growth_payouts_total",
                "Investment profit payouts made by daily growth"
            )
            .map_err(registration_failed("growth_payouts_total"))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_rotation(&self, trigger: RotationTrigger) {
        self.identifier_rotations_total
            .with_label_values(&[trigger.as_str()])
            .inc();
    }

    pub fn record_bookkeeping_failure(&self, reason: &str) {
        self.settlement_bookkeeping_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_settlement(&self, kind: &str) {
        self.ledger_settlements_total.with_label_values(&[kind]).inc();
    }

    pub fn record_growth_payouts(&self, count: i64) {
        self.growth_payouts_total.inc_by(count.max(0) as u64);
    }
}

/// Run `f` against the global metrics; a registration failure is logged
/// once at startup and otherwise ignored.
pub fn with_metrics(f: impl FnOnce(&WalletMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
