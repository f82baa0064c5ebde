//! Request span and HTTP metrics for every call

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{info_span, Instrument};

use super::metrics::with_metrics;

/// UUID or all-digit path segment.
static ID_SEGMENT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"/(?:[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}|\d+)(/|$)")
        .ok()
});

/// Route label with ids replaced by `{id}`, so identifier and transaction
/// ids do not explode label cardinality.
fn route_label(path: &str) -> String {
    match ID_SEGMENT.as_ref() {
        // Twice: adjacent ids share the separating slash.
        Some(pattern) => {
            let once = pattern.replace_all(path, "/{id}$1");
            pattern.replace_all(&once, "/{id}$1").into_owned()
        }
        None => path.to_string(),
    }
}

pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&path);

    let span = info_span!("http_request", http.method = %method, http.route = %route);
    let response = next.run(request).instrument(span).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    with_metrics(|m| m.record_http_request(method.as_str(), &route, status, elapsed.as_secs_f64()));

    let elapsed_ms = elapsed.as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%method, %path, status, elapsed_ms, "Request failed");
    } else {
        tracing::info!(%method, %path, status, elapsed_ms, "Request completed");
    }
    response
}
