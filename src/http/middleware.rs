use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::Instrument;

use crate::logging::request_span;
use crate::metrics::METRICS;

const UNMATCHED_ROUTE: &str = "unmatched";

/// Per-request span plus request count and latency by route template.
pub async fn track_requests(request: Request, next: Next) -> Response {
    // Templates keep label cardinality bounded.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    let span = request_span(request.method().as_str(), &route);
    let started = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;

    let status = response.status().as_u16();
    span.record("http.status", status);
    METRICS.record_http_request(&route, status, started.elapsed());
    tracing::debug!(
        parent: &span,
        status,
        latency_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}
