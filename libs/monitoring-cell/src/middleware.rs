use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::services::RequestTracker;

/// Records latency and error status (>= 400) of every request for the API
/// metrics.
pub async fn track_requests(
    State(tracker): State<Arc<RequestTracker>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status();
    tracker.record(elapsed_ms, status.as_u16() >= 400);
    debug!("{} {} -> {} in {}ms", method, path, status.as_u16(), elapsed_ms);

    response
}
