use std::time::Instant;

use axum::{
    body::Body, extract::State, http::Request, middleware::Next, response::Response,
};

use crate::{app::AppState, domain::RequestLog};

/// Saves one access log line per request. A failed write is logged and the
/// response goes out regardless.
pub async fn record_request(
    State(app): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), |pq| pq.to_string());
    let started = Instant::now();

    let response = next.run(req).await;

    let entry = RequestLog {
        method,
        path,
        status: response.status().as_u16(),
        latency: started.elapsed(),
    };
    tracing::debug!(
        method = %entry.method,
        path = %entry.path,
        status = entry.status,
        latency_ms = entry.latency.as_millis() as u64,
        "request served"
    );
    if let Err(e) = app.request_logs.record(&entry).await {
        tracing::error!(error = %e, "failed to save request log");
    }

    response
}
