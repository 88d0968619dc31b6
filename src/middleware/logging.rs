//! Request logging middleware.
//!
//! One line per HTTP request with method, path, status, latency and, for
//! leaderboard routes, whether the body came from cache.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

use crate::api::X_CACHE;

/// Logs every request except `/health`. 5xx responses log at WARN.
pub async fn request_logging_simple(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    // Skip logging for health checks to reduce noise
    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let status = response.status().as_u16();
    let cache = response
        .headers()
        .get(&X_CACHE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    if status >= 500 {
        warn!(
            method = %method,
            path = %path,
            status,
            latency_ms,
            cache,
            "Request failed (5xx)"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            latency_ms,
            cache,
            "Request completed"
        );
    }

    response
}
