//! Prometheus metrics endpoint
//!
//! Exposes metrics in Prometheus text format for scraping.

use axum::{extract::State, http::StatusCode};

use crate::handlers::AppState;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if encoding fails
///
/// # Example
///
/// ```bash
/// curl http://localhost:8888/metrics
/// # HELP keyrelay_proxy_requests_total Total number of proxy requests by proxy and outcome
/// # TYPE keyrelay_proxy_requests_total counter
/// keyrelay_proxy_requests_total{outcome="success",proxy="chat"} 42
/// ```
pub async fn handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics().gather() {
        Ok(output) => (StatusCode::OK, output),
        Err(e) => {
            tracing::error!(error = %e, "Failed to gather metrics for Prometheus scraping");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {}", e),
            )
        }
    }
}
