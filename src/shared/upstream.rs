//! Outbound provider calls
//!
//! One call, one decode, no retries. The provider's status code is logged and
//! counted but never changes what is returned to the caller.

use super::Proxy;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use serde_json::Value;
use std::time::Instant;

/// Build the shared HTTP client for provider calls
///
/// Applies `server.upstream_timeout_seconds` when configured; otherwise no
/// client-side timeout is set.
pub fn build_client(config: &Config) -> AppResult<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("keyrelay/", env!("CARGO_PKG_VERSION")));

    if let Some(timeout) = config.upstream_timeout() {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

/// Send a prepared provider request and decode its body as JSON
///
/// Records latency regardless of the result. A non-2xx provider status is
/// logged at warn and still decoded and returned.
pub async fn send_json(
    proxy: Proxy,
    request: reqwest::RequestBuilder,
    metrics: &Metrics,
) -> AppResult<Value> {
    let start = Instant::now();
    let result = send_and_decode(proxy, request, metrics).await;
    let elapsed = start.elapsed().as_secs_f64();

    if let Err(e) = metrics.record_upstream_duration(proxy, elapsed) {
        tracing::warn!(proxy = %proxy, error = %e, "Failed to record upstream duration");
    }

    result
}

async fn send_and_decode(
    proxy: Proxy,
    request: reqwest::RequestBuilder,
    metrics: &Metrics,
) -> AppResult<Value> {
    let response = request.send().await.map_err(|source| AppError::Upstream {
        provider: proxy.as_str(),
        source,
    })?;

    let status = response.status();
    if status.is_success() {
        tracing::debug!(proxy = %proxy, status = %status, "Provider responded");
    } else {
        tracing::warn!(
            proxy = %proxy,
            status = %status,
            "Provider returned non-success status, passing body through"
        );
        metrics.record_upstream_non_success(proxy, status.as_u16());
    }

    response
        .json::<Value>()
        .await
        .map_err(|source| AppError::UpstreamDecode {
            provider: proxy.as_str(),
            source,
        })
}
