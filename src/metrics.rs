//! Prometheus metrics collection for keyrelay
//!
//! This module provides metrics instrumentation for tracking:
//! - Proxy requests by proxy and outcome
//! - Upstream provider latency
//! - Upstream responses with a non-success status (still passed through)
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::shared::Proxy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Terminal outcome of a proxy invocation
///
/// Restricting label values to a closed enum keeps cardinality bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// CORS preflight answered without touching the provider
    Preflight,
    /// Provider response passed through
    Success,
    /// Provider secret not provisioned
    ConfigurationError,
    /// Parse, client IP, network, or decode failure
    UpstreamError,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::Success => "success",
            Outcome::ConfigurationError => "configuration_error",
            Outcome::UpstreamError => "upstream_error",
        }
    }
}

/// Metrics collector for keyrelay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    proxy_requests: IntCounterVec,
    upstream_duration: HistogramVec,
    upstream_non_success: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 2 proxies × 4 outcomes = 8 time series
        let proxy_requests = IntCounterVec::new(
            Opts::new(
                "keyrelay_proxy_requests_total",
                "Total number of proxy requests by proxy and outcome",
            ),
            &["proxy", "outcome"],
        )?;

        let upstream_duration = HistogramVec::new(
            HistogramOpts::new(
                "keyrelay_upstream_duration_seconds",
                "Latency of outbound provider calls including body decoding",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["proxy"],
        )?;

        // Provider errors are passed through as 200; this counter makes them visible.
        let upstream_non_success = IntCounterVec::new(
            Opts::new(
                "keyrelay_upstream_non_success_total",
                "Provider responses with a non-2xx status that were passed through",
            ),
            &["proxy", "status"],
        )?;

        registry.register(Box::new(proxy_requests.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;
        registry.register(Box::new(upstream_non_success.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            proxy_requests,
            upstream_duration,
            upstream_non_success,
        })
    }

    /// Record the terminal outcome of a proxy invocation
    pub fn record_outcome(&self, proxy: Proxy, outcome: Outcome) {
        self.proxy_requests
            .with_label_values(&[proxy.as_str(), outcome.as_str()])
            .inc();
    }

    /// Number of invocations recorded for a proxy/outcome pair
    pub fn outcome_count(&self, proxy: Proxy, outcome: Outcome) -> u64 {
        self.proxy_requests
            .with_label_values(&[proxy.as_str(), outcome.as_str()])
            .get()
    }

    /// Record how long an outbound provider call took
    ///
    /// # Errors
    ///
    /// Rejects NaN and infinite values, which would corrupt histogram sums.
    pub fn record_upstream_duration(
        &self,
        proxy: Proxy,
        seconds: f64,
    ) -> Result<(), prometheus::Error> {
        if !seconds.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite, got: {}",
                seconds
            )));
        }

        self.upstream_duration
            .get_metric_with_label_values(&[proxy.as_str()])?
            .observe(seconds);
        Ok(())
    }

    /// Record a provider response whose status was not 2xx
    pub fn record_upstream_non_success(&self, proxy: Proxy, status: u16) {
        let status = status.to_string();
        self.upstream_non_success
            .with_label_values(&[proxy.as_str(), status.as_str()])
            .inc();
    }

    /// Number of passed-through non-2xx responses for a proxy/status pair
    pub fn upstream_non_success_count(&self, proxy: Proxy, status: u16) -> u64 {
        let status = status.to_string();
        self.upstream_non_success
            .with_label_values(&[proxy.as_str(), status.as_str()])
            .get()
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        tracing::debug!(
            metric_family_count = metric_families.len(),
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}
