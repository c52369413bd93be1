//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Build the default filter directive for a log level
///
/// HTTP request spans from tower-http are kept at the same level as the crate
/// so upstream latency shows up alongside proxy logs.
pub fn default_directive(level: &str) -> String {
    format!("keyrelay={level},tower_http={level}")
}

/// Initialize tracing subscriber for structured logging
///
/// Only the first call per process has any effect.
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Examples
///
/// ```no_run
/// keyrelay::telemetry::init("info");
/// tracing::info!("Application started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
