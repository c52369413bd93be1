//! HTTP request handlers for keyrelay

use crate::config::Config;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::metrics::{Metrics, Outcome};
use crate::middleware::{RequestId, request_id_middleware};
use crate::secrets::Secrets;
use crate::shared::{Proxy, cors};
use axum::{
    Router, middleware,
    response::Response,
    routing::{any, get},
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod health;
pub mod location;
pub mod metrics;

/// Application state shared across all handlers
///
/// Everything here is read-only after startup. Cloning is cheap: the
/// reqwest client is itself a handle to a shared connection pool.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    secrets: Arc<Secrets>,
    client: reqwest::Client,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState from configuration and already-loaded secrets
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or metrics registry cannot be built.
    pub fn new(config: Arc<Config>, secrets: Secrets) -> AppResult<Self> {
        let client = crate::shared::upstream::build_client(&config)?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to initialize metrics: {}", e)))?;

        Ok(Self {
            config,
            secrets: Arc::new(secrets),
            client,
            metrics: Arc::new(metrics),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the provider secrets
    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    /// Get reference to the outbound HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the full application router
///
/// Proxy routes accept any method: `OPTIONS` is answered as a preflight and
/// every other method takes the proxy path, so these routes only ever
/// produce `200` or `500`.
pub fn router(state: AppState) -> Router {
    let config = state.config();
    let chat_route = config.chat_route();
    let location_route = config.location_route();

    Router::new()
        .route(&chat_route, any(chat::handler))
        .route(&location_route, any(location::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Record the outcome of a proxy call and turn it into a response
fn finish(
    state: &AppState,
    proxy: Proxy,
    request_id: &RequestId,
    result: AppResult<Value>,
) -> Response {
    match result {
        Ok(body) => {
            tracing::info!(request_id = %request_id, proxy = %proxy, "Proxied provider response");
            state.metrics().record_outcome(proxy, Outcome::Success);
            cors::passthrough(proxy, body)
        }
        Err(err) => {
            let outcome = match err.kind() {
                ErrorKind::Configuration => {
                    tracing::error!(
                        request_id = %request_id,
                        proxy = %proxy,
                        error = %err,
                        "Provider secret missing, refusing request"
                    );
                    Outcome::ConfigurationError
                }
                ErrorKind::Upstream => {
                    tracing::warn!(
                        request_id = %request_id,
                        proxy = %proxy,
                        error = %err,
                        "Proxy request failed"
                    );
                    Outcome::UpstreamError
                }
            };
            state.metrics().record_outcome(proxy, outcome);
            cors::error_response(proxy, &err)
        }
    }
}

/// Answer a CORS preflight
fn preflight(state: &AppState, proxy: Proxy, request_id: &RequestId) -> Response {
    tracing::debug!(request_id = %request_id, proxy = %proxy, "Answering preflight");
    state.metrics().record_outcome(proxy, Outcome::Preflight);
    cors::preflight(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::ProviderSecret;

    fn create_test_state() -> AppState {
        let secrets = Secrets::new(ProviderSecret::new("chat-key"), None);
        AppState::new(Arc::new(Config::default()), secrets).expect("should create AppState")
    }

    #[test]
    fn test_appstate_new_creates_state() {
        let state = create_test_state();
        assert_eq!(state.config().server.port, 8888);
        assert!(state.secrets().chat().is_some());
        assert!(state.secrets().location().is_none());
    }

    #[test]
    fn test_appstate_clones_share_metrics() {
        let state = create_test_state();
        let state2 = state.clone();

        state.metrics().record_outcome(Proxy::Chat, Outcome::Success);
        assert_eq!(
            state2.metrics().outcome_count(Proxy::Chat, Outcome::Success),
            1
        );
    }

    #[test]
    fn test_finish_records_configuration_outcome() {
        let state = create_test_state();
        let err = AppError::MissingSecret {
            provider: "location",
            env_var: "IPAPI_KEY".to_string(),
        };

        let response = finish(&state, Proxy::Location, &RequestId::new(), Err(err));

        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            state
                .metrics()
                .outcome_count(Proxy::Location, Outcome::ConfigurationError),
            1
        );
    }
}
