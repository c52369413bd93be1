//! Health check endpoint
//!
//! Reports liveness and which providers have a secret provisioned. Only
//! booleans are exposed, never the secrets or their variable values.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Whether the chat provider key is provisioned
    pub chat_configured: bool,
    /// Whether the geolocation provider key is provisioned
    pub location_configured: bool,
}

/// Health check handler
///
/// Always `200 OK`: a missing secret degrades one proxy but the process is
/// still serving.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let secrets = state.secrets();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            chat_configured: secrets.chat().is_some(),
            location_configured: secrets.location().is_some(),
        }),
    )
}
