//! Location proxy handler
//!
//! Looks up the caller's public IP with the geolocation provider. The IP
//! comes from headers set by the hosting edge, never from the body: without
//! it the provider would geolocate this server instead of the visitor.

use crate::error::{AppError, AppResult};
use crate::handlers::{AppState, finish, preflight};
use crate::middleware::RequestId;
use crate::shared::{Proxy, upstream};
use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, Method},
    response::Response,
};
use serde_json::Value;
use std::net::IpAddr;

/// Header set by the edge with the visitor's connection IP
pub const CLIENT_CONNECTION_IP_HEADER: &str = "x-nf-client-connection-ip";

/// Fallback client IP header
pub const CLIENT_IP_HEADER: &str = "client-ip";

/// Client address to geolocate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationQuery {
    ip: IpAddr,
}

impl LocationQuery {
    pub fn new(ip: IpAddr) -> Self {
        Self { ip }
    }

    /// Resolve the client IP from inbound headers
    ///
    /// The primary header wins when present and non-empty; otherwise the
    /// fallback header is used. The chosen value must parse as an IP address.
    pub fn from_headers(headers: &HeaderMap) -> AppResult<Self> {
        let raw = [CLIENT_CONNECTION_IP_HEADER, CLIENT_IP_HEADER]
            .into_iter()
            .filter_map(|name| headers.get(name))
            .map(|value| {
                value
                    .to_str()
                    .map(str::trim)
                    .map_err(|_| AppError::InvalidClientIp {
                        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    })
            })
            .find(|value| !matches!(value, Ok("")))
            .ok_or(AppError::MissingClientIp)??;

        raw.parse::<IpAddr>()
            .map(Self::new)
            .map_err(|_| AppError::InvalidClientIp {
                value: raw.to_string(),
            })
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Provider lookup URL for this address, without credentials
    pub fn lookup_url(&self, base_url: &str) -> String {
        format!("{}/{}/json/", base_url, self.ip)
    }
}

/// Location proxy handler
///
/// `OPTIONS` is a preflight. Any other method is treated as the lookup.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return preflight(&state, Proxy::Location, &request_id);
    }

    let result = forward(&state, &request_id, &headers).await;
    finish(&state, Proxy::Location, &request_id, result)
}

async fn forward(state: &AppState, request_id: &RequestId, headers: &HeaderMap) -> AppResult<Value> {
    let location_config = &state.config().location;

    let secret = state
        .secrets()
        .location()
        .ok_or_else(|| AppError::MissingSecret {
            provider: Proxy::Location.as_str(),
            env_var: location_config.api_key_env().to_string(),
        })?;

    let query = LocationQuery::from_headers(headers)?;

    tracing::debug!(
        request_id = %request_id,
        client_ip = %query.ip(),
        "Forwarding location lookup"
    );

    let outbound = state
        .client()
        .get(query.lookup_url(location_config.base_url()))
        .query(&[("key", secret.expose())]);

    upstream::send_json(Proxy::Location, outbound, state.metrics()).await
}
