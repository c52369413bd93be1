//! Request ID middleware for log correlation
//!
//! Reuses the hosting platform's request id when one is forwarded
//! (`x-nf-request-id`, then `x-request-id`), otherwise generates a UUID v4.
//! The id is attached to request extensions and echoed in the response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::fmt;
use uuid::Uuid;

/// Response header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inbound headers checked, in order, for an existing id
const INBOUND_ID_HEADERS: [&str; 2] = ["x-nf-request-id", REQUEST_ID_HEADER];

/// Longest inbound id accepted verbatim
const MAX_INBOUND_ID_LEN: usize = 128;

/// Request id stored in Axum extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Take the id forwarded by the platform, or generate one
    ///
    /// Forwarded values must be short, non-empty, visible ASCII; anything else
    /// is ignored.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        INBOUND_ID_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name))
            .filter_map(|value| value.to_str().ok())
            .map(str::trim)
            .find(|value| is_acceptable_id(value))
            .map(|value| Self(value.to_string()))
            .unwrap_or_default()
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_acceptable_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_INBOUND_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Middleware that attaches a request id to each request and its response
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers());

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Incoming request"
    );

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(request_id.as_str()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
