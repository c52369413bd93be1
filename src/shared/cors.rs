//! CORS-wrapped proxy responses
//!
//! Every response from a proxy route carries the same fixed header set,
//! whether it is a preflight, a passthrough, or an error.

use super::Proxy;
use crate::error::AppError;
use axum::{
    Json,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Fixed CORS headers for a proxy
pub fn cors_headers(proxy: Proxy) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(proxy.allowed_methods()),
    );
    headers
}

/// `200` with an empty body
pub fn preflight(proxy: Proxy) -> Response {
    (StatusCode::OK, cors_headers(proxy), "").into_response()
}

/// `200` with the provider's JSON re-serialized as-is
pub fn passthrough(proxy: Proxy, body: Value) -> Response {
    (StatusCode::OK, cors_headers(proxy), Json(body)).into_response()
}

/// `500` with `{"error": <fixed message>}`
///
/// The message depends only on the error kind; the error itself is not
/// rendered.
pub fn error_response(proxy: Proxy, err: &AppError) -> Response {
    let body = Json(serde_json::json!({
        "error": proxy.error_message(err.kind()),
    }));

    (StatusCode::INTERNAL_SERVER_ERROR, cors_headers(proxy), body).into_response()
}
