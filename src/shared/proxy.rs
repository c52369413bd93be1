//! Proxy identity
//!
//! Everything that differs between the two proxies at the HTTP surface
//! (advertised methods, fixed error messages, label names) hangs off this enum.

use crate::error::ErrorKind;
use std::fmt;

/// One of the two secret-injecting proxies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proxy {
    /// Chat-completion provider
    Chat,
    /// IP-geolocation provider
    Location,
}

impl Proxy {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Proxy::Chat => "chat",
            Proxy::Location => "location",
        }
    }

    /// Value of `Access-Control-Allow-Methods`
    pub fn allowed_methods(&self) -> &'static str {
        match self {
            Proxy::Chat => "POST, OPTIONS",
            Proxy::Location => "GET, OPTIONS",
        }
    }

    /// Fixed caller-facing message for an error kind
    pub fn error_message(&self, kind: ErrorKind) -> &'static str {
        match (self, kind) {
            (Proxy::Chat, ErrorKind::Configuration) => "Server Error: API Key not configured.",
            (Proxy::Chat, ErrorKind::Upstream) => "Failed to connect to AI provider.",
            (Proxy::Location, ErrorKind::Configuration) => "Server Error: IPAPI_KEY not found.",
            (Proxy::Location, ErrorKind::Upstream) => "Failed to fetch location.",
        }
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
