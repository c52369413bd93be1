//! Error types for keyrelay
//!
//! Request-time errors never reach the caller verbatim. Each proxy maps
//! [`AppError::kind`] onto its own fixed message (see `shared::cors`).

use thiserror::Error;

/// Caller-visible classification of a request-time failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The provider secret was not provisioned on this server
    Configuration,
    /// Anything else: body parse, client IP, network, or response decoding
    Upstream,
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file '{path}': {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in '{path}': {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Secret for {provider} is not provisioned (env var {env_var})")]
    MissingSecret {
        provider: &'static str,
        env_var: String,
    },

    #[error("Failed to read request body: {0}")]
    BodyRead(#[source] axum::extract::rejection::BytesRejection),

    #[error("Request body is not a valid chat request: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Client IP header is missing")]
    MissingClientIp,

    #[error("Client IP header value '{value}' is not an IP address")]
    InvalidClientIp { value: String },

    #[error("Request to {provider} failed: {source}")]
    Upstream {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response from {provider} could not be decoded as JSON: {source}")]
    UpstreamDecode {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify this error for the caller
    ///
    /// Only a missing secret is a configuration error; every other request-time
    /// failure collapses into the generic upstream kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSecret { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Upstream,
        }
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
