//! keyrelay - secret-injecting proxy for third-party HTTP APIs
//!
//! Hosts two independent handlers that let a public frontend reach a
//! chat-completion provider and an IP-geolocation provider without ever
//! seeing the server-held API keys.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod secrets;
pub mod shared;
pub mod telemetry;
