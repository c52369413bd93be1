//! Shared utilities used by both proxy handlers
//!
//! The handlers never call each other; they only share response shaping and
//! the outbound call helper.

pub mod cors;
pub mod proxy;
pub mod upstream;

pub use proxy::Proxy;
