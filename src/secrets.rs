//! Provider secrets
//!
//! Secrets are read from the environment exactly once at startup and injected
//! into handler state. They are never logged and never serialized.

use crate::config::Config;
use std::fmt;

/// A server-held provider credential
///
/// `Debug` and `Display` are redacted so the value cannot leak through
/// tracing fields or error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSecret(String);

impl ProviderSecret {
    /// Wrap a credential. Empty or whitespace-only values are not secrets.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Expose the raw credential for injection into an outbound request
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProviderSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProviderSecret(***)")
    }
}

impl fmt::Display for ProviderSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Secrets for both providers, each of which may be unprovisioned
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    chat: Option<ProviderSecret>,
    location: Option<ProviderSecret>,
}

impl Secrets {
    /// Build from explicit values
    pub fn new(chat: Option<ProviderSecret>, location: Option<ProviderSecret>) -> Self {
        Self { chat, location }
    }

    /// Read both secrets from the process environment, using the variable
    /// names from configuration
    pub fn from_env(config: &Config) -> Self {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Read both secrets through an arbitrary lookup function
    pub fn from_lookup<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let chat = lookup(config.chat.api_key_env()).and_then(ProviderSecret::new);
        let location = lookup(config.location.api_key_env()).and_then(ProviderSecret::new);

        tracing::info!(
            chat_env = %config.chat.api_key_env(),
            chat_provisioned = chat.is_some(),
            location_env = %config.location.api_key_env(),
            location_provisioned = location.is_some(),
            "Loaded provider secrets"
        );

        Self { chat, location }
    }

    /// Chat-completion provider key
    pub fn chat(&self) -> Option<&ProviderSecret> {
        self.chat.as_ref()
    }

    /// Geolocation provider key
    pub fn location(&self) -> Option<&ProviderSecret> {
        self.location.as_ref()
    }
}
