//! Configuration management for keyrelay
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every field has a default matching the hosted provider setup, so an empty
//! file is a valid configuration. Secrets are never stored here; only the
//! names of the environment variables that hold them (see [`crate::secrets`]).

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for `server.upstream_timeout_seconds`
pub const MAX_UPSTREAM_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatProviderConfig,
    #[serde(default)]
    pub location: LocationProviderConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path prefix for the proxy routes (`{prefix}/chat`, `{prefix}/location`)
    ///
    /// Defaults to the serverless functions path so existing frontends can
    /// point at this server without changing their URLs.
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// Optional timeout for outbound provider calls. Unset means no timeout.
    #[serde(default)]
    pub upstream_timeout_seconds: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route_prefix: default_route_prefix(),
            upstream_timeout_seconds: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8888
}

fn default_route_prefix() -> String {
    "/.netlify/functions".to_string()
}

/// Chat-completion provider settings
///
/// Fields are private so validated values cannot be mutated after
/// `Config::validate()` has run.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatProviderConfig {
    #[serde(default = "default_chat_endpoint")]
    endpoint: String,
    #[serde(default = "default_chat_model")]
    model: String,
    #[serde(default = "default_temperature")]
    temperature: f64,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    /// Name of the environment variable holding the provider API key
    #[serde(default = "default_chat_api_key_env")]
    api_key_env: String,
}

impl ChatProviderConfig {
    /// Full URL of the chat completions endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model identifier sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sampling temperature sent with every request
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Completion token cap sent with every request
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }
}

impl Default for ChatProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_chat_endpoint(),
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: default_chat_api_key_env(),
        }
    }
}

fn default_chat_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_chat_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_chat_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

/// IP-geolocation provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocationProviderConfig {
    /// Provider base URL; lookups go to `{base_url}/{ip}/json/`
    #[serde(default = "default_location_base_url")]
    base_url: String,
    #[serde(default = "default_location_api_key_env")]
    api_key_env: String,
}

impl LocationProviderConfig {
    /// Provider base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }
}

impl Default for LocationProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_location_base_url(),
            api_key_env: default_location_api_key_env(),
        }
    }
}

fn default_location_base_url() -> String {
    "https://ipapi.co".to_string()
}

fn default_location_api_key_env() -> String {
    "IPAPI_KEY".to_string()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            crate::error::AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| crate::error::AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Timeout applied to outbound provider calls, if any
    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.server.upstream_timeout_seconds.map(Duration::from_secs)
    }

    /// Address to bind the server to
    pub fn bind_addr(&self) -> crate::error::AppResult<SocketAddr> {
        let ip = self.server.host.parse::<IpAddr>().map_err(|e| {
            crate::error::AppError::Config(format!(
                "server.host '{}' is not an IP address: {}",
                self.server.host, e
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Route path for the chat proxy
    pub fn chat_route(&self) -> String {
        format!("{}/chat", self.server.route_prefix)
    }

    /// Route path for the location proxy
    pub fn location_route(&self) -> String {
        format!("{}/location", self.server.route_prefix)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`. Call it explicitly when a
    /// Config is built some other way (e.g. via `toml::from_str` in tests).
    pub fn validate(&self) -> crate::error::AppResult<()> {
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(crate::error::AppError::Config(format!(
                "server.host '{}' must be an IP address (e.g. '127.0.0.1' or '0.0.0.0')",
                self.server.host
            )));
        }

        let prefix = &self.server.route_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(crate::error::AppError::Config(format!(
                "server.route_prefix '{}' must be empty or start with '/' and not end with '/'",
                prefix
            )));
        }

        if let Some(timeout) = self.server.upstream_timeout_seconds
            && (timeout == 0 || timeout > MAX_UPSTREAM_TIMEOUT_SECONDS)
        {
            return Err(crate::error::AppError::Config(format!(
                "server.upstream_timeout_seconds must be between 1 and {}, got {}",
                MAX_UPSTREAM_TIMEOUT_SECONDS, timeout
            )));
        }

        let chat = &self.chat;
        if !is_http_url(&chat.endpoint) {
            return Err(crate::error::AppError::Config(format!(
                "chat.endpoint '{}' must start with 'http://' or 'https://'",
                chat.endpoint
            )));
        }
        if chat.model.trim().is_empty() {
            return Err(crate::error::AppError::Config(
                "chat.model cannot be empty".to_string(),
            ));
        }
        if !chat.temperature.is_finite() || !(0.0..=2.0).contains(&chat.temperature) {
            return Err(crate::error::AppError::Config(format!(
                "chat.temperature must be a finite number between 0.0 and 2.0, got {}",
                chat.temperature
            )));
        }
        if chat.max_tokens == 0 {
            return Err(crate::error::AppError::Config(
                "chat.max_tokens must be greater than 0".to_string(),
            ));
        }

        let location = &self.location;
        if !is_http_url(&location.base_url) {
            return Err(crate::error::AppError::Config(format!(
                "location.base_url '{}' must start with 'http://' or 'https://'",
                location.base_url
            )));
        }
        // Lookups append "/{ip}/json/", so a trailing slash would double it
        if location.base_url.ends_with('/') {
            return Err(crate::error::AppError::Config(format!(
                "location.base_url '{}' must not end with '/'",
                location.base_url
            )));
        }

        for (field, name) in [
            ("chat.api_key_env", &chat.api_key_env),
            ("location.api_key_env", &location.api_key_env),
        ] {
            if name.trim().is_empty() {
                return Err(crate::error::AppError::Config(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl FromStr for Config {
    type Err = crate::error::AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str).map_err(|source| {
            crate::error::AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            }
        })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 9000
route_prefix = "/api"
upstream_timeout_seconds = 20

[chat]
endpoint = "http://localhost:1234/v1/chat/completions"
model = "test-model"
temperature = 0.2
max_tokens = 128
api_key_env = "TEST_CHAT_KEY"

[location]
base_url = "http://localhost:4321"
api_key_env = "TEST_LOCATION_KEY"

[observability]
log_level = "debug"
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.route_prefix, "/api");
        assert_eq!(config.upstream_timeout(), Some(Duration::from_secs(20)));
        assert_eq!(
            config.chat.endpoint(),
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(config.chat.model(), "test-model");
        assert_eq!(config.chat.temperature(), 0.2);
        assert_eq!(config.chat.max_tokens(), 128);
        assert_eq!(config.chat.api_key_env(), "TEST_CHAT_KEY");
        assert_eq!(config.location.base_url(), "http://localhost:4321");
        assert_eq!(config.location.api_key_env(), "TEST_LOCATION_KEY");
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_empty_config_uses_provider_defaults() {
        let config = Config::from_str("").expect("empty config should be valid");
        assert_eq!(
            config.chat.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(config.chat.model(), "llama-3.3-70b-versatile");
        assert_eq!(config.chat.temperature(), 0.7);
        assert_eq!(config.chat.max_tokens(), 500);
        assert_eq!(config.chat.api_key_env(), "GROQ_API_KEY");
        assert_eq!(config.location.base_url(), "https://ipapi.co");
        assert_eq!(config.location.api_key_env(), "IPAPI_KEY");
        assert_eq!(config.upstream_timeout(), None);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_default_matches_empty_config() {
        let parsed = Config::from_str("").expect("empty config should be valid");
        let default = Config::default();
        assert_eq!(parsed.server.port, default.server.port);
        assert_eq!(parsed.chat.endpoint(), default.chat.endpoint());
        assert_eq!(parsed.location.base_url(), default.location.base_url());
        default.validate().expect("default config should validate");
    }

    #[test]
    fn test_routes_use_prefix() {
        let config = Config::default();
        assert_eq!(config.chat_route(), "/.netlify/functions/chat");
        assert_eq!(config.location_route(), "/.netlify/functions/location");

        let config = Config::from_str("[server]\nroute_prefix = \"\"").expect("should parse");
        assert_eq!(config.chat_route(), "/chat");
        assert_eq!(config.location_route(), "/location");
    }

    #[test]
    fn test_config_validation_route_prefix_trailing_slash_fails() {
        let result = Config::from_str("[server]\nroute_prefix = \"/api/\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_route_prefix_without_leading_slash_fails() {
        let result = Config::from_str("[server]\nroute_prefix = \"api\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_hostname_host_fails() {
        let err = Config::from_str("[server]\nhost = \"localhost\"")
            .expect_err("hostname should be rejected instead of binding all interfaces");
        assert!(err.to_string().contains("server.host"));
    }

    #[test]
    fn test_bind_addr_uses_configured_host() {
        let config = Config::from_str("[server]\nhost = \"127.0.0.1\"\nport = 9100")
            .expect("should parse");
        assert_eq!(
            config.bind_addr().expect("valid host"),
            "127.0.0.1:9100".parse::<SocketAddr>().expect("valid addr")
        );

        let config = Config::from_str("[server]\nhost = \"::1\"").expect("should parse");
        assert!(config.bind_addr().expect("valid host").is_ipv6());
    }

    #[test]
    fn test_config_validation_zero_timeout_fails() {
        let err = Config::from_str("[server]\nupstream_timeout_seconds = 0")
            .expect_err("zero timeout should be rejected");
        assert!(err.to_string().contains("upstream_timeout_seconds"));
    }

    #[test]
    fn test_config_validation_excessive_timeout_fails() {
        let result = Config::from_str("[server]\nupstream_timeout_seconds = 301");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_invalid_chat_endpoint_fails() {
        let err = Config::from_str("[chat]\nendpoint = \"api.groq.com/openai\"")
            .expect_err("endpoint without scheme should be rejected");
        assert!(err.to_string().contains("chat.endpoint"));
    }

    #[test]
    fn test_config_validation_empty_model_fails() {
        let result = Config::from_str("[chat]\nmodel = \"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation_temperature_out_of_range_fails() {
        assert!(Config::from_str("[chat]\ntemperature = 2.5").is_err());
        assert!(Config::from_str("[chat]\ntemperature = -0.1").is_err());
        assert!(Config::from_str("[chat]\ntemperature = nan").is_err());
    }

    #[test]
    fn test_config_validation_zero_max_tokens_fails() {
        assert!(Config::from_str("[chat]\nmax_tokens = 0").is_err());
    }

    #[test]
    fn test_config_validation_location_trailing_slash_fails() {
        let err = Config::from_str("[location]\nbase_url = \"https://ipapi.co/\"")
            .expect_err("trailing slash should be rejected");
        assert!(err.to_string().contains("location.base_url"));
    }

    #[test]
    fn test_config_validation_empty_api_key_env_fails() {
        assert!(Config::from_str("[chat]\napi_key_env = \"\"").is_err());
        assert!(Config::from_str("[location]\napi_key_env = \"\"").is_err());
    }
}
