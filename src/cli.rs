//! Command-line interface for keyrelay
//!
//! Provides argument parsing and subcommand handling for the keyrelay binary.

use clap::{Parser, Subcommand};

/// Secret-injecting CORS proxy for chat-completion and geolocation APIs
#[derive(Parser)]
#[command(name = "keyrelay")]
#[command(version)]
#[command(about = "Secret-injecting CORS proxy for chat-completion and geolocation APIs")]
#[command(
    long_about = "keyrelay lets a browser frontend call third-party APIs without exposing \
    their keys: it injects server-held secrets into outbound requests and relays the \
    responses with permissive CORS headers."
)]
pub struct Cli {
    /// Path to configuration file (built-in defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# keyrelay Configuration
# =======================
#
# Every setting below is optional; the values shown are the defaults.
# Provider API keys are NOT stored here. They are read from the environment
# variables named by `api_key_env` once at startup.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8888

# Prefix for the proxy routes: {prefix}/chat and {prefix}/location
# Use "" to serve them at /chat and /location
route_prefix = "/.netlify/functions"

# Timeout for outbound provider calls, 1-300 seconds.
# Leave unset to apply no client-side timeout.
# upstream_timeout_seconds = 30

# ─────────────────────────────────────────────────────────────────────────────
# CHAT PROVIDER
# ─────────────────────────────────────────────────────────────────────────────

[chat]
endpoint = "https://api.groq.com/openai/v1/chat/completions"
model = "llama-3.3-70b-versatile"
temperature = 0.7
max_tokens = 500
api_key_env = "GROQ_API_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# LOCATION PROVIDER
# ─────────────────────────────────────────────────────────────────────────────

[location]
# Lookups go to {base_url}/{client-ip}/json/?key=<secret>
base_url = "https://ipapi.co"
api_key_env = "IPAPI_KEY"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
