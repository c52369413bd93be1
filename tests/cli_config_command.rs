//! Integration tests for the `keyrelay config` template

use keyrelay::cli::generate_config_template;
use keyrelay::config::Config;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generated_template_creates_valid_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, generate_config_template()).expect("Failed to write template");

    let config =
        Config::from_file(&config_path).expect("Generated template should load as valid Config");

    assert_eq!(config.server.port, 8888);
    assert_eq!(config.server.route_prefix, "/.netlify/functions");
    assert_eq!(config.upstream_timeout(), None);
}

#[test]
fn test_template_values_match_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, generate_config_template()).expect("Failed to write template");

    let from_template = Config::from_file(&config_path).expect("template should load");
    let defaults = Config::default();

    assert_eq!(from_template.server.host, defaults.server.host);
    assert_eq!(from_template.chat.endpoint(), defaults.chat.endpoint());
    assert_eq!(from_template.chat.model(), defaults.chat.model());
    assert_eq!(from_template.chat.temperature(), defaults.chat.temperature());
    assert_eq!(from_template.chat.max_tokens(), defaults.chat.max_tokens());
    assert_eq!(from_template.chat.api_key_env(), defaults.chat.api_key_env());
    assert_eq!(from_template.location.base_url(), defaults.location.base_url());
    assert_eq!(
        from_template.location.api_key_env(),
        defaults.location.api_key_env()
    );
}

#[test]
fn test_template_never_contains_secret_values() {
    let template = generate_config_template();
    assert!(!template.contains("gsk_"));
    assert!(template.contains("api_key_env"));
}
