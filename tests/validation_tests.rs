//! Validation tests for Claude Adapter configuration validation.
//!
//! Exercises `Config::validate()` (the public entry point) across the non-trivial
//! cases; `config::validation::ConfigValidator` itself has its own direct unit
//! tests for the full per-field error-message assertions.

use claude_adapter::config::{LogLevel, ModelConfig, ServerConfig, ToolFormat, UpstreamConfig};
use claude_adapter::Config;

fn valid_config() -> Config {
    Config {
        server: ServerConfig { port: 3080, log_level: LogLevel::Info },
        upstream: UpstreamConfig {
            base_url: "https://api.moonshot.cn/v1".to_string(),
            api_key: "sk-test".to_string(),
            models: ModelConfig {
                opus: "kimi-k2.5".to_string(),
                sonnet: "kimi-k2.5".to_string(),
                haiku: "kimi-k2.5".to_string(),
            },
            tool_format: ToolFormat::Native,
            max_context_window: Some(131072),
        },
    }
}

#[test]
fn test_valid_config_passes() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_zero_port_fails() {
    let mut config = valid_config();
    config.server.port = 0;
    let result = config.validate();
    assert!(result.is_err());
    assert!(format!("{}", result.unwrap_err()).contains("Invalid server port"));
}

#[test]
fn test_empty_base_url_fails() {
    let mut config = valid_config();
    config.upstream.base_url = String::new();
    let result = config.validate();
    assert!(result.is_err());
    assert!(format!("{}", result.unwrap_err()).contains("base_url must not be empty"));
}

#[test]
fn test_malformed_base_url_fails() {
    let mut config = valid_config();
    config.upstream.base_url = "not a url at all".to_string();
    let result = config.validate();
    assert!(result.is_err());
}

#[test]
fn test_empty_api_key_fails() {
    let mut config = valid_config();
    config.upstream.api_key = String::new();
    let result = config.validate();
    assert!(result.is_err());
    assert!(format!("{}", result.unwrap_err()).contains("api_key"));
}

#[test]
fn test_empty_model_tier_fails() {
    let mut config = valid_config();
    config.upstream.models.sonnet = String::new();
    let result = config.validate();
    assert!(result.is_err());
    assert!(format!("{}", result.unwrap_err()).contains("models.sonnet"));
}

#[test]
fn test_tiny_context_window_fails() {
    let mut config = valid_config();
    config.upstream.max_context_window = Some(64);
    assert!(config.validate().is_err());
}

#[test]
fn test_privileged_port_is_a_warning_not_an_error() {
    let mut config = valid_config();
    config.server.port = 443;
    assert!(config.validate().is_ok(), "privileged ports should warn, not fail validation");
}

#[test]
fn test_unbounded_context_window_is_valid() {
    let mut config = valid_config();
    config.upstream.max_context_window = None;
    assert!(config.validate().is_ok());
}
