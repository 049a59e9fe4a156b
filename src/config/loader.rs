//!
//! Configuration loading system for Claude Adapter.
//!
//! This module implements a multi-layered configuration loading system following
//! industry best practices:
//! 1. CLI arguments (highest priority, applied by the caller after `build()`)
//! 2. Environment variables (`CLAUDE_ADAPTER_*`)
//! 3. User config file (~/.config/claude-adapter/config.toml)
//! 4. System config file (/etc/claude-adapter/config.toml)
//! 5. Built-in defaults (lowest priority)
//!
//! Follows the Builder pattern (Open/Closed Principle) and Single Responsibility
//! Principle - handles only configuration loading concerns.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::paths;
use crate::config::{Config, LogLevel, ModelConfig, ServerConfig, ToolFormat, UpstreamConfig};
use crate::error::{AdapterError, Result};

use std::collections::HashMap;
use std::env;
use std::path::Path;

/* --- types ----------------------------------------------------------------------------------- */

///
/// Configuration loader implementing the Builder pattern.
///
/// Provides a fluent interface for building configuration from multiple sources
/// in the correct precedence order. Each method returns self for chaining.
pub struct ConfigLoader {
    config: Config,
    env_overrides: HashMap<String, String>,
    defaults_applied: bool,
}

/* --- implementations --------------------------------------------------------------------- */

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config: Config::default(), env_overrides: HashMap::new(), defaults_applied: false }
    }

    /// Apply built-in default values. Should be called first in the chain.
    pub fn with_defaults(mut self) -> Self {
        self.config = Config::default();
        self.defaults_applied = true;
        self
    }

    /// Load system-wide configuration file, if present.
    ///
    /// - Linux: /etc/claude-adapter/config.toml
    /// - macOS: /Library/Preferences/claude-adapter/config.toml
    /// - Windows: %PROGRAMDATA%/claude-adapter/config.toml
    pub fn with_system_config(mut self) -> Result<Self> {
        let system_config_path = paths::system_config_file()?;

        if system_config_path.exists() {
            tracing::debug!("Loading system config from: {}", system_config_path.display());
            self.load_config_file(&system_config_path)?;
        } else {
            tracing::debug!("System config not found at: {}", system_config_path.display());
        }

        Ok(self)
    }

    /// Load user configuration file, if present.
    ///
    /// - Linux: ~/.config/claude-adapter/config.toml
    /// - macOS: ~/Library/Application Support/claude-adapter/config.toml
    /// - Windows: %APPDATA%/claude-adapter/config.toml
    pub fn with_user_config(mut self) -> Result<Self> {
        let user_config_path = paths::user_config_file()?;

        if user_config_path.exists() {
            tracing::debug!("Loading user config from: {}", user_config_path.display());
            self.load_config_file(&user_config_path)?;
        } else {
            tracing::debug!("User config not found at: {}", user_config_path.display());
        }

        Ok(self)
    }

    /// Load configuration from a specific file path. Useful for testing or custom locations.
    #[allow(dead_code)]
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading custom config from: {}", path.display());
        self.load_config_file(path)?;
        Ok(self)
    }

    /// Apply environment variable overrides.
    ///
    /// Loads configuration values from environment variables using the
    /// `CLAUDE_ADAPTER_` prefix. Environment variables take precedence over config files.
    ///
    /// Supported:
    /// - CLAUDE_ADAPTER_SERVER_PORT
    /// - CLAUDE_ADAPTER_SERVER_LOG_LEVEL
    /// - CLAUDE_ADAPTER_UPSTREAM_BASE_URL
    /// - CLAUDE_ADAPTER_UPSTREAM_API_KEY
    /// - CLAUDE_ADAPTER_UPSTREAM_TOOL_FORMAT
    /// - CLAUDE_ADAPTER_UPSTREAM_MAX_CONTEXT_WINDOW
    /// - CLAUDE_ADAPTER_UPSTREAM_MODEL_OPUS / _SONNET / _HAIKU
    pub fn with_env_vars(mut self) -> Result<Self> {
        tracing::debug!("Loading configuration from environment variables");

        for (key, value) in env::vars() {
            if key.starts_with("CLAUDE_ADAPTER_") {
                self.env_overrides.insert(key, value);
            }
        }

        self.apply_env_overrides()?;

        Ok(self)
    }

    /// Build and validate the final configuration. Should be called last in the chain.
    pub fn build(self) -> Result<Config> {
        if !self.defaults_applied {
            return Err(AdapterError::Config(
                "Configuration loader must call with_defaults() before build()".to_string(),
            ));
        }

        self.config.validate()?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Final config: server.port={}, server.log_level={:?}, upstream.tool_format={:?}",
            self.config.server.port,
            self.config.server.log_level,
            self.config.upstream.tool_format
        );

        Ok(self.config)
    }

    /* --- private methods ----------------------------------------------------------------- */

    /// Load and merge configuration from a TOML file
    fn load_config_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        paths::validate_config_file(path)?;

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let file_config: Config = toml::from_str(&contents).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to parse TOML configuration file '{}': {}\n\
                 \n\
                 Please check the syntax of your configuration file.\n\
                 Common issues:\n\
                 1. Missing quotes around string values\n\
                 2. Invalid TOML syntax\n\
                 3. Incorrect section names or field names\n\
                 \n\
                 Run 'claude-adapter config validate' for more details.",
                path.display(),
                e
            ))
        })?;

        self.merge_config(file_config);

        tracing::debug!("Successfully loaded config from: {}", path.display());
        Ok(())
    }

    /// Merge another config into the current config
    fn merge_config(&mut self, other: Config) {
        self.merge_server_config(other.server);
        self.merge_upstream_config(other.upstream);
    }

    /// Merge server configuration
    fn merge_server_config(&mut self, other: ServerConfig) {
        if other.port != ServerConfig::default().port {
            self.config.server.port = other.port;
        }
        self.config.server.log_level = other.log_level;
    }

    /// Merge upstream configuration
    fn merge_upstream_config(&mut self, other: UpstreamConfig) {
        if !other.base_url.is_empty() && other.base_url != UpstreamConfig::default().base_url {
            self.config.upstream.base_url = other.base_url;
        }
        if !other.api_key.is_empty() {
            self.config.upstream.api_key = other.api_key;
        }
        self.config.upstream.models = other.models;
        self.config.upstream.tool_format = other.tool_format;
        if other.max_context_window.is_some() {
            self.config.upstream.max_context_window = other.max_context_window;
        }
    }

    /// Apply environment variable overrides to current configuration
    fn apply_env_overrides(&mut self) -> Result<()> {
        for (key, value) in &self.env_overrides {
            match key.as_str() {
                "CLAUDE_ADAPTER_SERVER_PORT" => {
                    self.config.server.port = value.parse().map_err(|e| {
                        AdapterError::Config(format!(
                            "Invalid CLAUDE_ADAPTER_SERVER_PORT value '{}': {}\n\
                             Port must be a number between 1 and 65535.",
                            value, e
                        ))
                    })?;
                }
                "CLAUDE_ADAPTER_SERVER_LOG_LEVEL" => {
                    self.config.server.log_level = LogLevel::from_str(value)?;
                }
                "CLAUDE_ADAPTER_UPSTREAM_BASE_URL" => {
                    self.config.upstream.base_url = value.clone();
                }
                "CLAUDE_ADAPTER_UPSTREAM_API_KEY" => {
                    self.config.upstream.api_key = value.clone();
                }
                "CLAUDE_ADAPTER_UPSTREAM_TOOL_FORMAT" => {
                    self.config.upstream.tool_format = ToolFormat::from_str(value)?;
                }
                "CLAUDE_ADAPTER_UPSTREAM_MAX_CONTEXT_WINDOW" => {
                    self.config.upstream.max_context_window = Some(value.parse().map_err(|e| {
                        AdapterError::Config(format!(
                            "Invalid CLAUDE_ADAPTER_UPSTREAM_MAX_CONTEXT_WINDOW value '{}': {}",
                            value, e
                        ))
                    })?);
                }
                "CLAUDE_ADAPTER_UPSTREAM_MODEL_OPUS" => {
                    self.config.upstream.models.opus = value.clone();
                }
                "CLAUDE_ADAPTER_UPSTREAM_MODEL_SONNET" => {
                    self.config.upstream.models.sonnet = value.clone();
                }
                "CLAUDE_ADAPTER_UPSTREAM_MODEL_HAIKU" => {
                    self.config.upstream.models.haiku = value.clone();
                }
                _ => {
                    tracing::debug!("Ignoring unknown environment variable: {}", key);
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/* --- tests ------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn base() -> ConfigLoader {
        ConfigLoader::new().with_defaults()
    }

    #[test]
    fn test_config_loader_defaults() {
        let config = base().build().expect("Should build with defaults");

        assert_eq!(config.server.port, 3080);
        assert!(matches!(config.server.log_level, LogLevel::Info));
    }

    #[test]
    fn test_config_loader_with_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let config_content = r#"
[server]
port = 8080
log_level = "debug"

[upstream]
base_url = "https://api.moonshot.cn/v1"
api_key = "sk-test"
tool_format = "native"

[upstream.models]
opus = "kimi-k2.5"
sonnet = "kimi-k2.5"
haiku = "kimi-k2.5"
"#;

        fs::write(&config_file, config_content).unwrap();

        let config = base()
            .with_config_file(&config_file)
            .expect("Should create loader")
            .build()
            .expect("Should load custom config file");

        assert_eq!(config.server.port, 8080);
        assert!(matches!(config.server.log_level, LogLevel::Debug));
        assert_eq!(config.upstream.base_url, "https://api.moonshot.cn/v1");
        assert_eq!(config.upstream.api_key, "sk-test");
    }

    #[test]
    fn test_env_var_overrides() {
        temp_env::with_vars(
            [
                ("CLAUDE_ADAPTER_SERVER_PORT", Some("9090")),
                ("CLAUDE_ADAPTER_SERVER_LOG_LEVEL", Some("error")),
                ("CLAUDE_ADAPTER_UPSTREAM_BASE_URL", Some("https://api.deepseek.com/anthropic")),
                ("CLAUDE_ADAPTER_UPSTREAM_API_KEY", Some("sk-test")),
                ("CLAUDE_ADAPTER_UPSTREAM_MODEL_OPUS", Some("deepseek-chat")),
                ("CLAUDE_ADAPTER_UPSTREAM_MODEL_SONNET", Some("deepseek-chat")),
                ("CLAUDE_ADAPTER_UPSTREAM_MODEL_HAIKU", Some("deepseek-chat")),
            ],
            || {
                let config =
                    base().with_env_vars().expect("Should apply env vars").build().expect(
                        "Should build with env vars",
                    );

                assert_eq!(config.server.port, 9090);
                assert!(matches!(config.server.log_level, LogLevel::Error));
                assert_eq!(config.upstream.base_url, "https://api.deepseek.com/anthropic");
                assert_eq!(config.upstream.models.opus, "deepseek-chat");
            },
        );
    }

    #[test]
    fn test_precedence_order() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let config_content = r#"
[server]
port = 7070

[upstream]
base_url = "https://api.moonshot.cn/v1"
api_key = "sk-file"

[upstream.models]
opus = "kimi-k2.5"
sonnet = "kimi-k2.5"
haiku = "kimi-k2.5"
"#;
        fs::write(&config_file, config_content).unwrap();

        temp_env::with_vars([("CLAUDE_ADAPTER_SERVER_PORT", Some("8080"))], || {
            let config = base()
                .with_config_file(&config_file)
                .expect("Should create loader")
                .with_env_vars()
                .expect("Should apply env vars")
                .build()
                .expect("Should build with precedence");

            assert_eq!(config.server.port, 8080);
        });
    }

    #[test]
    fn test_invalid_toml_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let invalid_content = r#"
[server
port = 8080
"#;
        fs::write(&config_file, invalid_content).unwrap();

        let result = base().with_config_file(&config_file).and_then(|loader| loader.build());

        assert!(result.is_err());
        let error_msg = format!("{}", result.unwrap_err());
        assert!(error_msg.contains("Failed to parse TOML"));
    }
}
