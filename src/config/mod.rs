//!
//! Professional configuration management for Claude Adapter.
//!
//! This module provides a clean, industry-standard configuration system using:
//! - Platform-native configuration directories (XDG on Linux, standard paths on macOS/Windows)
//! - TOML format for human-readable configuration files
//! - Multi-layered configuration hierarchy (CLI args > env vars > user config > defaults)
//! - Comprehensive validation and error handling
//!
//! Follows SOLID principles with clear separation of concerns:
//! - `loader.rs` - Configuration loading logic (SRP)
//! - `paths.rs` - Platform-native path resolution (SRP)
//! - `validation.rs` - Configuration validation (SRP)
//! - `cli.rs` - CLI configuration commands (SRP)
//! - `presets.rs` - Named upstream provider presets (SRP)
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- modules --------------------------------------------------------------------------------- */

pub mod cli;
pub mod loader;
pub mod paths;
pub mod presets;
pub mod validation;

/* --- uses ------------------------------------------------------------------------------------ */

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};

/* --- types ----------------------------------------------------------------------------------- */

///
/// Main application configuration structure.
///
/// Separated into server/upstream sections following configuration best practices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Upstream (OpenAI-compatible backend) configuration
    pub upstream: UpstreamConfig,
}

///
/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port number
    #[serde(default = "default_port")]
    pub port: u16,
    /// Application logging level
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

///
/// Per-tier model names routed to on the upstream backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub opus: String,
    pub sonnet: String,
    pub haiku: String,
}

///
/// Tool-calling format used when talking to the upstream backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFormat {
    /// Pass tools through as OpenAI `tools`/`tool_choice` fields.
    Native,
    /// Emulate tool calling via an injected system-prompt contract and `<tool_code>` tags.
    Xml,
}

///
/// Upstream backend configuration: base URL, credentials, model routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the OpenAI-compatible endpoint, e.g. `https://api.moonshot.cn/v1`
    pub base_url: String,
    /// Bearer token sent as `Authorization: Bearer <api_key>`
    pub api_key: String,
    /// Model names for each Claude tier
    pub models: ModelConfig,
    /// Tool-calling format to use with this upstream
    #[serde(default = "default_tool_format")]
    pub tool_format: ToolFormat,
    /// Context window size in tokens, used for the prompt-fitting algorithm. None means unbounded.
    #[serde(default)]
    pub max_context_window: Option<u32>,
}

///
/// Logging level enumeration.
///
/// Defines available log levels compatible with tracing crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "trace")]
    Trace,
    #[serde(alias = "debug")]
    Debug,
    #[serde(alias = "info")]
    Info,
    #[serde(alias = "warn")]
    Warn,
    #[serde(alias = "error")]
    Error,
}

/* --- defaults -------------------------------------------------------------------------------- */

/// Default HTTP port
fn default_port() -> u16 {
    3080
}

/// Default logging level
fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Default tool-calling format
fn default_tool_format() -> ToolFormat {
    ToolFormat::Native
}

/* --- implementations --------------------------------------------------------------------- */

impl Default for Config {
    fn default() -> Self {
        Self { server: ServerConfig::default(), upstream: UpstreamConfig::default() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port(), log_level: default_log_level() }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            models: ModelConfig {
                opus: "gpt-4o".to_string(),
                sonnet: "gpt-4o".to_string(),
                haiku: "gpt-4o-mini".to_string(),
            },
            tool_format: default_tool_format(),
            max_context_window: None,
        }
    }
}

impl Config {
    /// Load configuration from the standard hierarchy:
    /// 1. CLI arguments (highest priority, applied by caller)
    /// 2. Environment variables (`CLAUDE_ADAPTER_*`)
    /// 3. User config file (~/.config/claude-adapter/config.toml)
    /// 4. System config file (/etc/claude-adapter/config.toml)
    /// 5. Built-in defaults (lowest priority)
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded configuration
    /// * `Err(AdapterError)` - Configuration loading or validation failed
    pub fn load() -> Result<Self> {
        loader::ConfigLoader::new()
            .with_defaults()
            .with_system_config()?
            .with_user_config()?
            .with_env_vars()?
            .build()
    }

    /// Validate the current configuration
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is valid
    /// * `Err(AdapterError)` - Configuration validation failed with details
    pub fn validate(&self) -> Result<()> {
        validation::ConfigValidator::new(self).validate()
    }

    /// Get configuration file example as TOML string
    ///
    /// Returns a well-documented example configuration file that users
    /// can use as a starting point for their own configuration.
    pub fn example_toml() -> &'static str {
        r#"# Claude Adapter Configuration
# This file should be placed at:
#   Linux/Unix: ~/.config/claude-adapter/config.toml
#   macOS: ~/Library/Application Support/claude-adapter/config.toml
#   Windows: %APPDATA%/claude-adapter/config.toml

[server]
# HTTP server port (default: 3080)
port = 3080

# Logging level: trace, debug, info, warn, error (default: info)
log_level = "info"

[upstream]
# Base URL of the OpenAI-compatible backend
base_url = "https://api.moonshot.cn/v1"

# Bearer token for the upstream backend
api_key = "sk-..."

# Tool-calling format: "native" (tools/tool_choice) or "xml" (prompt-injected contract)
tool_format = "native"

# Optional: cap on the upstream's context window, used for prompt fitting
# max_context_window = 131072

[upstream.models]
opus = "kimi-k2.5"
sonnet = "kimi-k2.5"
haiku = "kimi-k2.5"
"#
    }
}

impl LogLevel {
    /// Convert to tracing::Level for logging setup
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    /// Check if trace/debug-level logging is enabled (gates verbose per-request payload logs)
    pub fn is_trace_enabled(self) -> bool {
        matches!(self, LogLevel::Trace | LogLevel::Debug)
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(AdapterError::Config(format!(
                "Invalid log level '{}'. Valid levels are: trace, debug, info, warn, error",
                s
            ))),
        }
    }
}

impl ToolFormat {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "native" => Ok(ToolFormat::Native),
            "xml" => Ok(ToolFormat::Xml),
            _ => Err(AdapterError::Config(format!(
                "Invalid tool_format '{}'. Valid values are: native, xml",
                s
            ))),
        }
    }
}
