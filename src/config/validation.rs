//!
//! Configuration validation for Claude Adapter.
//!
//! This module provides comprehensive validation of configuration values,
//! including upstream connectivity settings, network settings, and
//! security constraints. Follows Single Responsibility Principle -
//! handles only configuration validation concerns.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::Config;
use crate::error::{AdapterError, Result};

/* --- types ----------------------------------------------------------------------------------- */

///
/// Configuration validator implementing comprehensive validation rules.
///
/// Validates all aspects of the configuration including network settings,
/// upstream credentials, model routing, and security constraints.
pub struct ConfigValidator<'a> {
    config: &'a Config,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/* --- implementations --------------------------------------------------------------------- */

impl<'a> ConfigValidator<'a> {
    /// Create a new configuration validator
    pub fn new(config: &'a Config) -> Self {
        Self { config, errors: Vec::new(), warnings: Vec::new() }
    }

    /// Perform comprehensive configuration validation
    pub fn validate(mut self) -> Result<()> {
        self.validate_server_config();
        self.validate_upstream_config();
        self.validate_security_requirements();

        for warning in &self.warnings {
            tracing::warn!("Configuration warning: {}", warning);
        }

        if !self.errors.is_empty() {
            let error_msg = format!(
                "Configuration validation failed with {} error(s):\n\n{}\n\
                 \n\
                 Please fix these issues and try again.\n\
                 Run 'claude-adapter config init' for interactive configuration setup.",
                self.errors.len(),
                self.errors
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("{}. {}", i + 1, e))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
            return Err(AdapterError::Config(error_msg));
        }

        tracing::info!("Configuration validation passed");
        if !self.warnings.is_empty() {
            tracing::info!("Configuration has {} warning(s) but is valid", self.warnings.len());
        }

        Ok(())
    }

    /* --- private validation methods ------------------------------------------------------ */

    /// Validate server configuration
    fn validate_server_config(&mut self) {
        let server = &self.config.server;

        if server.port == 0 {
            self.add_error(format!(
                "Invalid server port {}: must be between 1 and 65535",
                server.port
            ));
        }

        if server.port < 1024 && server.port != 0 {
            self.add_warning(format!(
                "Server port {} requires root/administrator privileges",
                server.port
            ));
        }

        match server.port {
            80 | 443 => {
                self.add_warning(format!(
                    "Port {} is commonly used by web servers and may conflict",
                    server.port
                ));
            }
            22 => {
                self.add_warning("Port 22 is used by SSH and may conflict".to_string());
            }
            _ => {}
        }

        tracing::debug!("Server config validation completed");
    }

    /// Validate upstream configuration
    fn validate_upstream_config(&mut self) {
        let upstream = &self.config.upstream;

        if upstream.base_url.trim().is_empty() {
            self.add_error("upstream.base_url must not be empty".to_string());
        } else if url::Url::parse(&upstream.base_url).is_err() {
            self.add_error(format!(
                "upstream.base_url '{}' is not a valid URL",
                upstream.base_url
            ));
        }

        if upstream.api_key.trim().is_empty() {
            self.add_error(
                "upstream.api_key must not be empty. Set it in the config file or via \
                 CLAUDE_ADAPTER_UPSTREAM_API_KEY."
                    .to_string(),
            );
        }

        if upstream.models.opus.trim().is_empty() {
            self.add_error("upstream.models.opus must not be empty".to_string());
        }
        if upstream.models.sonnet.trim().is_empty() {
            self.add_error("upstream.models.sonnet must not be empty".to_string());
        }
        if upstream.models.haiku.trim().is_empty() {
            self.add_error("upstream.models.haiku must not be empty".to_string());
        }

        if let Some(window) = upstream.max_context_window {
            if window < 512 {
                self.add_error(format!(
                    "upstream.max_context_window ({}) is unreasonably small; expected >= 512",
                    window
                ));
            }
        }

        tracing::debug!("Upstream config validation completed");
    }

    /// Validate security requirements
    fn validate_security_requirements(&mut self) {
        use crate::config::LogLevel;

        if self.config.server.log_level == LogLevel::Trace {
            self.add_warning(
                "Trace log level enabled: may log sensitive information in production".to_string(),
            );
        }

        tracing::debug!("Security validation completed");
    }

    /// Add a validation error
    fn add_error(&mut self, error: String) {
        tracing::debug!("Validation error: {}", error);
        self.errors.push(error);
    }

    /// Add a validation warning
    fn add_warning(&mut self, warning: String) {
        tracing::debug!("Validation warning: {}", warning);
        self.warnings.push(warning);
    }
}

/* --- tests ------------------------------------------------------------------------------- */
