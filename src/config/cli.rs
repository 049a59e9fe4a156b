//!
//! CLI configuration commands for Claude Adapter.
//!
//! This module provides command-line interface commands for configuration management:
//! - `config init` - Interactive configuration setup
//! - `config show` - Display current configuration
//! - `config validate` - Validate configuration
//! - `config edit` - Edit configuration in default editor
//!
//! Follows Single Responsibility Principle - handles only CLI configuration concerns.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::paths;
use crate::config::presets::{self, ProviderPreset};
use crate::config::validation::ConfigValidator;
use crate::config::{Config, LogLevel, ModelConfig, ToolFormat, UpstreamConfig};
use crate::error::{AdapterError, Result};
use std::fs;
use std::io::{self, Write};
use std::process::Command;

/* --- types ----------------------------------------------------------------------------------- */

///
/// CLI configuration command handler.
///
/// Provides methods for handling all configuration-related CLI commands
/// with user-friendly interfaces and comprehensive error handling.
pub struct ConfigCli;

/* --- implementations --------------------------------------------------------------------- */

impl ConfigCli {
    /// Handle the `config init` command
    ///
    /// Provides an interactive setup wizard that guides users through choosing
    /// a provider preset (or a custom endpoint) and writing the config file.
    pub fn init() -> Result<()> {
        println!("Claude Adapter Configuration Setup");
        println!("===================================");
        println!();

        let config_file = paths::user_config_file()?;
        if config_file.exists() {
            println!("Configuration file already exists at:");
            println!("   {}", config_file.display());
            println!();

            if !Self::confirm("Do you want to overwrite the existing configuration?")? {
                println!("Configuration setup cancelled.");
                return Ok(());
            }
        }

        let config = Self::gather_config_interactively()?;

        let config_dir = config_file.parent().unwrap();
        fs::create_dir_all(config_dir).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to create config directory '{}': {}",
                config_dir.display(),
                e
            ))
        })?;

        let config_toml = toml::to_string_pretty(&config)
            .map_err(|e| AdapterError::Config(format!("Failed to serialize configuration: {}", e)))?;

        fs::write(&config_file, config_toml).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to write configuration file '{}': {}",
                config_file.display(),
                e
            ))
        })?;

        println!("Configuration saved to: {}", config_file.display());
        println!();
        println!("Setup complete! Run 'claude-adapter config validate' to verify it.");

        Ok(())
    }

    /// Handle the `config show` command
    pub fn show() -> Result<()> {
        println!("Current Claude Adapter Configuration");
        println!("=====================================");
        println!();

        let config = Config::load()?;

        println!("Server Configuration:");
        println!("  Port: {}", config.server.port);
        println!("  Log Level: {:?}", config.server.log_level);
        println!();

        println!("Upstream Configuration:");
        println!("  Base URL: {}", config.upstream.base_url);
        println!(
            "  API Key: {}",
            if config.upstream.api_key.is_empty() { "not set" } else { "set" }
        );
        println!("  Tool Format: {:?}", config.upstream.tool_format);
        println!("  Opus -> {}", config.upstream.models.opus);
        println!("  Sonnet -> {}", config.upstream.models.sonnet);
        println!("  Haiku -> {}", config.upstream.models.haiku);
        if let Some(window) = config.upstream.max_context_window {
            println!("  Max Context Window: {} tokens", window);
        }
        println!();

        println!("Configuration Sources:");
        let config_paths = paths::config_file_paths();
        for (i, path) in config_paths.iter().enumerate() {
            let priority = match i {
                0 => "highest priority",
                n if n == config_paths.len() - 1 => "lowest priority",
                _ => "medium priority",
            };

            let status = if path.exists() { "exists" } else { "not found" };
            println!("  {} ({}): {}", path.display(), priority, status);
        }

        Ok(())
    }

    /// Handle the `config validate` command
    pub fn validate() -> Result<()> {
        println!("Validating Claude Adapter Configuration");
        println!("========================================");
        println!();

        print!("Loading configuration... ");
        io::stdout().flush().unwrap();

        let config = match Config::load() {
            Ok(config) => {
                println!("loaded");
                config
            }
            Err(e) => {
                println!("failed");
                println!();
                println!("Configuration loading failed:");
                println!("{}", e);
                return Err(e);
            }
        };

        print!("Validating configuration... ");
        io::stdout().flush().unwrap();

        match ConfigValidator::new(&config).validate() {
            Ok(()) => {
                println!("valid");
                println!();
                println!("Configuration validation passed. Ready to use.");
            }
            Err(e) => {
                println!("invalid");
                println!();
                println!("Configuration validation failed:");
                println!("{}", e);
                return Err(e);
            }
        }

        print!("Checking port availability... ");
        io::stdout().flush().unwrap();
        match std::net::TcpListener::bind(format!("127.0.0.1:{}", config.server.port)) {
            Ok(_) => println!("port {} appears available", config.server.port),
            Err(_) => println!(
                "port {} may be in use (okay if another instance is running)",
                config.server.port
            ),
        }

        Ok(())
    }

    /// Handle the `config edit` command
    pub fn edit() -> Result<()> {
        let config_file = paths::user_config_file()?;

        if !config_file.exists() {
            println!("Configuration file doesn't exist. Creating example configuration...");

            let config_dir = config_file.parent().unwrap();
            fs::create_dir_all(config_dir).map_err(|e| {
                AdapterError::Config(format!(
                    "Failed to create config directory '{}': {}",
                    config_dir.display(),
                    e
                ))
            })?;

            let example_config = Config::example_toml();
            fs::write(&config_file, example_config).map_err(|e| {
                AdapterError::Config(format!("Failed to create example configuration: {}", e))
            })?;
        }

        let editor =
            std::env::var("EDITOR").or_else(|_| std::env::var("VISUAL")).unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else if cfg!(target_os = "macos") {
                    "open -e".to_string()
                } else {
                    "nano".to_string()
                }
            });

        println!("Opening configuration file in editor: {}", editor);
        println!("File: {}", config_file.display());
        println!();

        let editor_parts: Vec<&str> = editor.split_whitespace().collect();
        let (editor_cmd, editor_args) = if editor_parts.len() > 1 {
            (editor_parts[0], &editor_parts[1..])
        } else {
            (editor_parts[0], &[] as &[&str])
        };

        let mut command = Command::new(editor_cmd);
        command.args(editor_args);
        command.arg(&config_file);

        let status = command.status().map_err(|e| {
            AdapterError::Config(format!(
                "Failed to launch editor '{}': {}\n\
                 \n\
                 You can also edit the configuration file manually:\n\
                 {}\n\
                 \n\
                 Or set the EDITOR environment variable to your preferred editor.",
                editor,
                e,
                config_file.display()
            ))
        })?;

        if status.success() {
            println!("Editor closed successfully.");
            println!("Run 'claude-adapter config validate' to check your changes.");
        } else {
            println!("Editor exited with an error. Please check the configuration manually.");
        }

        Ok(())
    }

    /* --- private helper methods ---------------------------------------------------------- */

    /// Gather configuration through interactive prompts, starting from a provider preset.
    fn gather_config_interactively() -> Result<Config> {
        let mut config = Config::default();

        println!("Server Configuration");
        println!("====================");

        config.server.port = Self::prompt_number("HTTP server port", config.server.port, 1, 65535)?;

        config.server.log_level = Self::prompt_log_level(
            "Logging level (trace/debug/info/warn/error)",
            config.server.log_level,
        )?;

        println!();
        println!("Upstream Provider");
        println!("=================");
        println!("Available presets: {}", presets::get_provider_names().join(", "));

        let preset_name = Self::prompt_string_with_default("Provider preset", "", "custom")?;
        let preset = presets::get_provider_preset(&preset_name);

        if let Some(preset) = preset {
            for line in preset.guidance {
                println!("  - {}", line);
            }
            Self::apply_preset(&mut config.upstream, preset);
        } else {
            println!("Unknown preset '{}', falling back to a custom endpoint.", preset_name);
        }

        config.upstream.base_url =
            Self::prompt_string_with_default("Base URL", "", &config.upstream.base_url)?;

        if preset.map(|p| p.api_key_required).unwrap_or(true) {
            config.upstream.api_key = Self::prompt_string("API key", &config.upstream.api_key)?;
        }

        config.upstream.models.opus =
            Self::prompt_string_with_default("Model for opus tier", "", &config.upstream.models.opus)?;
        config.upstream.models.sonnet = Self::prompt_string_with_default(
            "Model for sonnet tier",
            "",
            &config.upstream.models.sonnet,
        )?;
        config.upstream.models.haiku = Self::prompt_string_with_default(
            "Model for haiku tier",
            "",
            &config.upstream.models.haiku,
        )?;

        config.upstream.tool_format = Self::prompt_tool_format(
            "Tool-calling format (native/xml)",
            config.upstream.tool_format,
        )?;

        Ok(config)
    }

    /// Seed an [`UpstreamConfig`] from a preset's defaults.
    fn apply_preset(upstream: &mut UpstreamConfig, preset: &ProviderPreset) {
        upstream.base_url = preset.base_url.to_string();
        upstream.tool_format = preset.default_tool_format;
        upstream.max_context_window = preset.max_context_window;
        upstream.models = ModelConfig {
            opus: preset.default_model_opus.to_string(),
            sonnet: preset.default_model_sonnet.to_string(),
            haiku: preset.default_model_haiku.to_string(),
        };
    }

    /// Prompt for a string value
    fn prompt_string(prompt: &str, current: &str) -> Result<String> {
        loop {
            if current.is_empty() {
                print!("{}: ", prompt);
            } else {
                print!("{} [{}]: ", prompt, current);
            }
            io::stdout().flush().unwrap();

            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .map_err(|e| AdapterError::Config(format!("Failed to read input: {}", e)))?;

            let input = input.trim();
            if input.is_empty() && !current.is_empty() {
                return Ok(current.to_string());
            } else if !input.is_empty() {
                return Ok(input.to_string());
            }

            println!("Please enter a value.");
        }
    }

    /// Prompt for a string value with a specific default
    fn prompt_string_with_default(prompt: &str, current: &str, default: &str) -> Result<String> {
        let display_current = if current.is_empty() { default } else { current };
        print!("{} [{}]: ", prompt, display_current);
        io::stdout().flush().unwrap();

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| AdapterError::Config(format!("Failed to read input: {}", e)))?;

        let input = input.trim();
        if input.is_empty() { Ok(display_current.to_string()) } else { Ok(input.to_string()) }
    }

    /// Prompt for a numeric value within range
    fn prompt_number<T>(prompt: &str, current: T, min: T, max: T) -> Result<T>
    where
        T: std::fmt::Display + std::str::FromStr + PartialOrd + Copy,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        loop {
            print!("{} ({}-{}) [{}]: ", prompt, min, max, current);
            io::stdout().flush().unwrap();

            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .map_err(|e| AdapterError::Config(format!("Failed to read input: {}", e)))?;

            let input = input.trim();
            if input.is_empty() {
                return Ok(current);
            }

            match input.parse::<T>() {
                Ok(value) => {
                    if value >= min && value <= max {
                        return Ok(value);
                    } else {
                        println!("Value must be between {} and {}.", min, max);
                    }
                }
                Err(e) => {
                    println!("Invalid number: {}", e);
                }
            }
        }
    }

    /// Prompt for a boolean value
    fn prompt_bool(prompt: &str, default: bool) -> Result<bool> {
        loop {
            let default_str = if default { "Y/n" } else { "y/N" };
            print!("{} ({}): ", prompt, default_str);
            io::stdout().flush().unwrap();

            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .map_err(|e| AdapterError::Config(format!("Failed to read input: {}", e)))?;

            let input = input.trim().to_lowercase();
            match input.as_str() {
                "" => return Ok(default),
                "y" | "yes" | "true" | "1" => return Ok(true),
                "n" | "no" | "false" | "0" => return Ok(false),
                _ => println!("Please enter y/yes or n/no."),
            }
        }
    }

    /// Prompt for log level
    fn prompt_log_level(prompt: &str, default: LogLevel) -> Result<LogLevel> {
        loop {
            print!("{} [{:?}]: ", prompt, default);
            io::stdout().flush().unwrap();

            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .map_err(|e| AdapterError::Config(format!("Failed to read input: {}", e)))?;

            let input = input.trim();
            if input.is_empty() {
                return Ok(default);
            }

            match LogLevel::from_str(input) {
                Ok(level) => return Ok(level),
                Err(_) => {
                    println!("Invalid log level. Valid options: trace, debug, info, warn, error");
                }
            }
        }
    }

    /// Prompt for tool-calling format
    fn prompt_tool_format(prompt: &str, default: ToolFormat) -> Result<ToolFormat> {
        loop {
            print!("{} [{:?}]: ", prompt, default);
            io::stdout().flush().unwrap();

            let mut input = String::new();
            io::stdin()
                .read_line(&mut input)
                .map_err(|e| AdapterError::Config(format!("Failed to read input: {}", e)))?;

            let input = input.trim();
            if input.is_empty() {
                return Ok(default);
            }

            match ToolFormat::from_str(input) {
                Ok(format) => return Ok(format),
                Err(_) => println!("Invalid tool format. Valid options: native, xml"),
            }
        }
    }

    /// Prompt for confirmation
    fn confirm(message: &str) -> Result<bool> {
        Self::prompt_bool(message, false)
    }
}

/* --- tests ------------------------------------------------------------------------------- */
