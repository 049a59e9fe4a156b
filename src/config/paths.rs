//!
//! Platform-native path resolution for Claude Adapter configuration.
//!
//! This module provides cross-platform path resolution following industry standards:
//! - Linux/Unix: XDG Base Directory Specification (~/.config, ~/.cache, ~/.local/share)
//! - macOS: Standard Application Support directories (~/Library/...)
//! - Windows: Known Folder system (%APPDATA%, %LOCALAPPDATA%)
//!
//! The config/cache/data directories above are platform-native. The usage and error
//! recorder logs, however, live at a single fixed location regardless of platform
//! (`~/.claude-adapter/token_usage/`, `~/.claude-adapter/error_logs/`) so that they are
//! easy to locate and tail manually.
//!
//! Follows Single Responsibility Principle - handles only path resolution concerns.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::error::{AdapterError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/* --- constants ------------------------------------------------------------------------------- */

/// Application name for directory resolution
const APP_NAME: &str = "claude-adapter";
/// Organization qualifier for directory resolution
const ORGANIZATION: &str = "com";
/// Organization name for directory resolution
const ORG_NAME: &str = "SkyCorp";
/// Fixed home-relative directory name for the usage/error recorders
const RECORDER_DIR_NAME: &str = ".claude-adapter";

/* --- public functions ------------------------------------------------------------------------ */

/// Get the user configuration directory for Claude Adapter
///
/// Returns the platform-appropriate configuration directory:
/// - Linux: ~/.config/claude-adapter/
/// - macOS: ~/Library/Application Support/claude-adapter/
/// - Windows: %APPDATA%/claude-adapter/
///
/// Creates the directory if it doesn't exist.
pub fn user_config_dir() -> Result<PathBuf> {
    let project_dirs = get_project_dirs()?;
    let config_dir = project_dirs.config_dir();

    ensure_directory_exists(config_dir)?;
    Ok(config_dir.to_path_buf())
}

/// Get the system configuration directory for Claude Adapter
///
/// Returns the platform-appropriate system-wide configuration directory:
/// - Linux: /etc/claude-adapter/
/// - macOS: /Library/Preferences/claude-adapter/
/// - Windows: %PROGRAMDATA%/claude-adapter/
///
/// Note: Does NOT create the directory (requires admin privileges)
pub fn system_config_dir() -> Result<PathBuf> {
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Ok(PathBuf::from("/etc").join(APP_NAME))
    }

    #[cfg(target_os = "macos")]
    {
        Ok(PathBuf::from("/Library/Preferences").join(APP_NAME))
    }

    #[cfg(windows)]
    {
        std::env::var("PROGRAMDATA").map(|path| PathBuf::from(path).join(APP_NAME)).map_err(|_| {
            AdapterError::Config("PROGRAMDATA environment variable not found".to_string())
        })
    }
}

/// Get the default user configuration file path
///
/// - Linux: ~/.config/claude-adapter/config.toml
/// - macOS: ~/Library/Application Support/claude-adapter/config.toml
/// - Windows: %APPDATA%/claude-adapter/config.toml
pub fn user_config_file() -> Result<PathBuf> {
    Ok(user_config_dir()?.join("config.toml"))
}

/// Get the system configuration file path
pub fn system_config_file() -> Result<PathBuf> {
    Ok(system_config_dir()?.join("config.toml"))
}

/// Expand tilde (~) in file paths
///
/// Supports tilde expansion for user home directory references. Also handles
/// Unix-style environment variable expansion.
pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path_str = path.as_ref().to_string_lossy();

    if path_str.starts_with("~/") {
        if let Some(dirs) = directories::UserDirs::new() {
            let expanded = dirs.home_dir().join(&path_str[2..]);
            return Ok(expanded);
        } else {
            return Err(AdapterError::Config(
                "Unable to determine user home directory for tilde expansion".to_string(),
            ));
        }
    }

    if path_str.contains('$') {
        let expanded = shellexpand::full(&path_str).map_err(|e| {
            AdapterError::Config(format!(
                "Failed to expand environment variables in path '{}': {}",
                path_str, e
            ))
        })?;
        return Ok(PathBuf::from(expanded.as_ref()));
    }

    Ok(path.as_ref().to_path_buf())
}

/// Check if a configuration file exists and is readable
pub fn validate_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AdapterError::Config(format!(
            "Configuration file '{}' does not exist",
            path.display()
        )));
    }

    if !path.is_file() {
        return Err(AdapterError::Config(format!(
            "Configuration path '{}' exists but is not a regular file",
            path.display()
        )));
    }

    std::fs::File::open(path).map_err(|e| {
        AdapterError::Config(format!(
            "Configuration file '{}' exists but cannot be read: {}\n\
             \n\
             Please check file permissions. The file should be readable by the current user.\n\
             You can fix this with: chmod 644 '{}'",
            path.display(),
            e,
            path.display()
        ))
    })?;

    Ok(())
}

/// Get all possible configuration file paths in precedence order
///
/// 1. User configuration file (~/.config/claude-adapter/config.toml)
/// 2. System configuration file (/etc/claude-adapter/config.toml)
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(user_config) = user_config_file() {
        paths.push(user_config);
    }

    if let Ok(system_config) = system_config_file() {
        paths.push(system_config);
    }

    paths
}

/// Fixed home directory used by the usage/error recorders, independent of platform
/// config-dir conventions: `~/.claude-adapter/`.
pub fn recorder_base_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new().ok_or_else(|| {
        AdapterError::Config("Unable to determine user home directory".to_string())
    })?;
    Ok(home.home_dir().join(RECORDER_DIR_NAME))
}

/// Directory where daily token-usage JSONL files are written.
pub fn token_usage_dir() -> Result<PathBuf> {
    let dir = recorder_base_dir()?.join("token_usage");
    ensure_directory_exists(&dir)?;
    Ok(dir)
}

/// Directory where daily error-log JSONL files are written.
pub fn error_log_dir() -> Result<PathBuf> {
    let dir = recorder_base_dir()?.join("error_logs");
    ensure_directory_exists(&dir)?;
    Ok(dir)
}

/* --- private functions ----------------------------------------------------------------------- */

/// Get ProjectDirs instance for Claude Adapter
fn get_project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(ORGANIZATION, ORG_NAME, APP_NAME).ok_or_else(|| {
        AdapterError::Config(
            "Unable to determine user directories. This may indicate:\n\
             1. No valid home directory found\n\
             2. Platform-specific directory resolution failed\n\
             3. Insufficient permissions to access user directories\n\
             \n\
             Please ensure your user account has a valid home directory."
                .to_string(),
        )
    })
}

/// Ensure a directory exists, creating it if necessary
fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        if !path.is_dir() {
            return Err(AdapterError::Config(format!(
                "Path '{}' exists but is not a directory",
                path.display()
            )));
        }
        return Ok(());
    }

    std::fs::create_dir_all(path).map_err(|e| {
        AdapterError::Config(format!(
            "Failed to create directory '{}': {}\n\
             \n\
             Please ensure:\n\
             1. You have write permissions to the parent directory\n\
             2. There's sufficient disk space\n\
             3. No conflicting files exist in the path",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/* --- tests ----------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_config_dir_creation() {
        let config_dir = user_config_dir().expect("Should get user config directory");
        assert!(config_dir.exists(), "Config directory should be created");
        assert!(config_dir.is_dir(), "Config path should be a directory");
    }

    #[test]
    fn test_user_config_file_path() {
        let config_file = user_config_file().expect("Should get config file path");
        assert!(config_file.file_name().unwrap() == "config.toml");
        assert!(config_file.parent().unwrap().exists(), "Parent directory should exist");
    }

    #[test]
    fn test_tilde_expansion() {
        let expanded = expand_path("~/test/path").expect("Should expand tilde");
        assert!(!expanded.to_string_lossy().contains('~'), "Tilde should be expanded");

        let absolute = expand_path("/absolute/path").expect("Should handle absolute path");
        assert_eq!(absolute, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_validate_config_file() {
        let result = validate_config_file("/non/existent/file.toml");
        assert!(result.is_err());

        let temp_dir = TempDir::new().unwrap();
        let temp_file = temp_dir.path().join("test.toml");
        fs::write(&temp_file, "test content").unwrap();

        let result = validate_config_file(&temp_file);
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_file_paths_order() {
        let paths = config_file_paths();
        assert!(!paths.is_empty(), "Should return at least one config path");

        if paths.len() > 1 {
            let user_path = &paths[0];
            assert!(
                user_path.to_string_lossy().contains("config"),
                "First path should be user config"
            );
        }
    }

    #[test]
    fn test_recorder_dirs_under_fixed_home_path() {
        let usage_dir = token_usage_dir().expect("should resolve token usage dir");
        assert!(usage_dir.ends_with("token_usage"));
        assert!(usage_dir.to_string_lossy().contains(".claude-adapter"));

        let error_dir = error_log_dir().expect("should resolve error log dir");
        assert!(error_dir.ends_with("error_logs"));
    }
}
