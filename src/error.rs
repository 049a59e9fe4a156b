//!
//! Error handling for the Claude Adapter gateway.
//!
//! Defines all error types used throughout the application using thiserror
//! for ergonomic error handling. Follows Rust best practices for error design.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use thiserror::Error;

/* --- types ----------------------------------------------------------------------------------- */

///
/// Application error types following Rust best practices.
///
/// Covers all possible error conditions that can occur during adapter operation.
/// Uses thiserror for automatic Display and Error trait implementations.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream error ({status:?}): {message}")]
    Upstream { status: Option<u16>, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/* --- start of code -------------------------------------------------------------------------- */

/// Result type alias for cleaner error handling throughout the application
pub type Result<T> = std::result::Result<T, AdapterError>;

impl AdapterError {
    /// Map this error to the Anthropic `error.type` string used in error responses.
    ///
    /// Mirrors the status-code-driven mapping used by the Anthropic Messages API:
    /// 400 -> invalid_request_error, 401 -> authentication_error, 403 -> permission_error,
    /// 404 -> not_found_error, 429 -> rate_limit_error, 500.. -> api_error.
    pub fn anthropic_error_type(&self) -> &'static str {
        match self {
            AdapterError::Validation(_) => "invalid_request_error",
            AdapterError::Upstream { status, .. } => match status {
                Some(400) => "invalid_request_error",
                Some(401) => "authentication_error",
                Some(403) => "permission_error",
                Some(404) => "not_found_error",
                Some(429) => "rate_limit_error",
                _ => "api_error",
            },
            AdapterError::Config(_) | AdapterError::Serialization(_) | AdapterError::Io(_) => {
                "api_error"
            }
            AdapterError::Request(_) => "api_error",
        }
    }

    /// HTTP status code to answer the client with.
    pub fn http_status(&self) -> u16 {
        match self {
            AdapterError::Validation(_) => 400,
            AdapterError::Upstream { status, .. } => status.unwrap_or(500),
            _ => 500,
        }
    }
}
