//! # Claude Adapter
//!
//! A gateway server that translates Anthropic Messages API requests into
//! OpenAI-compatible chat completion calls, letting Claude Code and other
//! Anthropic-API clients talk to any OpenAI-compatible backend.
//!
//! ## Features
//!
//! - **Anthropic-compatible API**: implements `POST /v1/messages` for clients
//!   built against the Anthropic Messages API.
//! - **Tool/Function Calling**: native OpenAI `tools`/`tool_choice`, or an
//!   XML-emulated contract for upstreams without native function calling.
//! - **Streaming Support**: Server-Sent Events, re-framed chunk by chunk.
//! - **Context-window-aware requests**: caps `max_tokens` and trims/truncates
//!   the prompt to fit a configured upstream context window.
//! - **Structured logging**: tracing-based, configurable verbosity.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use claude_adapter::{Config, create_app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let app = create_app(config)?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Claude Adapter uses a layered configuration system:
//!
//! 1. **Configuration file**:
//! ```toml
//! # ~/.config/claude-adapter/config.toml (Linux)
//!
//! [server]
//! port = 3080
//! log_level = "info"
//!
//! [upstream]
//! base_url = "https://api.moonshot.cn/v1"
//! api_key = "sk-..."
//! tool_format = "native"
//!
//! [upstream.models]
//! opus = "kimi-k2.5"
//! sonnet = "kimi-k2.5"
//! haiku = "kimi-k2.5"
//! ```
//!
//! 2. **Environment variables** (`CLAUDE_ADAPTER_*` prefix).
//! 3. **CLI setup**: `claude-adapter config init|show|validate|edit`.
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.
//!
//! Authors: Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- modules --------------------------------------------------------------------------------- */

pub mod client;
pub mod config;
pub mod converter;
pub mod error;
pub mod model;
pub mod recorder;
pub mod server;
pub mod validator;

/* --- uses ------------------------------------------------------------------------------------ */

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/* --- re-exports -------------------------------------------------------------------------------- */

pub use config::Config;
pub use error::{AdapterError, Result};
pub use server::AppState;

/* --- start of code -------------------------------------------------------------------------- */

///
/// Build the Axum application: routes, middleware, and shared state.
///
/// # Arguments
///  * `config` - application configuration
///
/// # Returns
///  * Configured Axum router ready to serve
///  * `AdapterError` if application state (e.g. the upstream HTTP client) fails to build
pub fn create_app(config: Config) -> Result<Router> {
    let app_state = Arc::new(AppState::new(config)?);

    Ok(Router::new()
        .route("/v1/messages", post(server::messages))
        .route("/health", get(server::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state))
}
