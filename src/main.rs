//! # Claude Adapter - Anthropic to OpenAI-compatible gateway
//!
//! Binary entry point. Loads configuration, sets up logging, and starts the
//! Axum HTTP server. Also handles the `config` subcommand family.
//!
//! Authors: Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::env;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use claude_adapter::config::{Config, cli::ConfigCli};
use claude_adapter::error::Result;
use claude_adapter::server::{self, AppState};

/* --- constants ------------------------------------------------------------------------------ */

const VERSION: &str = env!("CARGO_PKG_VERSION");

/* --- start of code -------------------------------------------------------------------------- */

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if std::path::Path::new(".env").exists() {
            eprintln!("Warning: Could not load .env file: {}", e);
        }
    }

    if let Some(exit_code) = handle_cli_args().await {
        std::process::exit(exit_code);
    }

    if let Err(e) = run().await {
        let error_msg = format!("{}", e);
        eprintln!("Error:");
        for line in error_msg.lines() {
            eprintln!("{}", line);
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = initialize_config()?;
    initialize_logging(&config);

    let app_state = Arc::new(AppState::new(config.clone())?);
    let app = create_router(app_state);

    start_server(&config, app).await
}

///
/// Handle command line arguments like --version and --help before config loading.
///
/// Returns `Some(exit_code)` if the program should exit, `None` to continue.
async fn handle_cli_args() -> Option<i32> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        return None;
    }

    match args[1].as_str() {
        "--version" | "-V" => {
            println!("claude-adapter {}", VERSION);
            Some(0)
        }
        "--help" | "-h" => {
            print_help();
            Some(0)
        }
        "config" => handle_config_command(&args[2..]).await,
        _ => {
            if args[1].starts_with('-') {
                eprintln!("Error: Unknown option: {}", args[1]);
                eprintln!();
                print_help();
                Some(1)
            } else {
                eprintln!("Error: Unknown command: {}", args[1]);
                eprintln!();
                eprintln!("Available commands:");
                eprintln!("  config    - Configuration management");
                eprintln!();
                eprintln!("Available options:");
                eprintln!("  --version, -V  - Show version");
                eprintln!("  --help, -h     - Show help");
                eprintln!();
                eprintln!("Run 'claude-adapter --help' for more information.");
                Some(1)
            }
        }
    }
}

///
/// Handle `config` subcommands.
async fn handle_config_command(args: &[String]) -> Option<i32> {
    if args.is_empty() {
        eprintln!("Error: Missing config subcommand");
        eprintln!();
        print_config_help();
        return Some(1);
    }

    let result = match args[0].as_str() {
        "init" => ConfigCli::init(),
        "show" => ConfigCli::show(),
        "validate" => ConfigCli::validate(),
        "edit" => ConfigCli::edit(),
        "--help" | "-h" => {
            print_config_help();
            return Some(0);
        }
        _ => {
            eprintln!("Error: Unknown config subcommand: {}", args[0]);
            eprintln!();
            print_config_help();
            return Some(1);
        }
    };

    match result {
        Ok(_) => Some(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            Some(1)
        }
    }
}

fn print_config_help() {
    println!("Claude Adapter Configuration Management");
    println!();
    println!("USAGE:");
    println!("    claude-adapter config <SUBCOMMAND>");
    println!();
    println!("SUBCOMMANDS:");
    println!("    init        Interactive configuration setup");
    println!("    show        Display current configuration");
    println!("    validate    Validate configuration");
    println!("    edit        Edit configuration file in default editor");
    println!("    help        Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    claude-adapter config init        # Set up configuration interactively");
    println!("    claude-adapter config show        # Show current configuration");
    println!("    claude-adapter config validate    # Check configuration validity");
    println!("    claude-adapter config edit        # Open config file in editor");
}

fn print_help() {
    println!("Claude Adapter v{}", VERSION);
    println!("Gateway translating Anthropic Messages API requests into OpenAI-compatible chat completions");
    println!();
    println!("USAGE:");
    println!("    claude-adapter [COMMAND] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    config              Configuration management (init, show, validate, edit)");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help          Print help information");
    println!("    -V, --version       Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    Claude Adapter uses a layered configuration system:");
    println!("    1. Configuration files (TOML format in standard directories)");
    println!("    2. Environment variables (CLAUDE_ADAPTER_* prefix)");
    println!("    3. Built-in defaults");
    println!();
    println!("    Run 'claude-adapter config init' to set up configuration interactively.");
    println!("    Run 'claude-adapter config --help' for configuration management help.");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    CLAUDE_ADAPTER_SERVER_PORT          Server port (default: 3080)");
    println!("    CLAUDE_ADAPTER_SERVER_LOG_LEVEL      trace, debug, info, warn, error (default: info)");
    println!("    CLAUDE_ADAPTER_UPSTREAM_BASE_URL      Base URL of the OpenAI-compatible backend");
    println!("    CLAUDE_ADAPTER_UPSTREAM_API_KEY       Bearer token for the upstream backend");
    println!("    CLAUDE_ADAPTER_UPSTREAM_TOOL_FORMAT   native or xml");
    println!();
    println!("EXAMPLES:");
    println!("    claude-adapter                    Start the gateway server");
    println!("    claude-adapter config validate    Validate configuration");
    println!();
    println!("For more information, visit: https://github.com/yarenty/claude-adapter");
}

///
/// Initialize configuration from the standard hierarchy (files, env vars, defaults).
fn initialize_config() -> Result<Config> {
    Config::load()
}

///
/// Initialize logging based on configuration settings.
fn initialize_logging(config: &Config) {
    let level = config.server.log_level.to_tracing_level();
    tracing_subscriber::fmt().with_max_level(level).with_target(false).init();
}

///
/// Create the Axum router with all routes and middleware.
fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/messages", post(server::messages))
        .route("/health", get(server::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

///
/// Bind the configured port and serve. Produces a helpful message if the port is in use.
async fn start_server(config: &Config, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port))
        .await
        .map_err(|e| {
            let error_msg = format!("Failed to bind to port {}: {}", config.server.port, e);
            let error_str = e.to_string();

            if error_str.contains("Address already in use")
                || error_str.contains("address already in use")
            {
                let suggestions = format!(
                    "{}\n\n\
                        Port {} is already in use. Here are some solutions:\n\n\
                        1. Close the other instance:\n\
                           • Find the process using port {}:\n\
                             lsof -i :{}\n\
                           • Kill the process:\n\
                             kill -9 <PID>\n\n\
                        2. Change the port:\n\
                           export CLAUDE_ADAPTER_SERVER_PORT=3081\n\
                           claude-adapter",
                    error_msg, config.server.port, config.server.port, config.server.port
                );
                claude_adapter::AdapterError::Config(suggestions)
            } else {
                claude_adapter::AdapterError::Config(format!(
                    "{}\n\n\
                        To fix this:\n\
                        • Check if the port is valid (1-65535)\n\
                        • Ensure you have permission to bind to the port\n\
                        • Try a different port: export CLAUDE_ADAPTER_SERVER_PORT=3081",
                    error_msg
                ))
            }
        })?;

    log_startup_info(config);

    axum::serve(listener, app)
        .await
        .map_err(|e| claude_adapter::AdapterError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

fn log_startup_info(config: &Config) {
    info!("Claude Adapter v{} running on port {}", VERSION, config.server.port);
    info!("Anthropic-compatible endpoint: http://localhost:{}/v1/messages", config.server.port);
    info!("Upstream: {} (tool_format={:?})", config.upstream.base_url, config.upstream.tool_format);

    if matches!(
        config.server.log_level,
        claude_adapter::config::LogLevel::Trace | claude_adapter::config::LogLevel::Debug
    ) {
        info!(
            "Trace logging is ENABLED (log_level={:?}) - request/response payloads will be logged",
            config.server.log_level
        );
    }
}
