//! Integration tests for the Claude Adapter HTTP endpoints.
//!
//! Exercises the public `create_app` entry point end-to-end for both the
//! health check and request validation paths. These are lightweight (no
//! running server, no network) - full request/response translation against
//! a live upstream is covered by the converter unit tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use claude_adapter::config::{Config, ModelConfig, ServerConfig, ToolFormat, UpstreamConfig};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        server: ServerConfig { port: 3080, log_level: claude_adapter::config::LogLevel::Info },
        upstream: UpstreamConfig {
            base_url: "https://api.example.com/v1".to_string(),
            api_key: "sk-test".to_string(),
            models: ModelConfig {
                opus: "big-model".to_string(),
                sonnet: "mid-model".to_string(),
                haiku: "small-model".to_string(),
            },
            tool_format: ToolFormat::Native,
            max_context_window: Some(131072),
        },
    }
}

#[tokio::test]
async fn test_create_app_succeeds_with_valid_config() {
    let app = claude_adapter::create_app(test_config());
    assert!(app.is_ok(), "create_app should succeed with a valid config");
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let app = claude_adapter::create_app(test_config()).unwrap();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_messages_rejects_malformed_json() {
    let app = claude_adapter::create_app(test_config()).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/messages")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        response.headers().contains_key("x-request-id"),
        "error responses should still carry a request id"
    );
}

#[tokio::test]
async fn test_messages_rejects_missing_required_fields() {
    let app = claude_adapter::create_app(test_config()).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/messages")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"model": "claude-sonnet-4"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
