//!
//! HTTP client for the upstream OpenAI-compatible backend.
//!
//! A thin wrapper over [`reqwest::Client`]: attaches the Bearer token, posts to
//! `{base_url}/chat/completions`, and classifies non-2xx responses into
//! [`AdapterError::Upstream`].
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::time::Duration;

use reqwest::Client;

use crate::error::{AdapterError, Result};
use crate::model::openai::{ChatRequest, ChatResponse, UpstreamErrorEnvelope};

/* --- constants --------------------------------------------------------------------------------- */

/// Upstream HTTP client timeout, in seconds.
const HTTP_CLIENT_TIMEOUT_SECS: u64 = 300;

const CONTENT_TYPE_JSON: &str = "application/json";
const AUTHORIZATION_HEADER: &str = "Authorization";
const BEARER_PREFIX: &str = "Bearer ";

/* --- types ----------------------------------------------------------------------------------- */

///
/// Bearer-token-authenticated client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
            .build()
            .map_err(AdapterError::Request)?;

        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string(), api_key })
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send a non-streaming chat completion request, returning the parsed response.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self.post(request).await?;
        let response = validate_response(response).await?;
        response.json().await.map_err(AdapterError::Request)
    }

    /// Send a streaming chat completion request, returning the raw response for the
    /// caller to consume as a byte stream.
    pub async fn chat_completion_stream(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        let response = self.post(request).await?;
        validate_response(response).await
    }

    async fn post(&self, request: &ChatRequest) -> Result<reqwest::Response> {
        self.http
            .post(self.chat_completions_url())
            .header(AUTHORIZATION_HEADER, format!("{}{}", BEARER_PREFIX, self.api_key))
            .header("Content-Type", CONTENT_TYPE_JSON)
            .json(request)
            .send()
            .await
            .map_err(AdapterError::Request)
    }
}

async fn validate_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<UpstreamErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);

    tracing::error!(status, %message, "upstream request failed");
    Err(AdapterError::Upstream { status: Some(status), message })
}

/* --- tests ------------------------------------------------------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completions_url_strips_trailing_slash() {
        let client = UpstreamClient::new("https://api.example.com/v1/".to_string(), "key".to_string()).unwrap();
        assert_eq!(client.chat_completions_url(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_new_builds_without_error() {
        assert!(UpstreamClient::new("https://api.example.com/v1".to_string(), "key".to_string()).is_ok());
    }
}
