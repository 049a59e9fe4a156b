//!
//! Axum HTTP server: the `/v1/messages` request handler and its streaming path.
//!
//! Implements the request lifecycle end to end: assign a request id, parse and
//! validate the body, resolve the model/tool format, translate to the upstream
//! wire format, call upstream, translate the response back, and record usage
//! or error telemetry. Streaming responses are re-framed chunk by chunk as they
//! arrive rather than buffered.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::client::UpstreamClient;
use crate::config::Config;
use crate::converter::{RequestConverter, ResponseConverter, StreamReframer, response, tools};
use crate::error::AdapterError;
use crate::model::anthropic::{MessageRequest, MessageResponse};
use crate::model::openai::ChatRequest;
use crate::recorder::{self, ErrorRecord, ErrorRecordBody, UsageRecord};
use crate::validator;

/* --- constants --------------------------------------------------------------------------------- */

/// Backpressure buffer between the upstream byte stream and the outgoing SSE channel.
const STREAMING_CHANNEL_BUFFER: usize = 100;

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/* --- app state --------------------------------------------------------------------------------- */

pub struct AppState {
    pub config: Config,
    pub client: UpstreamClient,
    request_converter: RequestConverter,
    response_converter: ResponseConverter,
}

impl AppState {
    pub fn new(config: Config) -> crate::error::Result<Self> {
        let client =
            UpstreamClient::new(config.upstream.base_url.clone(), config.upstream.api_key.clone())?;
        let request_converter = RequestConverter::new(
            config.server.log_level,
            config.upstream.tool_format,
            config.upstream.max_context_window,
        );
        Ok(Self { config, client, request_converter, response_converter: ResponseConverter::new() })
    }
}

/* --- handlers ---------------------------------------------------------------------------------- */

/// `GET /health` — liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// `POST /v1/messages` — the Anthropic Messages API entry point.
pub async fn messages(State(state): State<Arc<AppState>>, body: axum::body::Bytes) -> Response {
    let request_id = tools::generate_request_id();

    let body: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            return error_response(&request_id, AdapterError::Validation(e.to_string()));
        }
    };

    let errors = validator::validate_request(&body);
    if !errors.is_empty() {
        return error_response(
            &request_id,
            AdapterError::Validation(validator::format_validation_errors(&errors)),
        );
    }

    let request: MessageRequest = match serde_json::from_value(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(&request_id, AdapterError::Validation(e.to_string()));
        }
    };

    let requested_model = request.model.clone();
    let streaming = request.stream.unwrap_or(false);
    let target_model = validator::resolve_model(&requested_model, &state.config.upstream.models);
    let system_text = request.system.as_ref().map(|s| s.joined());

    let converted = state.request_converter.convert(&request, &target_model, system_text.as_deref());
    let chat_request = state.request_converter.build_chat_request(&request, &target_model, converted);

    if streaming {
        handle_streaming(state, request_id, requested_model, chat_request).await
    } else {
        handle_non_streaming(state, request_id, requested_model, chat_request).await
    }
}

async fn handle_non_streaming(
    state: Arc<AppState>,
    request_id: String,
    requested_model: String,
    chat_request: ChatRequest,
) -> Response {
    match state.client.chat_completion(&chat_request).await {
        Ok(chat_response) => {
            recorder::record_usage(&UsageRecord {
                timestamp: chrono::Utc::now().to_rfc3339(),
                provider: state.config.upstream.base_url.clone(),
                requested_model: requested_model.clone(),
                concrete_model: chat_request.model.clone(),
                input_tokens: chat_response.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
                output_tokens: chat_response.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
                cached_input_tokens: chat_response
                    .usage
                    .as_ref()
                    .and_then(|u| u.prompt_tokens_details.as_ref())
                    .and_then(|d| d.cached_tokens),
                streaming: false,
            });

            let message: MessageResponse = state.response_converter.convert(chat_response, &requested_model);
            with_request_id(&request_id, (StatusCode::OK, Json(message)).into_response())
        }
        Err(e) => {
            record_error(&state, &request_id, &requested_model, false, &e);
            error_response(&request_id, e)
        }
    }
}

async fn handle_streaming(
    state: Arc<AppState>,
    request_id: String,
    requested_model: String,
    chat_request: ChatRequest,
) -> Response {
    let upstream = match state.client.chat_completion_stream(&chat_request).await {
        Ok(response) => response,
        Err(e) => {
            record_error(&state, &request_id, &requested_model, true, &e);
            return error_response(&request_id, e);
        }
    };

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(STREAMING_CHANNEL_BUFFER);
    let concrete_model = chat_request.model.clone();
    let request_id_for_task = request_id.clone();

    tokio::spawn(async move {
        let mut reframer = StreamReframer::new(request_id_for_task.clone(), requested_model.clone());
        if tx.send(Ok(sse_event(&reframer.start()))).await.is_err() {
            return;
        }

        let mut byte_stream = upstream.bytes_stream();
        let mut buffer = String::new();
        let mut stream_failed = false;

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    stream_failed = true;
                    tracing::warn!("upstream stream read failed: {}", e);
                    break;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            while let Some(pos) = buffer.find('\n') {
                let line: String = buffer.drain(..=pos).collect();
                for event in reframer.process_line(line.trim_end_matches('\n')) {
                    if tx.send(Ok(sse_event(&event))).await.is_err() {
                        return;
                    }
                }
            }
        }

        if !buffer.is_empty() {
            for event in reframer.process_line(&buffer) {
                let _ = tx.send(Ok(sse_event(&event))).await;
            }
        }

        for event in reframer.finish() {
            let _ = tx.send(Ok(sse_event(&event))).await;
        }

        if stream_failed {
            recorder::record_error(&ErrorRecord {
                timestamp: chrono::Utc::now().to_rfc3339(),
                request_id: request_id_for_task,
                provider: state.config.upstream.base_url.clone(),
                requested_model,
                streaming: true,
                error: ErrorRecordBody {
                    message: "upstream stream ended unexpectedly".to_string(),
                    status: None,
                    error_type: None,
                },
            });
        } else {
            let usage = reframer.usage();
            recorder::record_usage(&UsageRecord {
                timestamp: chrono::Utc::now().to_rfc3339(),
                provider: state.config.upstream.base_url.clone(),
                requested_model,
                concrete_model,
                input_tokens: usage.map(|u| u.input_tokens).unwrap_or(0),
                output_tokens: usage.map(|u| u.output_tokens).unwrap_or(0),
                cached_input_tokens: usage.and_then(|u| u.cache_read_input_tokens),
                streaming: true,
            });
        }
    });

    let stream = ReceiverStream::new(rx);
    with_request_id(&request_id, Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}

/* --- helpers ----------------------------------------------------------------------------------- */

/// `StreamReframer` emits fully-framed `event: ...\ndata: ...\n\n` strings; pull both
/// lines back out since axum's `Sse`/`Event` does its own framing from `.event()`/`.data()`.
fn sse_event(framed_event: &str) -> Event {
    let event_type = framed_event
        .lines()
        .find_map(|line| line.strip_prefix("event: ").or_else(|| line.strip_prefix("event:")));
    let data = framed_event
        .lines()
        .find_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .unwrap_or(framed_event);
    let mut event = Event::default().data(data);
    if let Some(event_type) = event_type {
        event = event.event(event_type);
    }
    event
}

fn with_request_id(request_id: &str, mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn record_error(state: &AppState, request_id: &str, requested_model: &str, streaming: bool, error: &AdapterError) {
    recorder::record_error(&ErrorRecord {
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id: request_id.to_string(),
        provider: state.config.upstream.base_url.clone(),
        requested_model: requested_model.to_string(),
        streaming,
        error: ErrorRecordBody {
            message: error.to_string(),
            status: Some(error.http_status()),
            error_type: Some(error.anthropic_error_type().to_string()),
        },
    });
}

fn error_response(request_id: &str, error: AdapterError) -> Response {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response::create_error_response(&error);
    with_request_id(request_id, (status, Json(body)).into_response())
}
