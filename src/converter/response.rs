//!
//! Non-streaming OpenAI-compatible to Anthropic response converter.
//!
//! Converts an upstream chat completion response into an Anthropic `MessageResponse`,
//! and builds the shared `ErrorResponse` envelope used by both the non-streaming and
//! streaming paths.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use serde_json::Value;

use crate::error::AdapterError;
use crate::model::anthropic::{ContentBlock, ErrorResponse, MessageResponse, StopReason, Usage};
use crate::model::openai::ChatResponse;

/* --- start of code -------------------------------------------------------------------------- */

///
/// Converts non-streaming upstream chat completions into Anthropic message responses.
pub struct ResponseConverter;

impl ResponseConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert an upstream completion into the Anthropic response, echoing `requested_model`
    /// as the `model` field (the client-requested name, not the resolved upstream one).
    pub fn convert(&self, response: ChatResponse, requested_model: &str) -> MessageResponse {
        let choice = response.choices.into_iter().next();
        let mut content = Vec::new();

        if let Some(choice) = &choice {
            if let Some(message) = &choice.message {
                if let Some(text) = &message.content {
                    if !text.is_empty() {
                        content.push(ContentBlock::Text { text: text.clone() });
                    }
                }

                if let Some(tool_calls) = &message.tool_calls {
                    for call in tool_calls {
                        let input = serde_json::from_str::<Value>(&call.function.arguments)
                            .unwrap_or_else(|_| serde_json::json!({"raw": call.function.arguments}));
                        content.push(ContentBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.function.name.clone(),
                            input,
                        });
                    }
                }
            }
        }

        let stop_reason = choice.as_ref().and_then(|c| map_stop_reason(c.finish_reason.as_deref()));

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                cache_read_input_tokens: u.prompt_tokens_details.and_then(|d| d.cached_tokens),
            })
            .unwrap_or_default();

        MessageResponse {
            id: format!("msg_{}", response.id),
            response_type: "message",
            role: "assistant",
            content,
            model: requested_model.to_string(),
            stop_reason,
            stop_sequence: None,
            usage,
        }
    }
}

impl Default for ResponseConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn map_stop_reason(finish_reason: Option<&str>) -> Option<StopReason> {
    match finish_reason {
        Some("stop") => Some(StopReason::EndTurn),
        Some("length") => Some(StopReason::MaxTokens),
        Some("tool_calls") => Some(StopReason::ToolUse),
        Some("content_filter") => Some(StopReason::EndTurn),
        Some(_) => Some(StopReason::EndTurn),
        None => None,
    }
}

/// Build the Anthropic error envelope for a given error, reusing the error's own
/// classification rather than duplicating the status-to-type mapping here.
pub fn create_error_response(error: &AdapterError) -> ErrorResponse {
    ErrorResponse::new(error.anthropic_error_type(), error.to_string())
}

/* --- tests ------------------------------------------------------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::openai::{Choice, ChatMessage, PromptTokensDetails, Usage as OaiUsage};

    fn response_with(message: ChatMessage, finish_reason: Option<&str>) -> ChatResponse {
        ChatResponse {
            id: "chatcmpl-abc123".to_string(),
            choices: vec![Choice { message: Some(message), finish_reason: finish_reason.map(String::from) }],
            usage: Some(OaiUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                prompt_tokens_details: Some(PromptTokensDetails { cached_tokens: Some(3) }),
            }),
        }
    }

    #[test]
    fn test_text_only_response_converts_to_single_text_block() {
        let message = ChatMessage {
            role: "assistant".to_string(),
            content: Some("hello".to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        };
        let converted = ResponseConverter::new().convert(response_with(message, Some("stop")), "claude-opus-4");
        assert_eq!(converted.content.len(), 1);
        assert!(matches!(&converted.content[0], ContentBlock::Text { text } if text == "hello"));
        assert_eq!(converted.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(converted.model, "claude-opus-4");
    }

    #[test]
    fn test_tool_calls_produce_tool_use_blocks_with_parsed_input() {
        let message = ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![crate::model::openai::ToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: crate::model::openai::FunctionCall {
                    name: "get_weather".to_string(),
                    arguments: r#"{"location":"Warsaw"}"#.to_string(),
                },
            }]),
            tool_call_id: None,
            name: None,
        };
        let converted = ResponseConverter::new().convert(response_with(message, Some("tool_calls")), "claude-sonnet-4");
        assert_eq!(converted.content.len(), 1);
        match &converted.content[0] {
            ContentBlock::ToolUse { name, input, .. } => {
                assert_eq!(name, "get_weather");
                assert_eq!(input["location"], "Warsaw");
            }
            _ => panic!("expected tool_use block"),
        }
        assert_eq!(converted.stop_reason, Some(StopReason::ToolUse));
    }

    #[test]
    fn test_unparseable_tool_arguments_fall_back_to_raw_wrapper() {
        let message = ChatMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![crate::model::openai::ToolCall {
                id: "call_1".to_string(),
                call_type: "function".to_string(),
                function: crate::model::openai::FunctionCall {
                    name: "broken".to_string(),
                    arguments: "not json".to_string(),
                },
            }]),
            tool_call_id: None,
            name: None,
        };
        let converted = ResponseConverter::new().convert(response_with(message, None), "claude-haiku-4.5");
        match &converted.content[0] {
            ContentBlock::ToolUse { input, .. } => assert_eq!(input["raw"], "not json"),
            _ => panic!("expected tool_use block"),
        }
        assert_eq!(converted.stop_reason, None);
    }

    #[test]
    fn test_usage_maps_cached_tokens() {
        let message = ChatMessage {
            role: "assistant".to_string(),
            content: Some("hi".to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        };
        let converted = ResponseConverter::new().convert(response_with(message, Some("stop")), "claude-opus-4");
        assert_eq!(converted.usage.input_tokens, 10);
        assert_eq!(converted.usage.output_tokens, 5);
        assert_eq!(converted.usage.cache_read_input_tokens, Some(3));
    }

    #[test]
    fn test_length_finish_reason_maps_to_max_tokens() {
        assert_eq!(map_stop_reason(Some("length")), Some(StopReason::MaxTokens));
    }

    #[test]
    fn test_create_error_response_reuses_error_classification() {
        let err = AdapterError::Validation("bad field".to_string());
        let response = create_error_response(&err);
        assert_eq!(response.error.error_type, "invalid_request_error");
    }
}
