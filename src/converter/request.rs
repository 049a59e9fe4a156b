//!
//! Anthropic to OpenAI-compatible request converter.
//!
//! Converts a validated Anthropic `/v1/messages` request into the upstream
//! `ChatRequest`, handling system-prompt branding, assistant-prefill stripping,
//! tool-call id deduplication, tool-format branching (native vs XML), and the
//! context-window-driven prompt-fitting algorithm.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::{LogLevel, ToolFormat};
use crate::converter::tools::{
    self, IdDeduplicationContext, convert_tool_choice_to_openai, convert_tools_to_openai,
};
use crate::model::anthropic::{ContentBlock, Message, MessageContent, MessageRequest, Role};
use crate::model::openai::{ChatMessage, ChatRequest, StreamOptions};

/* --- constants --------------------------------------------------------------------------------- */

/// Identifier string this gateway recognizes and rebrands in the system prompt.
const CLAUDE_CODE_IDENTIFIER: &str = "You are Claude Code, Anthropic's official CLI for Claude.";

/// Replacement used when the identifier above is present.
const ADAPTER_IDENTIFIER: &str =
    "You are an AI coding assistant, accessed through claude-adapter, a protocol gateway in front of an OpenAI-compatible model.";

/// Prefill tokens short enough, or recognizable enough, to be unsupported upstream.
const PREFILL_SHORTLIST: &[&str] = &["{", "[", "```", "{\"", "[{", "<", "<tool_code", "<tool_code>"];

/// Framing reserve subtracted from the context window, in tokens.
const CONTEXT_RESERVE_TOKENS: u32 = 256;

/// Floor applied to the effective completion budget after capping against the window.
const MIN_COMPLETION_BUDGET: u32 = 256;

/// `max_tokens == 1` is rewritten to this value; some upstreams reject `max_tokens=1`.
const MIN_TOKENS_REWRITE: i64 = 32;

/// Conservative characters-per-token ratio used by the token estimator.
const CHARS_PER_TOKEN_NUMERATOR: usize = 2;
const CHARS_PER_TOKEN_DENOMINATOR: usize = 5;

/// Separate, more conservative ratio used only for the oversized-system-prompt
/// truncation fallback, so the cutoff never over-estimates how much fits.
const SYSTEM_TRUNCATION_CHARS_PER_TOKEN: usize = 2;

/// Fixed per-block overhead charged for structured (non-text) content parts.
const STRUCTURED_BLOCK_OVERHEAD_TOKENS: u32 = 2;

/* --- types ----------------------------------------------------------------------------------- */

///
/// Converts Anthropic `/v1/messages` requests into upstream OpenAI-compatible requests.
pub struct RequestConverter {
    log_level: LogLevel,
    tool_format: ToolFormat,
    max_context_window: Option<u32>,
}

/// One flattened message plus whether it originated as a `system` message, kept
/// separate so context fitting can distinguish system from non-system messages.
struct PendingMessage {
    message: ChatMessage,
    is_system: bool,
}

impl RequestConverter {
    pub fn new(log_level: LogLevel, tool_format: ToolFormat, max_context_window: Option<u32>) -> Self {
        Self { log_level, tool_format, max_context_window }
    }

    /// Convert a validated request into the upstream chat completion request.
    ///
    /// `target_model` is the already-resolved upstream model name (see
    /// [`crate::validator::resolve_model`]); `system_text` is the flattened system
    /// prompt, if any.
    pub fn convert(
        &self,
        request: &MessageRequest,
        target_model: &str,
        system_text: Option<&str>,
    ) -> Vec<ChatMessage> {
        let mut dedup = IdDeduplicationContext::new();
        let mut pending = Vec::new();

        if let Some(system_text) = system_text {
            let rebranded = self.rebrand_system_text(system_text);
            if !rebranded.is_empty() {
                pending.push(PendingMessage {
                    message: ChatMessage {
                        role: "system".to_string(),
                        content: Some(rebranded),
                        tool_calls: None,
                        tool_call_id: None,
                        name: None,
                    },
                    is_system: true,
                });
            }
        }

        if self.tool_format == ToolFormat::Xml {
            if let Some(tools) = request.tools.as_deref() {
                let contract = tools::generate_xml_tool_instructions(tools);
                if !contract.is_empty() {
                    pending.push(PendingMessage {
                        message: ChatMessage {
                            role: "system".to_string(),
                            content: Some(contract),
                            tool_calls: None,
                            tool_call_id: None,
                            name: None,
                        },
                        is_system: true,
                    });
                }
            }
        }

        for message in &request.messages {
            self.convert_message(message, &mut dedup, &mut pending);
        }

        let _ = target_model;
        pending.into_iter().map(|p| p.message).collect()
    }

    /// Build the final upstream `ChatRequest`, applying parameter mapping and, when a
    /// finite context window is configured, the prompt-fitting algorithm.
    pub fn build_chat_request(
        &self,
        request: &MessageRequest,
        target_model: &str,
        messages: Vec<ChatMessage>,
    ) -> ChatRequest {
        let stream = request.stream.unwrap_or(false);
        let mut max_tokens = request.max_tokens;
        if max_tokens == 1 {
            max_tokens = MIN_TOKENS_REWRITE;
        }

        let temperature = if self.tool_format == ToolFormat::Xml { Some(0.0) } else { request.temperature };

        let (max_tokens, messages) = match self.max_context_window {
            Some(window) => self.fit_to_context_window(window, max_tokens, messages),
            None => (max_tokens, messages),
        };

        ChatRequest {
            model: target_model.to_string(),
            messages,
            max_tokens,
            stream,
            stream_options: if stream { Some(StreamOptions { include_usage: true }) } else { None },
            temperature,
            top_p: request.top_p,
            stop: request.stop_sequences.clone(),
            tools: request.tools.as_deref().filter(|_| self.tool_format == ToolFormat::Native).map(convert_tools_to_openai),
            tool_choice: request
                .tool_choice
                .as_ref()
                .filter(|_| self.tool_format == ToolFormat::Native)
                .map(convert_tool_choice_to_openai),
        }
    }

    fn convert_message(
        &self,
        message: &Message,
        dedup: &mut IdDeduplicationContext,
        pending: &mut Vec<PendingMessage>,
    ) {
        match message.role {
            Role::User => self.convert_user_message(message, dedup, pending),
            Role::Assistant => self.convert_assistant_message(message, dedup, pending),
        }
    }

    fn convert_user_message(
        &self,
        message: &Message,
        dedup: &mut IdDeduplicationContext,
        pending: &mut Vec<PendingMessage>,
    ) {
        match &message.content {
            MessageContent::Text(text) => {
                pending.push(self.user_text_message(text.clone()));
            }
            MessageContent::Blocks(blocks) => {
                let mut text_parts = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::Text { text } => text_parts.push(text.clone()),
                        ContentBlock::ToolResult { tool_use_id, content, is_error } => {
                            let resolved_id = dedup.resolve_result_id(tool_use_id);
                            let body = content.as_ref().map(|c| c.as_text()).unwrap_or_default();
                            let body = if *is_error { format!("Error: {}", body) } else { body };

                            if self.tool_format == ToolFormat::Xml {
                                text_parts.push(format!("<tool_output>\n{}\n</tool_output>", body));
                            } else {
                                pending.push(PendingMessage {
                                    message: ChatMessage {
                                        role: "tool".to_string(),
                                        content: Some(body),
                                        tool_calls: None,
                                        tool_call_id: Some(resolved_id),
                                        name: None,
                                    },
                                    is_system: false,
                                });
                            }
                        }
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
                if !text_parts.is_empty() {
                    pending.push(self.user_text_message(text_parts.join("\n")));
                }
            }
        }
    }

    fn user_text_message(&self, text: String) -> PendingMessage {
        PendingMessage {
            message: ChatMessage {
                role: "user".to_string(),
                content: Some(text),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            },
            is_system: false,
        }
    }

    fn convert_assistant_message(
        &self,
        message: &Message,
        dedup: &mut IdDeduplicationContext,
        pending: &mut Vec<PendingMessage>,
    ) {
        match &message.content {
            MessageContent::Text(text) => {
                if self.is_prefill(text) {
                    self.debug(&format!("Dropping assistant prefill token: {:?}", text));
                    return;
                }
                pending.push(PendingMessage {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: Some(text.clone()),
                        tool_calls: None,
                        tool_call_id: None,
                        name: None,
                    },
                    is_system: false,
                });
            }
            MessageContent::Blocks(blocks) => {
                let mut text_parts = Vec::new();
                let mut tool_calls = Vec::new();

                for block in blocks {
                    match block {
                        ContentBlock::Text { text } => text_parts.push(text.clone()),
                        ContentBlock::ToolUse { id, name, input } => {
                            let id = dedup.deduplicate_tool_id(id);
                            let arguments = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_string());

                            if self.tool_format == ToolFormat::Xml {
                                text_parts.push(format!(
                                    "<tool_code name=\"{}\">\n{}\n</tool_code>",
                                    name, arguments
                                ));
                            } else {
                                tool_calls.push(crate::model::openai::ToolCall {
                                    id,
                                    call_type: "function".to_string(),
                                    function: crate::model::openai::FunctionCall {
                                        name: name.clone(),
                                        arguments,
                                    },
                                });
                            }
                        }
                        ContentBlock::ToolResult { .. } => {}
                    }
                }

                let content_text = if text_parts.is_empty() { None } else { Some(text_parts.join("\n")) };
                if content_text.is_none() && tool_calls.is_empty() {
                    return;
                }

                pending.push(PendingMessage {
                    message: ChatMessage {
                        role: "assistant".to_string(),
                        content: content_text,
                        tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
                        tool_call_id: None,
                        name: None,
                    },
                    is_system: false,
                });
            }
        }
    }

    fn is_prefill(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() <= 2 {
            return true;
        }
        PREFILL_SHORTLIST.iter().any(|p| trimmed == *p || trimmed.starts_with("<tool_code") && !trimmed.contains("</tool_code>"))
    }

    fn rebrand_system_text(&self, system_text: &str) -> String {
        if system_text.contains(CLAUDE_CODE_IDENTIFIER) {
            system_text.replace(CLAUDE_CODE_IDENTIFIER, ADAPTER_IDENTIFIER)
        } else {
            system_text.to_string()
        }
    }

    /// Apply the context-window-driven prompt-fitting algorithm, returning the capped
    /// `max_tokens` and the (possibly truncated/trimmed) message list.
    fn fit_to_context_window(
        &self,
        window: u32,
        max_tokens: i64,
        messages: Vec<ChatMessage>,
    ) -> (i64, Vec<ChatMessage>) {
        let capped =
            (max_tokens as u32).min(window.saturating_sub(CONTEXT_RESERVE_TOKENS).max(MIN_COMPLETION_BUDGET));
        let prompt_budget = window.saturating_sub(capped).saturating_sub(CONTEXT_RESERVE_TOKENS);

        let estimated = messages.iter().map(|m| estimate_message_tokens(m)).sum::<u32>();
        if estimated <= prompt_budget {
            return (capped as i64, messages);
        }

        let (mut system, mut rest): (Vec<ChatMessage>, Vec<ChatMessage>) =
            messages.into_iter().partition(|m| m.role == "system");

        let system_tokens = system.iter().map(|m| estimate_message_tokens(m)).sum::<u32>();
        let system_ceiling = window.saturating_sub(512);
        if system_tokens > system_ceiling && !system.is_empty() {
            if let Some(last) = system.last_mut() {
                if let Some(content) = &mut last.content {
                    let max_chars = (system_ceiling as usize) * SYSTEM_TRUNCATION_CHARS_PER_TOKEN;
                    if content.len() > max_chars {
                        content.truncate(max_chars);
                        content.push_str("\n[... truncated ...]");
                    }
                }
            }
        }

        let mut kept_rest = Vec::new();
        let mut used = system.iter().map(estimate_message_tokens).sum::<u32>();
        for message in rest.drain(..).rev() {
            let cost = estimate_message_tokens(&message);
            if used + cost > prompt_budget && !kept_rest.is_empty() {
                break;
            }
            used += cost;
            kept_rest.push(message);
        }
        kept_rest.reverse();

        system.extend(kept_rest);
        (capped as i64, system)
    }

    fn debug(&self, msg: &str) {
        if self.log_level.is_trace_enabled() {
            tracing::debug!("{}", msg);
        }
    }
}

/// Deterministic, dependency-free token estimate: `max(1, ceil(len(text) * 2 / 5))`
/// characters-to-tokens for text, plus a fixed overhead per structured part.
fn estimate_tokens(text: &str) -> u32 {
    let len = text.chars().count();
    let numerator = len * CHARS_PER_TOKEN_NUMERATOR;
    let tokens = numerator.div_ceil(CHARS_PER_TOKEN_DENOMINATOR);
    tokens.max(1) as u32
}

fn estimate_message_tokens(message: &ChatMessage) -> u32 {
    let mut total = message.content.as_deref().map(estimate_tokens).unwrap_or(0);
    if let Some(tool_calls) = &message.tool_calls {
        for call in tool_calls {
            total += STRUCTURED_BLOCK_OVERHEAD_TOKENS + estimate_tokens(&call.function.arguments);
        }
    }
    total
}

/* --- tests ------------------------------------------------------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use serde_json::json;

    fn converter(tool_format: ToolFormat, window: Option<u32>) -> RequestConverter {
        RequestConverter::new(LogLevel::Info, tool_format, window)
    }

    fn sample_request(max_tokens: i64, messages: Vec<Message>) -> MessageRequest {
        MessageRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            messages,
            max_tokens,
            system: None,
            temperature: None,
            top_p: None,
            stop_sequences: None,
            stream: Some(false),
            tools: None,
            tool_choice: None,
        }
    }

    #[test]
    fn test_system_identifier_is_rebranded() {
        let conv = converter(ToolFormat::Native, None);
        let rebranded = conv.rebrand_system_text(CLAUDE_CODE_IDENTIFIER);
        assert_eq!(rebranded, ADAPTER_IDENTIFIER);
    }

    #[test]
    fn test_unrelated_system_text_passes_through() {
        let conv = converter(ToolFormat::Native, None);
        assert_eq!(conv.rebrand_system_text("be terse"), "be terse");
    }

    #[test]
    fn test_assistant_short_prefill_is_dropped() {
        let conv = converter(ToolFormat::Native, None);
        let req = sample_request(
            100,
            vec![Message { role: Role::Assistant, content: MessageContent::Text("{".to_string()) }],
        );
        let messages = conv.convert(&req, "target-model", None);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_assistant_normal_text_kept() {
        let conv = converter(ToolFormat::Native, None);
        let req = sample_request(
            100,
            vec![Message {
                role: Role::Assistant,
                content: MessageContent::Text("Sure, here you go.".to_string()),
            }],
        );
        let messages = conv.convert(&req, "target-model", None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content.as_deref(), Some("Sure, here you go."));
    }

    #[test]
    fn test_tool_use_block_generates_tool_call_in_native_mode() {
        let conv = converter(ToolFormat::Native, None);
        let req = sample_request(
            100,
            vec![Message {
                role: Role::Assistant,
                content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "get_weather".to_string(),
                    input: json!({"location": "Warsaw"}),
                }]),
            }],
        );
        let messages = conv.convert(&req, "target-model", None);
        assert_eq!(messages.len(), 1);
        let calls = messages[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.name, "get_weather");
    }

    #[test]
    fn test_tool_use_block_renders_as_xml_in_xml_mode() {
        let conv = converter(ToolFormat::Xml, None);
        let req = sample_request(
            100,
            vec![Message {
                role: Role::Assistant,
                content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                    id: "toolu_1".to_string(),
                    name: "get_weather".to_string(),
                    input: json!({"location": "Warsaw"}),
                }]),
            }],
        );
        let messages = conv.convert(&req, "target-model", None);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].tool_calls.is_none());
        assert!(messages[0].content.as_ref().unwrap().contains("<tool_code name=\"get_weather\">"));
    }

    #[test]
    fn test_tool_result_block_becomes_tool_message_in_native_mode() {
        let conv = converter(ToolFormat::Native, None);
        let req = sample_request(
            100,
            vec![Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: "toolu_1".to_string(),
                    content: Some(crate::model::anthropic::ToolResultContent::Text("72F".to_string())),
                    is_error: false,
                }]),
            }],
        );
        let messages = conv.convert(&req, "target-model", None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "tool");
        assert_eq!(messages[0].tool_call_id.as_deref(), Some("toolu_1"));
    }

    #[test]
    fn test_tool_result_block_becomes_tool_output_text_in_xml_mode() {
        let conv = converter(ToolFormat::Xml, None);
        let req = sample_request(
            100,
            vec![Message {
                role: Role::User,
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: "toolu_1".to_string(),
                    content: Some(crate::model::anthropic::ToolResultContent::Text("72F".to_string())),
                    is_error: false,
                }]),
            }],
        );
        let messages = conv.convert(&req, "target-model", None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert!(messages[0].content.as_ref().unwrap().contains("<tool_output>"));
    }

    #[test]
    fn test_build_chat_request_rewrites_max_tokens_of_one() {
        let conv = converter(ToolFormat::Native, None);
        let req = sample_request(1, vec![]);
        let chat = conv.build_chat_request(&req, "target-model", vec![]);
        assert_eq!(chat.max_tokens, MIN_TOKENS_REWRITE);
    }

    #[test]
    fn test_build_chat_request_forces_zero_temperature_in_xml_mode() {
        let conv = converter(ToolFormat::Xml, None);
        let mut req = sample_request(100, vec![]);
        req.temperature = Some(0.9);
        let chat = conv.build_chat_request(&req, "target-model", vec![]);
        assert_eq!(chat.temperature, Some(0.0));
    }

    #[test]
    fn test_context_fitting_caps_max_tokens_and_drops_oldest_messages() {
        let conv = converter(ToolFormat::Native, Some(4096));
        let long_text = "x".repeat(20_000);
        let messages: Vec<ChatMessage> = (0..20)
            .map(|i| ChatMessage {
                role: "user".to_string(),
                content: Some(format!("{}-{}", i, long_text)),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            })
            .collect();

        let (max_tokens, fitted) = conv.fit_to_context_window(4096, 8000, messages);
        assert_eq!(max_tokens, 3840);
        assert!(fitted.len() < 20);
        // Most recent messages are retained (highest index kept).
        assert!(fitted.last().unwrap().content.as_ref().unwrap().starts_with("19-"));
    }

    #[test]
    fn test_context_fitting_never_inflates_a_small_requested_max_tokens() {
        let conv = converter(ToolFormat::Native, Some(4096));
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: Some("hi".to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }];

        let (max_tokens, _) = conv.fit_to_context_window(4096, 100, messages);
        assert_eq!(max_tokens, 100);
    }

    #[test]
    fn test_context_fitting_keeps_system_messages() {
        let conv = converter(ToolFormat::Native, Some(4096));
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: Some("be terse".to_string()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }];
        let long_text = "x".repeat(20_000);
        for i in 0..20 {
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: Some(format!("{}-{}", i, long_text)),
                tool_calls: None,
                tool_call_id: None,
                name: None,
            });
        }

        let (_, fitted) = conv.fit_to_context_window(4096, 8000, messages);
        assert_eq!(fitted[0].role, "system");
    }

    #[test]
    fn test_estimate_tokens_is_at_least_one_for_nonempty_text() {
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens(""), 1);
    }

    #[test]
    fn test_resolve_model_still_used_for_routing_opus() {
        let models = ModelConfig {
            opus: "big".to_string(),
            sonnet: "mid".to_string(),
            haiku: "small".to_string(),
        };
        assert_eq!(crate::validator::resolve_model("claude-opus-4", &models), "big");
    }
}
