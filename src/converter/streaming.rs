//!
//! Upstream SSE to Anthropic SSE re-framer.
//!
//! Consumes `data: ...` lines from an OpenAI-compatible streaming chat completion
//! and re-frames them as Anthropic Messages API server-sent events
//! (`message_start`, `content_block_start/delta/stop`, `message_delta`, `message_stop`).
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::model::anthropic::Usage;
use crate::model::openai::ChatStreamChunk;

/* --- constants --------------------------------------------------------------------------------- */

const DONE_MARKER: &str = "[DONE]";

/* --- types ----------------------------------------------------------------------------------- */

#[derive(Debug)]
enum OpenBlock {
    Text,
    ToolUse { upstream_index: usize },
}

///
/// Stateful re-framer for a single streaming request. Consume upstream SSE lines
/// one at a time via [`Self::process_line`]; each call returns zero or more
/// already-framed Anthropic SSE event strings ready to push onto the outbound channel.
pub struct StreamReframer {
    request_id: String,
    model: String,
    blocks: Vec<OpenBlock>,
    tool_index_to_block: HashMap<usize, usize>,
    usage: Option<Usage>,
    terminated: bool,
}

impl StreamReframer {
    pub fn new(request_id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            model: model.into(),
            blocks: Vec::new(),
            tool_index_to_block: HashMap::new(),
            usage: None,
            terminated: false,
        }
    }

    /// Accumulated usage from the last upstream chunk that carried one, if any.
    /// Remains readable after [`Self::finish`] has been called.
    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    /// Emit the opening `message_start` event. Call exactly once, before any
    /// [`Self::process_line`] calls.
    pub fn start(&self) -> String {
        sse_event(
            "message_start",
            json!({
                "type": "message_start",
                "message": {
                    "id": self.request_id,
                    "type": "message",
                    "role": "assistant",
                    "content": [],
                    "model": self.model,
                    "stop_reason": null,
                    "stop_sequence": null,
                    "usage": {"input_tokens": 0, "output_tokens": 0},
                }
            }),
        )
    }

    /// Process one raw line from the upstream SSE stream. Returns the Anthropic SSE
    /// events it produced, if any. Call [`Self::finish`] once the upstream stream ends.
    pub fn process_line(&mut self, line: &str) -> Vec<String> {
        if self.terminated {
            return Vec::new();
        }

        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            return Vec::new();
        }

        let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
            return Vec::new();
        };
        let data = data.trim();

        if data == DONE_MARKER {
            return self.finish();
        }

        let parsed: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        if let Some(error) = parsed.get("error") {
            if error.get("message").is_some() || error.get("type").is_some() {
                let message = error.get("message").and_then(Value::as_str).unwrap_or("upstream error");
                return self.terminate_with_error(message);
            }
        }

        match serde_json::from_value::<ChatStreamChunk>(parsed) {
            Ok(chunk) => self.process_chunk(chunk),
            Err(_) => Vec::new(),
        }
    }

    fn process_chunk(&mut self, chunk: ChatStreamChunk) -> Vec<String> {
        let mut events = Vec::new();

        if let Some(usage) = &chunk.usage {
            self.usage = Some(Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                cache_read_input_tokens: usage
                    .prompt_tokens_details
                    .as_ref()
                    .and_then(|d| d.cached_tokens),
            });
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return events;
        };

        if let Some(text) = &choice.delta.content {
            if !text.is_empty() {
                events.extend(self.append_text(text));
            }
        }

        if let Some(tool_calls) = &choice.delta.tool_calls {
            for delta in tool_calls {
                events.extend(self.append_tool_call_delta(delta));
            }
        }

        if choice.finish_reason.is_some() {
            events.extend(self.close_all_blocks());
        }

        events
    }

    fn append_text(&mut self, text: &str) -> Vec<String> {
        let mut events = Vec::new();

        let needs_new_block = !matches!(self.blocks.last(), Some(OpenBlock::Text));
        if needs_new_block {
            let index = self.blocks.len();
            self.blocks.push(OpenBlock::Text);
            events.push(sse_event(
                "content_block_start",
                json!({
                    "type": "content_block_start",
                    "index": index,
                    "content_block": {"type": "text", "text": ""}
                }),
            ));
        }

        let index = self.blocks.len() - 1;
        events.push(sse_event(
            "content_block_delta",
            json!({
                "type": "content_block_delta",
                "index": index,
                "delta": {"type": "text_delta", "text": text}
            }),
        ));

        events
    }

    fn append_tool_call_delta(&mut self, delta: &crate::model::openai::ToolCallDelta) -> Vec<String> {
        let mut events = Vec::new();

        let block_index = match self.tool_index_to_block.get(&delta.index) {
            Some(&idx) => idx,
            None => {
                let idx = self.blocks.len();
                self.blocks.push(OpenBlock::ToolUse { upstream_index: delta.index });
                self.tool_index_to_block.insert(delta.index, idx);

                let id = delta.id.clone().unwrap_or_default();
                let name = delta.function.as_ref().and_then(|f| f.name.clone()).unwrap_or_default();
                events.push(sse_event(
                    "content_block_start",
                    json!({
                        "type": "content_block_start",
                        "index": idx,
                        "content_block": {"type": "tool_use", "id": id, "name": name, "input": {}}
                    }),
                ));
                idx
            }
        };

        if let Some(function) = &delta.function {
            if let Some(arguments) = &function.arguments {
                if !arguments.is_empty() {
                    events.push(sse_event(
                        "content_block_delta",
                        json!({
                            "type": "content_block_delta",
                            "index": block_index,
                            "delta": {"type": "input_json_delta", "partial_json": arguments}
                        }),
                    ));
                }
            }
        }

        events
    }

    fn close_all_blocks(&mut self) -> Vec<String> {
        (0..self.blocks.len())
            .map(|index| {
                sse_event(
                    "content_block_stop",
                    json!({"type": "content_block_stop", "index": index}),
                )
            })
            .collect()
    }

    fn terminate_with_error(&mut self, message: &str) -> Vec<String> {
        let mut events = Vec::new();
        let text = format!("Error: {}", message);
        let index = self.blocks.len();
        self.blocks.push(OpenBlock::Text);

        events.push(sse_event(
            "content_block_start",
            json!({"type": "content_block_start", "index": index, "content_block": {"type": "text", "text": ""}}),
        ));
        events.push(sse_event(
            "content_block_delta",
            json!({"type": "content_block_delta", "index": index, "delta": {"type": "text_delta", "text": text}}),
        ));
        events.push(sse_event(
            "content_block_stop",
            json!({"type": "content_block_stop", "index": index}),
        ));

        let usage = self.usage.clone().unwrap_or_default();
        events.push(sse_event(
            "message_delta",
            json!({
                "type": "message_delta",
                "delta": {"stop_reason": "error", "stop_sequence": null},
                "usage": usage_json(&usage)
            }),
        ));
        events.push(self.message_stop());
        self.terminated = true;
        events
    }

    /// Finalize the stream: emit the terminal `message_delta` (when usage was observed)
    /// followed by `message_stop`. Safe to call more than once; subsequent calls no-op.
    pub fn finish(&mut self) -> Vec<String> {
        if self.terminated {
            return Vec::new();
        }
        let mut events = Vec::new();

        if let Some(usage) = self.usage.clone() {
            events.push(sse_event(
                "message_delta",
                json!({
                    "type": "message_delta",
                    "delta": {"stop_reason": "end_turn", "stop_sequence": null},
                    "usage": usage_json(&usage)
                }),
            ));
        }

        events.push(self.message_stop());
        self.terminated = true;
        events
    }

    fn message_stop(&self) -> String {
        sse_event("message_stop", json!({"type": "message_stop"}))
    }
}

fn usage_json(usage: &Usage) -> Value {
    json!({"input_tokens": usage.input_tokens, "output_tokens": usage.output_tokens})
}

fn sse_event(event: &str, data: Value) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/* --- tests ------------------------------------------------------------------------------------ */

#[cfg(test)]
mod tests {
    use super::*;

    fn new_reframer() -> StreamReframer {
        StreamReframer::new("msg_test123", "claude-sonnet-4-20250514")
    }

    #[test]
    fn test_start_emits_message_start_event() {
        let reframer = new_reframer();
        let event = reframer.start();
        assert!(event.starts_with("event: message_start\n"));
        assert!(event.contains("\"stop_reason\":null"));
    }

    #[test]
    fn test_blank_and_comment_lines_are_ignored() {
        let mut reframer = new_reframer();
        assert!(reframer.process_line("").is_empty());
        assert!(reframer.process_line(": this is a comment").is_empty());
    }

    #[test]
    fn test_text_delta_opens_block_then_emits_delta() {
        let mut reframer = new_reframer();
        let events = reframer.process_line(
            r#"data: {"choices":[{"delta":{"content":"hi"},"finish_reason":null}]}"#,
        );
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("content_block_start"));
        assert!(events[1].contains("content_block_delta"));
        assert!(events[1].contains("text_delta"));
    }

    #[test]
    fn test_second_text_delta_reuses_open_block() {
        let mut reframer = new_reframer();
        reframer.process_line(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#);
        let events = reframer.process_line(r#"data: {"choices":[{"delta":{"content":" there"}}]}"#);
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("content_block_delta"));
    }

    #[test]
    fn test_tool_call_delta_opens_tool_use_block() {
        let mut reframer = new_reframer();
        let events = reframer.process_line(
            r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"get_weather","arguments":""}}]}}]}"#,
        );
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("tool_use"));
        assert!(events[0].contains("get_weather"));
    }

    #[test]
    fn test_tool_call_argument_deltas_accumulate_against_same_block() {
        let mut reframer = new_reframer();
        reframer.process_line(
            r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_1","function":{"name":"get_weather","arguments":""}}]}}]}"#,
        );
        let events = reframer.process_line(
            r#"data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"location\""}}]}}]}"#,
        );
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("input_json_delta"));
        assert!(events[0].contains("\"index\":0"));
    }

    #[test]
    fn test_finish_reason_closes_all_open_blocks() {
        let mut reframer = new_reframer();
        reframer.process_line(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#);
        let events = reframer.process_line(r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("content_block_stop"));
    }

    #[test]
    fn test_done_marker_emits_message_delta_and_stop_when_usage_seen() {
        let mut reframer = new_reframer();
        reframer.process_line(
            r#"data: {"choices":[],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#,
        );
        let events = reframer.process_line("data: [DONE]");
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("message_delta"));
        assert!(events[0].contains("\"input_tokens\":10"));
        assert!(events[1].contains("message_stop"));
    }

    #[test]
    fn test_done_marker_without_usage_still_emits_message_stop() {
        let mut reframer = new_reframer();
        let events = reframer.process_line("data: [DONE]");
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("message_stop"));
    }

    #[test]
    fn test_malformed_json_chunk_is_silently_skipped() {
        let mut reframer = new_reframer();
        let events = reframer.process_line("data: {not valid json");
        assert!(events.is_empty());
    }

    #[test]
    fn test_explicit_error_object_terminates_stream_cleanly() {
        let mut reframer = new_reframer();
        let events = reframer.process_line(r#"data: {"error": {"message": "upstream exploded"}}"#);
        assert_eq!(events.len(), 4);
        assert!(events[1].contains("Error: upstream exploded"));
        assert!(events[2].contains("content_block_stop"));
        assert!(events[3].contains("message_stop"));

        // Stream is terminated: further lines produce nothing.
        assert!(reframer.process_line(r#"data: {"choices":[{"delta":{"content":"late"}}]}"#).is_empty());
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut reframer = new_reframer();
        assert_eq!(reframer.finish().len(), 1);
        assert!(reframer.finish().is_empty());
    }
}
