//!
//! Tool schema conversion, tool-call id deduplication, and the XML tool-calling
//! contract used for upstreams without native function calling.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use std::collections::HashMap;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::Value;

use crate::model::anthropic::{ToolChoice, ToolDefinition};
use crate::model::openai::{FunctionDef, Tool};

/* --- schema / choice conversion ---------------------------------------------------------------- */

/// Convert Anthropic tool definitions to OpenAI `tools` entries.
pub fn convert_tools_to_openai(tools: &[ToolDefinition]) -> Vec<Tool> {
    tools
        .iter()
        .map(|t| Tool {
            tool_type: "function",
            function: FunctionDef {
                name: t.name.clone(),
                description: t.description.clone(),
                parameters: t.input_schema.clone(),
            },
        })
        .collect()
}

/// Convert Anthropic `tool_choice` to the OpenAI `tool_choice` value.
///
/// `"auto"` -> `"auto"`, `"any"` -> `"required"`, a named tool -> the function-choice
/// object, anything else falls back to `"auto"`.
pub fn convert_tool_choice_to_openai(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Mode(mode) => match mode.as_str() {
            "any" => Value::String("required".to_string()),
            _ => Value::String("auto".to_string()),
        },
        ToolChoice::Object { choice_type, name } => match choice_type.as_str() {
            "tool" => {
                if let Some(name) = name {
                    serde_json::json!({"type": "function", "function": {"name": name}})
                } else {
                    Value::String("auto".to_string())
                }
            }
            "any" => Value::String("required".to_string()),
            _ => Value::String("auto".to_string()),
        },
    }
}

/// Generate a new Anthropic-style `toolu_` tool-use id.
pub fn generate_tool_use_id() -> String {
    format!("toolu_{}", random_url_safe_suffix(24))
}

/// Generate a new Anthropic-style `msg_` request id.
pub fn generate_request_id() -> String {
    format!("msg_{}", random_url_safe_suffix(24))
}

fn random_url_safe_suffix(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/* --- tool-call id deduplication ------------------------------------------------------------------ */

///
/// Tracks tool-call ids seen across a single request so that repeated ids (a client
/// resending the same tool_use id across turns) get rewritten to fresh, unique ids
/// before being forwarded upstream, while tool_result blocks referencing the original
/// id are redirected to whichever rewritten id they're meant to pair with.
#[derive(Debug, Default)]
pub struct IdDeduplicationContext {
    seen_ids: std::collections::HashSet<String>,
    id_mappings: HashMap<String, Vec<String>>,
    result_index: HashMap<String, usize>,
}

impl IdDeduplicationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an assistant-side tool_use id, rewriting it if already seen this request.
    ///
    /// First occurrence is kept as-is. Subsequent occurrences get a freshly generated id:
    /// ids longer than 11 characters keep their first 8 characters and randomize the rest
    /// (to preserve any recognizable prefix); shorter ids are fully randomized at the same
    /// length. The rewrite is recorded so a later tool_result referencing the original id
    /// resolves to the correct occurrence.
    pub fn deduplicate_tool_id(&mut self, tool_id: &str) -> String {
        if self.seen_ids.insert(tool_id.to_string()) {
            return tool_id.to_string();
        }

        let new_id = if tool_id.len() > 11 {
            let prefix = &tool_id[..8];
            let suffix_len = tool_id.len() - 8;
            format!("{}{}", prefix, random_url_safe_suffix(suffix_len))
        } else {
            random_url_safe_suffix(tool_id.len().max(1))
        };

        tracing::debug!("Repair ID: {} -> {}", tool_id, new_id);
        self.seen_ids.insert(new_id.clone());
        self.id_mappings.entry(tool_id.to_string()).or_default().push(new_id.clone());
        new_id
    }

    /// Resolve the next occurrence of a tool_result's `tool_use_id` against the mapping
    /// built up by [`Self::deduplicate_tool_id`]. Each original id is consumed in order:
    /// the Nth tool_result referencing a given original id resolves to the Nth rewrite.
    pub fn resolve_result_id(&mut self, tool_use_id: &str) -> String {
        let Some(rewrites) = self.id_mappings.get(tool_use_id) else {
            return tool_use_id.to_string();
        };

        let idx = self.result_index.entry(tool_use_id.to_string()).or_insert(0);
        let resolved = rewrites.get(*idx).cloned().unwrap_or_else(|| tool_use_id.to_string());
        *idx += 1;
        resolved
    }
}

/* --- xml tool-calling contract ------------------------------------------------------------------- */

/// `# TOOL CALLING FORMAT` marker used by [`has_xml_tool_instructions`].
const XML_FORMAT_MARKER: &str = "# TOOL CALLING FORMAT";

/// Build the system-prompt banner instructing a model without native function calling
/// to emit tool calls as `<tool_code name="...">{json args}</tool_code>` blocks.
///
/// Returns an empty string when `tools` is empty (nothing to instruct).
pub fn generate_xml_tool_instructions(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return String::new();
    }

    let tool_defs = tools
        .iter()
        .map(|t| {
            let schema = serde_json::to_string_pretty(&t.input_schema).unwrap_or_default();
            format!(
                "- **{}**: {}\n  Parameters: {}",
                t.name,
                t.description.clone().unwrap_or_default(),
                schema
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"
{marker}

To call a tool, emit a block in this exact format:

<tool_code name="TOOL_NAME">
{{"argument_name": "value"}}
</tool_code>

CRITICAL EXECUTION RULES:
1. NO Markdown: do not wrap the block in ``` fences.
2. Valid JSON: the body between the tags must be valid JSON, nothing else.
3. Exact Name Match: TOOL_NAME must exactly match one of the tools listed below.
4. No Nested Content: do not put other tool_code blocks inside the JSON body.
5. Think before calling: reason about which tool to use before emitting the block.
6. Multiple Tools: you may emit more than one <tool_code> block per reply.
7. Tool Outputs: results come back wrapped as <tool_output>...</tool_output>.

EXAMPLE (Correct):
<tool_code name="get_weather">
{{"location": "Warsaw"}}
</tool_code>

EXAMPLES (Incorrect - DO NOT USE):
```
<tool_code name="get_weather">
{{"location": "Warsaw"}}
</tool_code>
```
<tool_code name="get_weather">
  <tool_code name="nested">{{}}</tool_code>
</tool_code>
<tool_code name="get_weather">
{{location: Warsaw}}
</tool_code>

## Available Tools:

{tools_list}
"#,
        marker = XML_FORMAT_MARKER,
        tools_list = tool_defs
    )
}

/// Whether a system prompt already carries the XML tool-calling contract.
pub fn has_xml_tool_instructions(system_prompt: &str) -> bool {
    system_prompt.contains(XML_FORMAT_MARKER) && system_prompt.contains("<tool_code")
}

/* --- tests ---------------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".to_string(),
            description: Some("Look up weather".to_string()),
            input_schema: json!({"type": "object", "properties": {"location": {"type": "string"}}}),
        }
    }

    #[test]
    fn test_convert_tools_to_openai_maps_fields() {
        let converted = convert_tools_to_openai(&[sample_tool()]);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].function.name, "get_weather");
        assert_eq!(converted[0].tool_type, "function");
    }

    #[test]
    fn test_tool_choice_any_maps_to_required() {
        let choice = ToolChoice::Mode("any".to_string());
        assert_eq!(convert_tool_choice_to_openai(&choice), json!("required"));
    }

    #[test]
    fn test_tool_choice_named_tool_maps_to_function_object() {
        let choice = ToolChoice::Object {
            choice_type: "tool".to_string(),
            name: Some("get_weather".to_string()),
        };
        assert_eq!(
            convert_tool_choice_to_openai(&choice),
            json!({"type": "function", "function": {"name": "get_weather"}})
        );
    }

    #[test]
    fn test_dedup_first_occurrence_kept_as_is() {
        let mut ctx = IdDeduplicationContext::new();
        assert_eq!(ctx.deduplicate_tool_id("toolu_abc123"), "toolu_abc123");
    }

    #[test]
    fn test_dedup_repeat_occurrence_gets_new_id_with_preserved_prefix() {
        let mut ctx = IdDeduplicationContext::new();
        let first = ctx.deduplicate_tool_id("toolu_abc123def");
        assert_eq!(first, "toolu_abc123def");
        let second = ctx.deduplicate_tool_id("toolu_abc123def");
        assert_ne!(second, first);
        assert!(second.starts_with("toolu_ab"));
        assert_eq!(second.len(), first.len());
    }

    #[test]
    fn test_resolve_result_id_consumes_rewrites_in_order() {
        let mut ctx = IdDeduplicationContext::new();
        ctx.deduplicate_tool_id("toolu_abc123def");
        let rewritten = ctx.deduplicate_tool_id("toolu_abc123def");

        let resolved_first = ctx.resolve_result_id("toolu_abc123def");
        assert_eq!(resolved_first, rewritten);
    }

    #[test]
    fn test_resolve_result_id_passthrough_when_never_duplicated() {
        let mut ctx = IdDeduplicationContext::new();
        assert_eq!(ctx.resolve_result_id("toolu_never_seen"), "toolu_never_seen");
    }

    #[test]
    fn test_xml_instructions_empty_when_no_tools() {
        assert_eq!(generate_xml_tool_instructions(&[]), "");
    }

    #[test]
    fn test_xml_instructions_contain_marker_and_tool_name() {
        let instructions = generate_xml_tool_instructions(&[sample_tool()]);
        assert!(has_xml_tool_instructions(&instructions));
        assert!(instructions.contains("get_weather"));
    }

    #[test]
    fn test_has_xml_tool_instructions_requires_both_markers() {
        assert!(!has_xml_tool_instructions("# TOOL CALLING FORMAT only"));
        assert!(!has_xml_tool_instructions("<tool_code only"));
    }
}
