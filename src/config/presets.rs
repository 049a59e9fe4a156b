//!
//! Named upstream provider presets for Claude Adapter.
//!
//! Presets are a convenience catalog consumed only by the `config init` CLI wizard
//! ([`cli`]) — the core request/response pipeline never reads from here directly,
//! it only ever sees the resolved [`crate::config::UpstreamConfig`]. Ported from the
//! reference adapter's provider catalog.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::ToolFormat;

/* --- types ----------------------------------------------------------------------------------- */

/// Category a provider preset belongs to, for grouping in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCategory {
    Free,
    Paid,
    Custom,
}

///
/// A single named upstream preset: base URL, default models, tool-calling format,
/// and any known context-window limit.
#[derive(Debug, Clone)]
pub struct ProviderPreset {
    pub name: &'static str,
    pub label: &'static str,
    pub category: ProviderCategory,
    pub base_url: &'static str,
    pub api_key_required: bool,
    pub default_model_opus: &'static str,
    pub default_model_sonnet: &'static str,
    pub default_model_haiku: &'static str,
    pub default_tool_format: ToolFormat,
    pub max_context_window: Option<u32>,
    pub guidance: &'static [&'static str],
}

/* --- catalog --------------------------------------------------------------------------------- */

/// All known provider presets, in display order.
pub const PROVIDER_PRESETS: &[ProviderPreset] = &[
    ProviderPreset {
        name: "nvidia",
        label: "NVIDIA NIM (free tier)",
        category: ProviderCategory::Free,
        base_url: "https://integrate.api.nvidia.com/v1",
        api_key_required: true,
        default_model_opus: "minimaxai/minimax-m2.1",
        default_model_sonnet: "minimaxai/minimax-m2.1",
        default_model_haiku: "minimaxai/minimax-m2.1",
        default_tool_format: ToolFormat::Native,
        max_context_window: None,
        guidance: &[
            "Create a free NVIDIA NGC API key at https://build.nvidia.com",
            "Set it as upstream.api_key in your config.",
        ],
    },
    ProviderPreset {
        name: "ollama",
        label: "Ollama (local)",
        category: ProviderCategory::Free,
        base_url: "http://localhost:11434/v1",
        api_key_required: false,
        default_model_opus: "kimi-k2.5:cloud",
        default_model_sonnet: "kimi-k2.5:cloud",
        default_model_haiku: "kimi-k2.5:cloud",
        default_tool_format: ToolFormat::Native,
        max_context_window: Some(8192),
        guidance: &[
            "Start Ollama locally: ollama serve",
            "Pull the model you want to use: ollama pull <model>",
        ],
    },
    ProviderPreset {
        name: "lmstudio",
        label: "LM Studio (local)",
        category: ProviderCategory::Free,
        base_url: "http://localhost:1234/v1",
        api_key_required: false,
        default_model_opus: "zai-org/glm-4.7-flash",
        default_model_sonnet: "zai-org/glm-4.7-flash",
        default_model_haiku: "zai-org/glm-4.7-flash",
        default_tool_format: ToolFormat::Native,
        max_context_window: Some(131072),
        guidance: &[
            "Download the model in LM Studio: lms get <model>",
            "Start the local server: lms server start",
        ],
    },
    ProviderPreset {
        name: "kimi",
        label: "Moonshot Kimi",
        category: ProviderCategory::Paid,
        base_url: "https://api.moonshot.cn/anthropic",
        api_key_required: true,
        default_model_opus: "kimi-k2.5",
        default_model_sonnet: "kimi-k2.5",
        default_model_haiku: "kimi-k2.5",
        default_tool_format: ToolFormat::Native,
        max_context_window: None,
        guidance: &["Create an API key at https://platform.moonshot.cn"],
    },
    ProviderPreset {
        name: "deepseek",
        label: "DeepSeek",
        category: ProviderCategory::Paid,
        base_url: "https://api.deepseek.com/anthropic",
        api_key_required: true,
        default_model_opus: "deepseek-chat",
        default_model_sonnet: "deepseek-chat",
        default_model_haiku: "deepseek-chat",
        default_tool_format: ToolFormat::Native,
        max_context_window: None,
        guidance: &["Create an API key at https://platform.deepseek.com"],
    },
    ProviderPreset {
        name: "glm",
        label: "Zhipu GLM",
        category: ProviderCategory::Paid,
        base_url: "https://api.z.ai/api/anthropic",
        api_key_required: true,
        default_model_opus: "glm-4.7",
        default_model_sonnet: "glm-4.7",
        default_model_haiku: "glm-4.7",
        default_tool_format: ToolFormat::Native,
        max_context_window: None,
        guidance: &["Create an API key at https://open.bigmodel.cn"],
    },
    ProviderPreset {
        name: "minimax",
        label: "MiniMax",
        category: ProviderCategory::Paid,
        base_url: "https://api.minimaxi.com/anthropic",
        api_key_required: true,
        default_model_opus: "MiniMax-M2.1",
        default_model_sonnet: "MiniMax-M2.1",
        default_model_haiku: "MiniMax-M2.1",
        default_tool_format: ToolFormat::Native,
        max_context_window: None,
        guidance: &["Create an API key at https://www.minimaxi.com"],
    },
    ProviderPreset {
        name: "custom",
        label: "Custom OpenAI-compatible endpoint",
        category: ProviderCategory::Custom,
        base_url: "https://api.openai.com/v1",
        api_key_required: true,
        default_model_opus: "gpt-4o",
        default_model_sonnet: "gpt-4o",
        default_model_haiku: "gpt-4o-mini",
        default_tool_format: ToolFormat::Native,
        max_context_window: None,
        guidance: &["Point base_url at any OpenAI-compatible /v1 endpoint."],
    },
];

/* --- lookup helpers ---------------------------------------------------------------------- */

/// Look up a preset by its short name (e.g. `"kimi"`).
pub fn get_provider_preset(name: &str) -> Option<&'static ProviderPreset> {
    PROVIDER_PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

/// All known provider short names, in catalog order.
pub fn get_provider_names() -> Vec<&'static str> {
    PROVIDER_PRESETS.iter().map(|p| p.name).collect()
}

/// Presets filtered by category, preserving catalog order.
pub fn get_providers_by_category(category: ProviderCategory) -> Vec<&'static ProviderPreset> {
    PROVIDER_PRESETS.iter().filter(|p| p.category == category).collect()
}

/* --- tests --------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_name_is_lookupable() {
        for name in get_provider_names() {
            assert!(get_provider_preset(name).is_some());
        }
    }

    #[test]
    fn test_unknown_preset_returns_none() {
        assert!(get_provider_preset("nonexistent").is_none());
    }

    #[test]
    fn test_category_filtering() {
        let free = get_providers_by_category(ProviderCategory::Free);
        assert!(free.iter().any(|p| p.name == "ollama"));
        assert!(!free.iter().any(|p| p.name == "kimi"));
    }

    #[test]
    fn test_custom_preset_has_no_api_key_requirement_exception() {
        let custom = get_provider_preset("custom").unwrap();
        assert!(custom.api_key_required);
    }
}
