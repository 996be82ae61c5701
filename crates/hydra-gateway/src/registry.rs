//! Built-in vendor metadata table: a single `ProviderDescriptor` table
//! instead of per-adapter free functions, plus the `build_providers`
//! factory that turns configured vendors into `Box<dyn LlmProvider>`
//! instances.

use std::collections::HashMap;
use std::sync::Arc;

use hydra_core::config::ProvidersConfig;

use crate::claude::ClaudeProvider;
use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::provider::LlmProvider;

/// Static metadata for one of the 8 supported vendors. The
/// OpenAI-compatible family (openai/groq/glm/nvidia/openrouter/minimax)
/// shares one adapter implementation parameterized by `base_url`/`chat_path`;
/// Claude and Gemini get their own wire formats.
pub struct ProviderDescriptor {
    pub id: &'static str,
    pub base_url: &'static str,
    pub chat_path: &'static str,
    pub default_model: &'static str,
    pub supports_tools: bool,
    pub supports_thinking: bool,
}

pub const KNOWN_PROVIDERS: &[ProviderDescriptor] = &[
    ProviderDescriptor {
        id: "openai",
        base_url: "https://api.openai.com",
        chat_path: "/v1/chat/completions",
        default_model: "gpt-4o-mini",
        supports_tools: true,
        supports_thinking: false,
    },
    ProviderDescriptor {
        id: "groq",
        base_url: "https://api.groq.com/openai",
        chat_path: "/v1/chat/completions",
        default_model: "llama-3.3-70b-versatile",
        supports_tools: true,
        supports_thinking: false,
    },
    ProviderDescriptor {
        id: "glm",
        base_url: "https://open.bigmodel.cn/api/paas",
        chat_path: "/v4/chat/completions",
        default_model: "glm-4-flash",
        supports_tools: true,
        supports_thinking: false,
    },
    ProviderDescriptor {
        id: "nvidia",
        base_url: "https://integrate.api.nvidia.com",
        chat_path: "/v1/chat/completions",
        default_model: "meta/llama-3.1-70b-instruct",
        supports_tools: true,
        supports_thinking: false,
    },
    ProviderDescriptor {
        id: "openrouter",
        base_url: "https://openrouter.ai/api",
        chat_path: "/v1/chat/completions",
        default_model: "openai/gpt-4o",
        supports_tools: true,
        supports_thinking: false,
    },
    ProviderDescriptor {
        id: "minimax",
        base_url: "https://api.minimax.chat",
        chat_path: "/v1/text/chatcompletion_v2",
        default_model: "MiniMax-Text-01",
        supports_tools: true,
        supports_thinking: false,
    },
    ProviderDescriptor {
        id: "claude",
        base_url: "https://api.anthropic.com",
        chat_path: "/v1/messages",
        default_model: "claude-sonnet-4-20250514",
        supports_tools: true,
        supports_thinking: true,
    },
    ProviderDescriptor {
        id: "gemini",
        base_url: "https://generativelanguage.googleapis.com",
        chat_path: "/v1beta/models",
        default_model: "gemini-2.0-flash",
        supports_tools: true,
        supports_thinking: false,
    },
];

pub fn lookup(id: &str) -> Option<&'static ProviderDescriptor> {
    KNOWN_PROVIDERS.iter().find(|p| p.id == id)
}

/// Instantiate every vendor named in `config` that carries an API key,
/// returning `name -> provider`. Vendors with no key configured are
/// omitted entirely rather than created in a disabled state, since
/// `is_configured()` on an unconstructed adapter has no receiver to call.
pub fn build_providers(config: &ProvidersConfig) -> HashMap<String, Arc<dyn LlmProvider>> {
    let mut out: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();

    let openai_compat = [
        ("openai", &config.openai),
        ("groq", &config.groq),
        ("glm", &config.glm),
        ("nvidia", &config.nvidia),
        ("openrouter", &config.openrouter),
        ("minimax", &config.minimax),
    ];

    for (id, vendor) in openai_compat {
        if !vendor.is_configured() {
            continue;
        }
        let desc = lookup(id).expect("known provider id");
        let base_url = vendor.base_url.clone().unwrap_or_else(|| desc.base_url.to_string());
        let model = vendor.model.clone().unwrap_or_else(|| desc.default_model.to_string());
        out.insert(
            id.to_string(),
            Arc::new(OpenAiCompatProvider::new(
                id,
                vendor.api_key.clone().unwrap_or_default(),
                base_url,
                desc.chat_path.to_string(),
                model,
            )),
        );
    }

    if config.claude.is_configured() {
        let desc = lookup("claude").expect("known provider id");
        let base_url = config.claude.base_url.clone().unwrap_or_else(|| desc.base_url.to_string());
        let model = config.claude.model.clone().unwrap_or_else(|| desc.default_model.to_string());
        out.insert(
            "claude".to_string(),
            Arc::new(ClaudeProvider::new(config.claude.api_key.clone().unwrap_or_default(), base_url, model)),
        );
    }

    if config.gemini.is_configured() {
        let desc = lookup("gemini").expect("known provider id");
        let base_url = config.gemini.base_url.clone().unwrap_or_else(|| desc.base_url.to_string());
        let model = config.gemini.model.clone().unwrap_or_else(|| desc.default_model.to_string());
        out.insert(
            "gemini".to_string(),
            Arc::new(GeminiProvider::new(config.gemini.api_key.clone().unwrap_or_default(), base_url, model)),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_all_eight_vendors() {
        for id in ["openai", "groq", "glm", "nvidia", "openrouter", "minimax", "claude", "gemini"] {
            assert!(lookup(id).is_some(), "missing descriptor for {id}");
        }
    }

    #[test]
    fn unconfigured_providers_yields_empty_map() {
        let providers = build_providers(&ProvidersConfig::default());
        assert!(providers.is_empty());
    }
}
