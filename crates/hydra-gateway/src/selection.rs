//! Provider selection & fallback.

use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::LlmProvider;
use crate::registry;

/// Resolve the configured provider name to an instance, falling back per
/// spec: configured-and-supports-tools, then any configured, then `None`
/// ("AI is marked unavailable").
pub fn select(
    providers: &HashMap<String, Arc<dyn LlmProvider>>,
    preferred: &str,
    require_tools: bool,
) -> Option<Arc<dyn LlmProvider>> {
    if let Some(p) = providers.get(preferred) {
        if p.is_configured() && (!require_tools || p.supports_tools()) {
            return Some(p.clone());
        }
    }

    // Deterministic fallback order: the registry's vendor table, not
    // HashMap iteration order.
    if require_tools {
        for desc in registry::KNOWN_PROVIDERS {
            if let Some(p) = providers.get(desc.id) {
                if p.is_configured() && p.supports_tools() {
                    return Some(p.clone());
                }
            }
        }
    }

    for desc in registry::KNOWN_PROVIDERS {
        if let Some(p) = providers.get(desc.id) {
            if p.is_configured() {
                return Some(p.clone());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatRequest, ChatResponse, ProviderError};
    use async_trait::async_trait;

    struct Stub {
        name: &'static str,
        configured: bool,
        tools: bool,
    }

    #[async_trait]
    impl LlmProvider for Stub {
        fn name(&self) -> &str {
            self.name
        }
        fn is_configured(&self) -> bool {
            self.configured
        }
        fn supports_tools(&self) -> bool {
            self.tools
        }
        fn supports_thinking(&self) -> bool {
            false
        }
        fn default_model(&self) -> &str {
            "stub-model"
        }
        fn fallback_models(&self) -> &HashMap<String, String> {
            static EMPTY: std::sync::OnceLock<HashMap<String, String>> = std::sync::OnceLock::new();
            EMPTY.get_or_init(HashMap::new)
        }
        async fn call(&self, _req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            unimplemented!()
        }
    }

    #[test]
    fn prefers_configured_preferred_provider() {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        providers.insert("openai".into(), Arc::new(Stub { name: "openai", configured: true, tools: true }));
        let selected = select(&providers, "openai", true).unwrap();
        assert_eq!(selected.name(), "openai");
    }

    #[test]
    fn falls_back_when_preferred_lacks_tool_support() {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        providers.insert("minimax".into(), Arc::new(Stub { name: "minimax", configured: true, tools: false }));
        providers.insert("claude".into(), Arc::new(Stub { name: "claude", configured: true, tools: true }));
        let selected = select(&providers, "minimax", true).unwrap();
        assert_eq!(selected.name(), "claude");
    }

    #[test]
    fn none_when_nothing_configured() {
        let providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        assert!(select(&providers, "openai", true).is_none());
    }
}
