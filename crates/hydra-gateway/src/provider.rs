//! Canonical request/response shapes and the `LlmProvider` trait.
//!
//! Every vendor adapter translates this shape to and from its own wire
//! format; callers (the agent orchestrator, the scheduler's report AI call)
//! never see vendor-specific JSON.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The four canonical message roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool call the assistant asked to make, attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One turn of canonical conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Present on `Role::Tool` messages — the id of the call this answers.
    pub tool_call_id: Option<String>,
    /// Present on `Role::Assistant` messages that requested tool calls.
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }
}

/// A function/tool definition offered to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// A tool call extracted from a model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
    pub thinking: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            system_prompt: None,
            messages,
            tools: Vec::new(),
            max_tokens: 4096,
            thinking: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Extended-thinking/reasoning text, when the vendor and request enable it.
    pub thinking: Option<String>,
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// Common interface for every vendor adapter.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;
    fn is_configured(&self) -> bool;
    fn supports_tools(&self) -> bool;
    fn supports_thinking(&self) -> bool;
    fn default_model(&self) -> &str;
    fn fallback_models(&self) -> &HashMap<String, String>;

    /// Either hits the vendor's models endpoint or returns the configured
    /// fallback list. Default implementation always returns the fallback.
    async fn fetch_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        Ok(self
            .fallback_models()
            .iter()
            .map(|(alias, id)| ModelInfo { id: id.clone(), name: alias.clone() })
            .collect())
    }

    /// Single-shot text call (no tool-calling).
    async fn call(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Function-calling call. Default degrades to `call` and drops tools,
    /// returning an empty `tool_calls` list.
    async fn call_with_tools(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut stripped = req.clone();
        stripped.tools.clear();
        self.call(&stripped).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_result_carries_call_id() {
        let m = Message::tool_result("call_1", "42");
        assert_eq!(m.role, Role::Tool);
        assert_eq!(m.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn chat_request_defaults_to_no_tools() {
        let req = ChatRequest::new(vec![Message::user("hi")]);
        assert!(req.tools.is_empty());
        assert!(!req.thinking);
    }
}
