//! Claude's typed-content-block wire format: `tool_use`/`tool_result` blocks
//! in place of OpenAI's `tool_calls`, plus the extended-thinking beta block.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, Role, ToolCall};

const API_VERSION: &str = "2023-06-01";
const THINKING_BUDGET_TOKENS: u32 = 4096;

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
    fallback_models: HashMap<String, String>,
}

impl ClaudeProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            default_model,
            fallback_models: HashMap::new(),
        }
    }

    fn build_body(&self, req: &ChatRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        for m in &req.messages {
            match m.role {
                Role::System => continue,
                Role::Assistant if m.tool_calls.is_some() => {
                    let mut content = Vec::new();
                    if !m.content.is_empty() {
                        content.push(serde_json::json!({ "type": "text", "text": m.content }));
                    }
                    for tc in m.tool_calls.as_ref().unwrap() {
                        content.push(serde_json::json!({
                            "type": "tool_use",
                            "id": tc.id,
                            "name": tc.name,
                            "input": tc.arguments,
                        }));
                    }
                    messages.push(serde_json::json!({ "role": "assistant", "content": content }));
                }
                Role::Tool => {
                    messages.push(serde_json::json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": m.tool_call_id.clone().unwrap_or_default(),
                            "content": m.content,
                        }],
                    }));
                }
                Role::User | Role::Assistant => {
                    messages.push(serde_json::json!({
                        "role": if m.role == Role::User { "user" } else { "assistant" },
                        "content": m.content,
                    }));
                }
            }
        }

        let mut body = serde_json::json!({
            "model": req.model.clone().unwrap_or_else(|| self.default_model.clone()),
            "max_tokens": req.max_tokens,
            "system": req.system_prompt.clone().unwrap_or_default(),
            "messages": messages,
        });

        if !req.tools.is_empty() {
            let tools: Vec<serde_json::Value> = req
                .tools
                .iter()
                .map(|t| serde_json::json!({ "name": t.name, "description": t.description, "input_schema": t.input_schema }))
                .collect();
            body["tools"] = serde_json::json!(tools);
        }

        if req.thinking {
            body["thinking"] = serde_json::json!({ "type": "enabled", "budget_tokens": THINKING_BUDGET_TOKENS });
        }

        body
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn supports_thinking(&self) -> bool {
        true
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn fallback_models(&self) -> &HashMap<String, String> {
        &self.fallback_models
    }

    async fn call(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = self.build_body(req);
        let url = format!("{}/v1/messages", self.base_url);

        debug!("sending request to claude");

        let mut builder = self
            .client
            .post(&url)
            .header("anthropic-version", API_VERSION)
            .header("x-api-key", &self.api_key)
            .json(&body);

        if req.thinking {
            builder = builder.header("anthropic-beta", "extended-thinking-2025-01-01");
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();

        if status == 429 {
            let retry_after_ms = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000)
                .unwrap_or(5000);
            return Err(ProviderError::RateLimited { retry_after_ms });
        }

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "claude api error");
            return Err(ProviderError::Api { status, message: text });
        }

        let api_resp: ApiResponse = resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parse_response(api_resp))
    }
}

fn parse_response(resp: ApiResponse) -> ChatResponse {
    let mut text_parts = Vec::new();
    let mut thinking_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in resp.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::Thinking { thinking } => thinking_parts.push(thinking),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall { id, name, input }),
            ContentBlock::Unknown => {}
        }
    }

    ChatResponse {
        thinking: if thinking_parts.is_empty() { None } else { Some(thinking_parts.join("\n")) },
        content: text_parts.join(""),
        model: resp.model,
        tokens_in: resp.usage.input_tokens,
        tokens_out: resp.usage.output_tokens,
        tool_calls,
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "thinking")]
    Thinking { thinking: String },
    #[serde(rename = "tool_use")]
    ToolUse { id: String, name: String, input: serde_json::Value },
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolCallRequest;

    #[test]
    fn tool_result_message_becomes_user_tool_result_block() {
        let p = ClaudeProvider::new("sk-ant-test".into(), "https://api.anthropic.com".into(), "claude-sonnet-4-20250514".into());
        let req = ChatRequest::new(vec![
            Message::user("what's the weather?"),
            Message {
                role: Role::Assistant,
                content: String::new(),
                tool_call_id: None,
                tool_calls: Some(vec![ToolCallRequest { id: "call_1".into(), name: "weather".into(), arguments: serde_json::json!({}) }]),
            },
            Message::tool_result("call_1", "sunny"),
        ]);
        let body = p.build_body(&req);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[1]["content"][0]["type"], "tool_use");
        assert_eq!(messages[2]["content"][0]["type"], "tool_result");
    }

    #[test]
    fn thinking_block_added_only_when_requested() {
        let p = ClaudeProvider::new("sk-ant-test".into(), "https://api.anthropic.com".into(), "claude-sonnet-4-20250514".into());
        let mut req = ChatRequest::new(vec![Message::user("hi")]);
        assert!(p.build_body(&req).get("thinking").is_none());
        req.thinking = true;
        assert!(p.build_body(&req).get("thinking").is_some());
    }
}
