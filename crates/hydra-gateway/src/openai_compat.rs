//! The OpenAI-compatible chat-completions wire shape, shared by five of the
//! eight vendors (openai/groq/glm/nvidia/openrouter/minimax).

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError, Role, ToolCall};

pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    provider_name: String,
    api_key: String,
    base_url: String,
    chat_path: String,
    default_model: String,
    fallback_models: HashMap<String, String>,
    /// OpenRouter additionally sends an `HTTP-Referer` identity header.
    http_referer: Option<&'static str>,
}

impl OpenAiCompatProvider {
    pub fn new(
        id: &str,
        api_key: String,
        base_url: String,
        chat_path: String,
        default_model: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_name: id.to_string(),
            api_key,
            base_url,
            chat_path,
            default_model,
            fallback_models: HashMap::new(),
            http_referer: if id == "openrouter" {
                Some("https://github.com/hydra-platform")
            } else {
                None
            },
        }
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn build_body(&self, req: &ChatRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(system) = &req.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        for m in &req.messages {
            let mut obj = serde_json::json!({
                "role": Self::role_str(m.role),
                "content": m.content,
            });
            if let Some(tool_call_id) = &m.tool_call_id {
                obj["tool_call_id"] = serde_json::json!(tool_call_id);
            }
            if let Some(tool_calls) = &m.tool_calls {
                let calls: Vec<serde_json::Value> = tool_calls
                    .iter()
                    .map(|tc| {
                        serde_json::json!({
                            "id": tc.id,
                            "type": "function",
                            "function": { "name": tc.name, "arguments": tc.arguments.to_string() },
                        })
                    })
                    .collect();
                obj["tool_calls"] = serde_json::json!(calls);
            }
            messages.push(obj);
        }

        let mut body = serde_json::json!({
            "model": req.model.clone().unwrap_or_else(|| self.default_model.clone()),
            "messages": messages,
            "max_tokens": req.max_tokens,
        });

        if !req.tools.is_empty() {
            let tools: Vec<serde_json::Value> = req
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::json!(tools);
        }

        body
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn supports_tools(&self) -> bool {
        true
    }

    fn supports_thinking(&self) -> bool {
        false
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn fallback_models(&self) -> &HashMap<String, String> {
        &self.fallback_models
    }

    async fn call(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = self.build_body(req);
        let url = format!("{}{}", self.base_url, self.chat_path);

        debug!(provider = %self.provider_name, "sending request");

        let mut builder = self.client.post(&url).bearer_auth(&self.api_key).json(&body);
        if let Some(referer) = self.http_referer {
            builder = builder.header("HTTP-Referer", referer);
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
            warn!(provider = %self.provider_name, status, body = %text, "vendor error");
            return Err(ProviderError::Api { status, message: text });
        }

        let api_resp: ApiResponse = resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parse_response(api_resp))
    }
}

fn parse_response(resp: ApiResponse) -> ChatResponse {
    let choice = resp.choices.into_iter().next();
    let content = choice.as_ref().and_then(|c| c.message.content.clone()).unwrap_or_default();

    let tool_calls: Vec<ToolCall> = choice
        .as_ref()
        .and_then(|c| c.message.tool_calls.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            input: serde_json::from_str(&tc.function.arguments).unwrap_or_else(|_| serde_json::json!({})),
        })
        .collect();

    ChatResponse {
        thinking: None,
        content,
        model: resp.model,
        tokens_in: resp.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
        tokens_out: resp.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
        tool_calls,
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Deserialize, Clone)]
struct ApiToolCall {
    id: String,
    function: ApiFunction,
}

#[derive(Deserialize, Clone)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Message;

    #[test]
    fn unconfigured_when_key_is_empty() {
        let p = OpenAiCompatProvider::new("openai", String::new(), "https://api.openai.com".into(), "/v1/chat/completions".into(), "gpt-4o-mini".into());
        assert!(!p.is_configured());
    }

    #[test]
    fn build_body_includes_system_prompt_and_tools() {
        let p = OpenAiCompatProvider::new("openai", "sk-test".into(), "https://api.openai.com".into(), "/v1/chat/completions".into(), "gpt-4o-mini".into());
        let mut req = ChatRequest::new(vec![Message::user("hi")]);
        req.system_prompt = Some("you are helpful".into());
        let body = p.build_body(&req);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn malformed_tool_arguments_parse_to_empty_object() {
        let raw = ApiToolCall {
            id: "call_1".into(),
            function: ApiFunction { name: "search".into(), arguments: "not json".into() },
        };
        let parsed: serde_json::Value = serde_json::from_str(&raw.function.arguments).unwrap_or_else(|_| serde_json::json!({}));
        assert_eq!(parsed, serde_json::json!({}));
    }
}
