//! Gemini's `contents`/`parts` wire format, with the system prompt carried
//! in a separate `systemInstruction` field rather than as a message.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, Role, ToolCall};

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    default_model: String,
    fallback_models: HashMap<String, String>,
}

impl GeminiProvider {
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
        let mut contents = Vec::new();
        for m in &req.messages {
            match m.role {
                Role::System => continue,
                Role::User => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{ "text": m.content }],
                })),
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !m.content.is_empty() {
                        parts.push(serde_json::json!({ "text": m.content }));
                    }
                    if let Some(tool_calls) = &m.tool_calls {
                        for tc in tool_calls {
                            parts.push(serde_json::json!({
                                "functionCall": { "name": tc.name, "args": tc.arguments },
                            }));
                        }
                    }
                    contents.push(serde_json::json!({ "role": "model", "parts": parts }));
                }
                Role::Tool => contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{
                        "functionResponse": {
                            "name": m.tool_call_id.clone().unwrap_or_default(),
                            "response": { "content": m.content },
                        }
                    }],
                })),
            }
        }

        let mut body = serde_json::json!({ "contents": contents });

        if let Some(system) = &req.system_prompt {
            body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": system }] });
        }

        if !req.tools.is_empty() {
            let declarations: Vec<serde_json::Value> = req
                .tools
                .iter()
                .map(|t| serde_json::json!({ "name": t.name, "description": t.description, "parameters": t.input_schema }))
                .collect();
            body["tools"] = serde_json::json!([{ "functionDeclarations": declarations }]);
        }

        body
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
        let model = req.model.clone().unwrap_or_else(|| self.default_model.clone());
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        debug!(%model, "sending request to gemini");

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited { retry_after_ms: 5000 });
        }

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "gemini api error");
            return Err(ProviderError::Api { status, message: text });
        }

        let api_resp: ApiResponse = resp.json().await.map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parse_response(api_resp, model))
    }
}

fn parse_response(resp: ApiResponse, model: String) -> ChatResponse {
    let candidate = resp.candidates.into_iter().next();
    let parts = candidate.map(|c| c.content.parts).unwrap_or_default();

    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();
    for (i, part) in parts.into_iter().enumerate() {
        if let Some(text) = part.text {
            text_parts.push(text);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolCall { id: format!("call_{i}"), name: call.name, input: call.args });
        }
    }

    ChatResponse {
        thinking: None,
        content: text_parts.join(""),
        model,
        tokens_in: resp.usage_metadata.as_ref().map(|u| u.prompt_token_count).unwrap_or(0),
        tokens_out: resp.usage_metadata.as_ref().map(|u| u.candidates_token_count).unwrap_or(0),
        tool_calls,
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<FunctionCall>,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    args: serde_json::Value,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_goes_to_system_instruction_not_contents() {
        let p = GeminiProvider::new("test-key".into(), "https://generativelanguage.googleapis.com".into(), "gemini-2.0-flash".into());
        let mut req = ChatRequest::new(vec![Message::user("hi")]);
        req.system_prompt = Some("be terse".into());
        let body = p.build_body(&req);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(body["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn assistant_tool_call_becomes_function_call_part() {
        use crate::provider::ToolCallRequest;
        let p = GeminiProvider::new("test-key".into(), "https://generativelanguage.googleapis.com".into(), "gemini-2.0-flash".into());
        let req = ChatRequest::new(vec![Message {
            role: Role::Assistant,
            content: String::new(),
            tool_call_id: None,
            tool_calls: Some(vec![ToolCallRequest { id: "1".into(), name: "search".into(), arguments: serde_json::json!({"q": "btc"}) }]),
        }]);
        let body = p.build_body(&req);
        assert_eq!(body["contents"][0]["parts"][0]["functionCall"]["name"], "search");
    }
}
