//! The bounded tool-calling loop: build the system prompt, build the message
//! history, call with tools, and — for each tool call the provider emits —
//! validate, execute, and append the result, looping until either the
//! provider stops requesting tools or a hard iteration cap is hit.

use std::collections::HashMap;
use std::sync::Arc;

use hydra_gateway::{AiGateway, ChatRequest, Message, ToolCall, ToolCallRequest};
use serde_json::Value;

use crate::agent::{tools_for_agent, Agent};
use crate::skill::SkillRegistry;
use crate::tool::{run_tool, Tool, ToolResult};

const DEFAULT_MAX_TOOL_CALLS: u32 = 10;

/// Final result of a run: the assistant's answer plus every tool call and
/// result accumulated along the way, per spec's `AgentResponse` shape.
#[derive(Debug, Clone, Default)]
pub struct AgentResponse {
    pub content: String,
    pub thinking: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub tool_results: Vec<ToolResult>,
    pub metadata: HashMap<String, Value>,
}

impl AgentResponse {
    fn bound_exceeded(tool_calls: Vec<ToolCall>, tool_results: Vec<ToolResult>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("max_calls_reached".to_string(), Value::Bool(true));
        Self {
            content: "Maximum tool calls reached. Please refine your request.".to_string(),
            thinking: None,
            tool_calls,
            tool_results,
            metadata,
        }
    }

    fn from_content(content: String) -> Self {
        Self { content, ..Default::default() }
    }

    fn finished(
        content: String,
        thinking: Option<String>,
        tool_calls: Vec<ToolCall>,
        tool_results: Vec<ToolResult>,
    ) -> Self {
        Self { content, thinking, tool_calls, tool_results, metadata: HashMap::new() }
    }
}

/// Runs one agent turn to completion: builds the system prompt (agent base
/// prompt plus any matching skill injection), calls the gateway, executes
/// any requested tools, and loops until the model stops requesting tools or
/// `max_tool_calls` is exceeded.
pub async fn run_agent(
    gateway: &AiGateway,
    agent: &Agent,
    registry: &HashMap<String, Arc<dyn Tool>>,
    skills: &SkillRegistry,
    message: &str,
    history: &[Message],
    model: Option<String>,
    max_tool_calls: Option<u32>,
    skill_names: Option<&[String]>,
) -> AgentResponse {
    let max_tool_calls = max_tool_calls.unwrap_or(DEFAULT_MAX_TOOL_CALLS);
    let agent_tools = tools_for_agent(agent, registry);

    let system_prompt = build_system_prompt(agent, skills, message, skill_names);
    let tool_defs: Vec<_> = agent_tools.iter().map(|t| t.to_definition()).collect();

    let mut messages: Vec<Message> = history.to_vec();
    messages.push(Message::user(message));

    let mut all_tool_calls: Vec<ToolCall> = Vec::new();
    let mut all_tool_results: Vec<ToolResult> = Vec::new();

    let mut loop_count = 0u32;
    loop {
        if loop_count >= max_tool_calls {
            return AgentResponse::bound_exceeded(all_tool_calls, all_tool_results);
        }
        loop_count += 1;

        let mut req = ChatRequest::new(messages.clone());
        req.system_prompt = Some(system_prompt.clone());
        req.model = model.clone();
        req.tools = tool_defs.clone();

        let response = if tool_defs.is_empty() {
            gateway.call(&req).await
        } else {
            gateway.call_with_tools(&req).await
        };

        let response = match response {
            Ok(r) => r,
            Err(e) => return AgentResponse::from_content(format!("AI provider error: {e}")),
        };

        if response.tool_calls.is_empty() {
            return AgentResponse::finished(response.content, response.thinking, all_tool_calls, all_tool_results);
        }

        messages.push(Message {
            role: hydra_gateway::Role::Assistant,
            content: response.content,
            tool_call_id: None,
            tool_calls: Some(
                response
                    .tool_calls
                    .iter()
                    .map(|tc| ToolCallRequest { id: tc.id.clone(), name: tc.name.clone(), arguments: tc.input.clone() })
                    .collect(),
            ),
        });

        for call in &response.tool_calls {
            let result = match agent_tools.iter().find(|t| t.name() == call.name) {
                Some(tool) => run_tool(tool.as_ref(), call.input.clone()).await,
                None => crate::tool::ToolResult::error(format!("unknown tool: {}", call.name)),
            };
            messages.push(Message::tool_result(call.id.clone(), result.to_message_content()));
            all_tool_results.push(result);
        }
        all_tool_calls.extend(response.tool_calls);
    }
}

fn build_system_prompt(agent: &Agent, skills: &SkillRegistry, message: &str, skill_names: Option<&[String]>) -> String {
    let skill_context = skills.build_skill_context(message, skill_names, agent.max_skills);
    if skill_context.is_empty() {
        agent.system_prompt.to_string()
    } else {
        format!("{}\n\n{}", skill_context, agent.system_prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_core::config::AiConfig;
    use rusqlite::Connection;

    fn empty_registry() -> HashMap<String, Arc<dyn Tool>> {
        HashMap::new()
    }

    #[tokio::test]
    async fn no_provider_configured_returns_error_content() {
        let gateway = AiGateway::new(&AiConfig::default(), Connection::open_in_memory().unwrap()).unwrap();
        let agent = crate::agent::default_agent();
        let registry = empty_registry();
        let skills = SkillRegistry::default();

        let response = run_agent(&gateway, agent, &registry, &skills, "hello", &[], None, None, None).await;
        assert!(response.content.contains("AI provider error"));
        assert!(response.metadata.is_empty());
    }

    #[test]
    fn build_system_prompt_without_skills_is_just_the_base_prompt() {
        let agent = crate::agent::default_agent();
        let skills = SkillRegistry::default();
        let prompt = build_system_prompt(agent, &skills, "hello", None);
        assert_eq!(prompt, agent.system_prompt);
    }

    #[test]
    fn bound_exceeded_sets_max_calls_reached_metadata_and_keeps_tool_history() {
        let calls = vec![ToolCall { id: "1".into(), name: "calculator".into(), input: Value::Null }];
        let results = vec![crate::tool::ToolResult::ok(Value::from(42))];
        let response = AgentResponse::bound_exceeded(calls, results);
        assert_eq!(response.metadata.get("max_calls_reached"), Some(&Value::Bool(true)));
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_results.len(), 1);
    }
}
