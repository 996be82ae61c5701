//! Typed tool parameters, the `Tool` trait, and JSON-Schema generation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-Schema primitive types a tool parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

/// One parameter a tool accepts.
#[derive(Debug, Clone)]
pub struct ToolParameter {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub required: bool,
    pub enum_values: Option<&'static [&'static str]>,
    pub default: Option<Value>,
}

impl ToolParameter {
    pub fn new(name: &'static str, param_type: ParamType, description: &'static str, required: bool) -> Self {
        Self { name, param_type, description, required, enum_values: None, default: None }
    }

    pub fn with_enum(mut self, values: &'static [&'static str]) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Result of executing a tool. Never an exception —
/// failures are values, handled uniformly by the orchestrator loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl ToolResult {
    pub fn ok(output: impl Into<Value>) -> Self {
        Self { success: true, output: output.into(), error: None, metadata: HashMap::new() }
    }

    pub fn ok_with_metadata(output: impl Into<Value>, metadata: HashMap<String, Value>) -> Self {
        Self { success: true, output: output.into(), error: None, metadata }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, output: Value::Null, error: Some(message.into()), metadata: HashMap::new() }
    }

    /// Serialize into the text the orchestrator appends as a `role: tool`
    /// message: structured output as
    /// pretty JSON, scalars as their string form.
    pub fn to_message_content(&self) -> String {
        if !self.success {
            return self.error.clone().unwrap_or_else(|| "tool failed".to_string());
        }
        match &self.output {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            structured => serde_json::to_string_pretty(structured).unwrap_or_default(),
        }
    }
}

/// Common interface for every built-in tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> &[ToolParameter];

    /// Validate `args` against `parameters()` before dispatching to
    /// `execute`. Returns the first missing-required-parameter error found.
    fn validate(&self, args: &Value) -> Option<String> {
        for param in self.parameters() {
            if param.required && args.get(param.name).is_none() {
                return Some(format!("missing required parameter: {}", param.name));
            }
        }
        None
    }

    async fn execute(&self, args: Value) -> ToolResult;

    /// JSON-Schema function description consumable by every provider
    ///.
    fn to_definition(&self) -> hydra_gateway::ToolDefinition {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in self.parameters() {
            let mut prop = serde_json::json!({
                "type": param.param_type.as_str(),
                "description": param.description,
            });
            if let Some(values) = param.enum_values {
                prop["enum"] = Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect());
            }
            if let Some(default) = &param.default {
                prop["default"] = default.clone();
            }
            properties.insert(param.name.to_string(), prop);
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        hydra_gateway::ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": Value::Object(properties),
                "required": Value::Array(required),
            }),
        }
    }
}

/// Run a tool after validating its parameters, never panicking and never
/// propagating an error — a failed validation or execution both surface as
/// a failed `ToolResult`.
pub async fn run_tool(tool: &dyn Tool, args: Value) -> ToolResult {
    if let Some(reason) = tool.validate(&args) {
        return ToolResult::error(reason);
    }
    tool.execute(args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters(&self) -> &[ToolParameter] {
            static PARAMS: once_cell::sync::Lazy<Vec<ToolParameter>> = once_cell::sync::Lazy::new(|| {
                vec![ToolParameter::new("text", ParamType::String, "text to echo", true)]
            });
            &PARAMS
        }
        async fn execute(&self, args: Value) -> ToolResult {
            ToolResult::ok(args.get("text").cloned().unwrap_or(Value::Null))
        }
    }

    #[tokio::test]
    async fn missing_required_param_fails_before_execute() {
        let result = run_tool(&Echo, serde_json::json!({})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("text"));
    }

    #[tokio::test]
    async fn valid_args_execute_and_return_success() {
        let result = run_tool(&Echo, serde_json::json!({"text": "hi"})).await;
        assert!(result.success);
        assert_eq!(result.output, serde_json::json!("hi"));
    }

    #[test]
    fn structured_output_serializes_as_pretty_json() {
        let result = ToolResult::ok(serde_json::json!({"a": 1}));
        assert!(result.to_message_content().contains('\n'));
    }

    #[test]
    fn scalar_output_serializes_as_string_form() {
        let result = ToolResult::ok(serde_json::json!(42));
        assert_eq!(result.to_message_content(), "42");
    }

    #[test]
    fn to_definition_lists_required_params() {
        let def = Echo.to_definition();
        assert_eq!(def.name, "echo");
        assert_eq!(def.input_schema["required"][0], "text");
    }
}
