//! AI provider gateway: a uniform interface over 8 vendors,
//! message canonicalization, provider selection/fallback, and token-usage
//! tracing.

pub mod claude;
pub mod gateway;
pub mod gemini;
pub mod openai_compat;
pub mod provider;
pub mod registry;
pub mod selection;
pub mod tracer;

pub use gateway::AiGateway;
pub use provider::{
    ChatRequest, ChatResponse, LlmProvider, Message, ModelInfo, ProviderError, Role, ToolCall,
    ToolCallRequest, ToolDefinition,
};
