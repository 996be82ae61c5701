use thiserror::Error;

/// Shared error type for the core pipelines. Individual crates layer their
/// own `thiserror` enums on top and convert into this one at the boundary
/// where a caller needs a single uniform failure shape (the scheduler, the
/// ingestion pipeline, the agent loop).
#[derive(Debug, Error)]
pub enum HydraError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("AI provider error: {0}")]
    LlmProvider(String),

    #[error("channel error ({channel}): {reason}")]
    Channel { channel: String, reason: String },

    #[error("tool execution error: {0}")]
    ToolExecution(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request timeout after {ms}ms")]
    Timeout { ms: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

impl HydraError {
    /// Short SCREAMING_SNAKE_CASE classification, used to tag log lines and
    /// surfaced failures without leaking the full message into metrics.
    pub fn code(&self) -> &'static str {
        match self {
            HydraError::Config(_) => "CONFIG_ERROR",
            HydraError::AuthFailed(_) => "AUTH_FAILED",
            HydraError::PermissionDenied { .. } => "PERMISSION_DENIED",
            HydraError::NotFound { .. } => "NOT_FOUND",
            HydraError::Database(_) => "DATABASE_ERROR",
            HydraError::LlmProvider(_) => "LLM_PROVIDER_ERROR",
            HydraError::Channel { .. } => "CHANNEL_ERROR",
            HydraError::ToolExecution(_) => "TOOL_EXECUTION_ERROR",
            HydraError::Serialization(_) => "SERIALIZATION_ERROR",
            HydraError::Io(_) => "IO_ERROR",
            HydraError::Timeout { .. } => "TIMEOUT",
            HydraError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The ❌-prefixed, single-line message shown to an end user. Internal
    /// detail (stack traces, raw provider payloads) stays in the log only.
    pub fn user_facing(&self) -> String {
        format!("\u{274c} {self}")
    }
}

pub type Result<T> = std::result::Result<T, HydraError>;
