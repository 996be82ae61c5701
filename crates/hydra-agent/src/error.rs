use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unknown agent: {0}")]
    UnknownAgent(String),

    #[error("provider error: {0}")]
    Provider(#[from] hydra_gateway::ProviderError),

    #[error("no AI provider configured")]
    NoProvider,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("skill parse error in {path}: {reason}")]
    SkillParse { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AgentError>;
