use thiserror::Error;

/// Errors surfaced by the composition root itself — distinct from the
/// per-crate errors of the pipelines it wires together, which are logged
/// and swallowed at the point they occur.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("channel error: {0}")]
    Channel(#[from] hydra_channels::ChannelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
