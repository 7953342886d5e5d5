use thiserror::Error;

/// Configuration problems reported synchronously at session start.
/// Recoverable: the caller fixes the settings and starts again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacerError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Remote persistence failure. Never surfaced to the session engine;
/// the recorder absorbs it by queuing the summary locally.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("offline mode")]
    Offline,
}
