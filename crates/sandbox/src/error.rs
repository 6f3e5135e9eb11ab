use crate::types::SandboxId;

/// Failures reported by an [`ExecutionBackend`](crate::ExecutionBackend).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote error: {0}")]
    Remote(String),

    #[error("sandbox not found: {0}")]
    NotFound(SandboxId),

    #[error(transparent)]
    Throttled(#[from] admission::AdmissionError),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no active sandbox session")]
    NoActiveSession,

    #[error("sandbox session {0} is already active, clean it up first")]
    SessionActive(SandboxId),

    #[error("invalid sandbox configuration: {0}")]
    InvalidConfig(String),

    #[error("{message}: {source}")]
    Backend {
        message: &'static str,
        #[source]
        source: BackendError,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;
