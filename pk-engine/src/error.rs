use pk_core::PkError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors crossing the engine boundary.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("agent is not running under {}", path.display())]
    NotRunning { path: PathBuf },
    #[error("the engine rejected the supplied credential")]
    AuthInvalid,
    #[error("vault or secret not found: {0}")]
    NotFound(String),
    #[error("secret already exists: {0}")]
    AlreadyExists(String),
    #[error("engine request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected engine response: {status} - {body}")]
    Protocol { status: u16, body: String },
    #[error("malformed engine data: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineError> for PkError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::AuthInvalid => PkError::AuthenticationInvalid,
            EngineError::Io(e) => PkError::Io(e),
            other => PkError::Engine(other.to_string()),
        }
    }
}
