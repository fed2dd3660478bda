pub use anyhow::bail;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Exit code for usage-class failures (malformed arguments, bad addresses).
pub const EXIT_USAGE: i32 = 64;
/// Exit code for filesystem failures.
pub const EXIT_IO: i32 = 74;
/// Exit code for authentication failures.
pub const EXIT_AUTH: i32 = 77;

#[derive(Error, Debug)]
pub enum PkError {
    AuthenticationRequired,
    AuthenticationInvalid,
    Usage(String),
    Io(#[from] std::io::Error),
    Engine(String),
    Serialization(String),
    Other(#[from] anyhow::Error),
}

impl Display for PkError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PkError::AuthenticationRequired => {
                write!(f, "Authentication required\n\n")?;
                write!(f, "Fix:\n")?;
                write!(f, "  • Run: pk agent unlock, or\n")?;
                write!(f, "  • Set PK_PASSWORD / PK_TOKEN, or\n")?;
                write!(f, "  • Pass --password-file <path>")
            }
            PkError::AuthenticationInvalid => {
                write!(f, "Authentication failed: the supplied credential was rejected")
            }
            PkError::Usage(s) => write!(f, "Usage error: {}", s),
            PkError::Io(e) => write!(f, "I/O error: {}", e),
            PkError::Engine(s) => write!(f, "Engine error: {}", s),
            PkError::Serialization(s) => write!(f, "Serialization error: {}", s),
            PkError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl PkError {
    /// Map a failure class onto a distinct process exit code so scripts can
    /// branch on it.
    pub fn exit_code(&self) -> i32 {
        match self {
            PkError::Usage(_) => EXIT_USAGE,
            PkError::AuthenticationRequired | PkError::AuthenticationInvalid => EXIT_AUTH,
            PkError::Io(_) => EXIT_IO,
            PkError::Engine(_) | PkError::Serialization(_) | PkError::Other(_) => 1,
        }
    }
}

impl From<serde_json::Error> for PkError {
    fn from(err: serde_json::Error) -> Self {
        PkError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PkError>;
