//! Error types for remdav.

use thiserror::Error;

/// Errors that can occur in remdav-core operations.
#[derive(Error, Debug)]
pub enum RemDavError {
    #[error("'remind' not found in PATH")]
    RemindNotInstalled,

    #[error("Failed to run remind: {0}")]
    RemindInvocation(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("The Remind source is standard input and cannot be modified")]
    StdinImmutable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for remdav-core operations.
pub type RemDavResult<T> = Result<T, RemDavError>;
