//! Error types shared across the harness.

use std::time::Duration;

use thiserror::Error;

/// Error type for harness operations.
///
/// Remote failures carry the command's combined output, so negative
/// scenarios can match the tool's diagnostic text against the rendered
/// error message.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("command `{command}` exited with status {exit_code}: {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("command `{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    #[error("cluster provisioning failed: {0}")]
    ProvisionFailed(String),

    #[error("invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
