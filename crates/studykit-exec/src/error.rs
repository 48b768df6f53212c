//! Error types for process execution.

use thiserror::Error;

/// Errors returned by a [`CommandRunner`](crate::CommandRunner).
///
/// A command that runs and fails is not an error: it settles into an
/// [`ExecutionResult`](crate::ExecutionResult) with a non-zero exit code.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command must not be empty")]
    EmptyCommand,

    #[error("timeout for `{command}` must be greater than zero")]
    ZeroTimeout { command: String },

    #[error("failed waiting on `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for execution operations.
pub type Result<T> = std::result::Result<T, ExecError>;
