/// Error Types
///
/// Two families of errors live here:
/// - `ToolError`: failures raised by tool handlers or by argument binding. Their
///   `Display` text is surfaced verbatim in `execute` error responses.
/// - `ServerError`: failures that stop the process, such as an unreadable
///   configuration file or a broken stdin/stdout stream.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single tool invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The tool ran and reported a failure of its own.
    #[error("{0}")]
    Failed(String),

    /// A parameter without a default was not supplied.
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    /// An argument was supplied that the tool does not declare.
    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    /// An argument was supplied with a value of the wrong shape.
    #[error("argument '{name}' must be {expected}")]
    InvalidArgument { name: String, expected: &'static str },
}

impl ToolError {
    /// Shorthand for a tool-reported failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Process-level errors that end the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to load configuration from {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid transport mode '{0}', expected 'stdio' or 'http'")]
    InvalidTransport(String),
}
