//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the CLI itself.
///
/// Map errors produced while a script runs are not `CliError`s: they are
/// part of the script's output.
#[derive(Debug, Error)]
pub enum CliError {
    /// A script file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Script path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A script line could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        message: String,
    },

    /// The report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown output format.
    #[error("unknown output format `{0}` (expected text or json)")]
    Format(String),
}

impl CliError {
    /// Creates a parse error.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
