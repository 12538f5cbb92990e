//! Error types for the CLI

use std::path::PathBuf;
use thiserror::Error;
use uiprobe::{ProbeError, TreeParsingError};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// The snapshot file is not a valid UI tree
    #[error("{}:{}", path.display(), source)]
    Snapshot {
        /// Snapshot file
        path: PathBuf,
        /// Parse failure
        source: TreeParsingError,
    },

    /// No element matched the find criteria
    #[error("No element matches {criteria}")]
    NoMatch {
        /// Criteria description
        criteria: String,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// uiprobe library error
    #[error("{0}")]
    Probe(#[from] ProbeError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Attach the snapshot path to a parse failure
    #[must_use]
    pub fn snapshot(path: impl Into<PathBuf>, source: TreeParsingError) -> Self {
        Self::Snapshot {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_snapshot_error_is_positioned() {
        let source = TreeParsingError::at_offset(b"<tree>\n<x", 9, "Unexpected end of document");
        let err = CliError::snapshot("screen.xml", source);
        assert_eq!(
            err.to_string(),
            "screen.xml:[2:3] Unexpected end of document"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CliError = io_err.into();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_probe_error_passthrough() {
        let err: CliError = ProbeError::config("wait.poll_interval_ms must be greater than zero").into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
