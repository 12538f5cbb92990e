//! Result and error types for uiprobe.

use crate::selector::NodePosition;
use thiserror::Error;

/// Result type for uiprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Boxed lower-level cause attached to a parse failure
pub type ParseCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur in uiprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The snapshot document is malformed or violates the tree structure
    #[error("Invalid UI tree: {0}")]
    TreeParsing(#[from] TreeParsingError),

    /// No element matched before the deadline
    #[error("Could not find element with {criteria} (timeout {timeout_ms}ms, polling every {poll_interval_ms}ms)")]
    NotFound {
        /// Search criteria, formatted as `"property"='value'`
        criteria: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Polling interval in milliseconds
        poll_interval_ms: u64,
    },

    /// The element was found but its geometry never settled
    #[error("Element with {criteria} still not stable after {timeout_ms}ms (polling every {poll_interval_ms}ms)")]
    NotStable {
        /// Search criteria
        criteria: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Polling interval in milliseconds
        poll_interval_ms: u64,
    },

    /// The element vanished while waiting for it to stabilize
    #[error("Element with {criteria} disappeared while waiting for a stable position (timeout {timeout_ms}ms, polling every {poll_interval_ms}ms)")]
    Disappeared {
        /// Search criteria
        criteria: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Polling interval in milliseconds
        poll_interval_ms: u64,
    },

    /// The element was still present when waiting for it to go away
    #[error("Element with {criteria} still present after {timeout_ms}ms (polling every {poll_interval_ms}ms)")]
    StillPresent {
        /// Search criteria
        criteria: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Polling interval in milliseconds
        poll_interval_ms: u64,
    },

    /// Predicate-based lookup exhausted its retries
    #[error("Could not find node matching {predicate} at position {position} after {attempts} attempts (retrying every {delay_ms}ms)")]
    NodeNotFound {
        /// Predicate description
        predicate: String,
        /// Requested position in the match list
        position: NodePosition,
        /// Number of attempts made
        attempts: u32,
        /// Delay between attempts in milliseconds
        delay_ms: u64,
    },

    /// Error reported by the device session, passed through unchanged
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this is one of the "element never showed up" failures
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NodeNotFound { .. })
    }
}

/// A snapshot document could not be turned into a tree.
///
/// Always carries the 1-based line and column of the scanner when the
/// failure was detected.
#[derive(Debug, Error)]
#[error("[{line}:{column}] {message}")]
pub struct TreeParsingError {
    /// 1-based line
    pub line: usize,
    /// 1-based column, in characters
    pub column: usize,
    /// Human readable description
    pub message: String,
    /// Lower-level failure (markup or encoding), if any
    #[source]
    pub cause: Option<ParseCause>,
}

impl TreeParsingError {
    /// Create an error at the given byte offset of `document`
    #[must_use]
    pub fn at_offset(document: &[u8], offset: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_and_column(document, offset);
        Self {
            line,
            column,
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the lower-level cause
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<ParseCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

fn line_and_column(document: &[u8], offset: usize) -> (usize, usize) {
    let scanned = document.get(..offset.min(document.len())).unwrap_or_default();
    let line_start = scanned
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |pos| pos + 1);
    let line = 1 + scanned.iter().filter(|b| **b == b'\n').count();
    let tail = scanned.get(line_start..).unwrap_or_default();
    let column = 1 + String::from_utf8_lossy(tail).chars().count();
    (line, column)
}

/// Failure reported by a device session or telemetry sink.
///
/// "No such element" is never an error: lookups report it as
/// [`Lookup::NotFound`](crate::session::Lookup::NotFound).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The remote end answered with a protocol error
    #[error("{command} failed: {message}")]
    Protocol {
        /// Remote command that failed
        command: String,
        /// Error message
        message: String,
    },

    /// The remote end could not be reached
    #[error("Transport failure: {message}")]
    Transport {
        /// Error message
        message: String,
    },
}

impl SessionError {
    /// Create a protocol error
    #[must_use]
    pub fn protocol(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a transport error
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}
