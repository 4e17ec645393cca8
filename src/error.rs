//! Domain-specific error types for casetest.
//!
//! This module defines `CasetestError`, a `thiserror`-based enum that
//! provides typed error variants for common failure modes. Public API
//! functions return `Result<T, CasetestError>` for programmatic error
//! handling, while trait boundaries continue to use `anyhow::Result`.
//!
//! `CasetestError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at trait boundaries that return `anyhow::Result`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent, user-friendly messages for common IO error kinds
/// instead of the OS-level messages (e.g., "No such file or directory
/// (os error 2)"). For unrecognized error kinds, falls back to including
/// the OS-level error message directly.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for casetest.
///
/// Provides typed variants for common failure modes, enabling callers
/// to match on error kinds programmatically rather than parsing error
/// message strings.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CasetestError {
    /// A validation constraint was violated (bad config, pre-flight check failed).
    #[error("validation error: {0}")]
    Validation(String),

    /// A command execution failed (non-zero exit, spawn failure, wait failure).
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The command that was executed.
        command: String,
        /// Human-readable reason for the failure: exit code, signal information,
        /// or a description of the internal error (e.g. thread spawn failure).
        status: String,
    },

    /// A test name did not match the expected grammar.
    #[error("test name error: {0}")]
    TestName(String),

    /// A run profile could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An illegal state-machine transition was requested.
    ///
    /// This indicates a programming error in the scheduler itself, not a
    /// recoverable runtime condition; callers are expected to panic rather
    /// than propagate it, but it is typed so tests can assert on it.
    #[error("state machine violation: {0}")]
    StateMachine(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred (a path, or an
        /// operation description with a path).
        context: String,
        /// Human-readable description of the I/O failure, derived from
        /// [`io_error_kind_message`] for consistent formatting.
        message: String,
        /// The underlying I/O error, preserved for programmatic inspection.
        #[source]
        source: std::io::Error,
    },
}

impl CasetestError {
    /// Creates an `Io` variant with the `message` field automatically derived
    /// from the `source` via [`io_error_kind_message`].
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }
}
