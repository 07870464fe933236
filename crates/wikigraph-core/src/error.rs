//! Error types for the wikigraph system.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! This ensures composable error handling across crates.
//!
//! Index and graph queries never fail on unknown identities or broken links;
//! only the document mover (and the storage collaborators it drives) produce
//! the move-related variants.

use std::fmt;
use std::io;
use thiserror::Error as ThisError;

/// The step of a document move that was executing when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    /// Reading original content before any mutation
    Capture,
    /// Renaming the document in storage
    Rename,
    /// Writing the moved document's own updated content
    RewriteMoved,
    /// Rewriting an inbound-linking document
    RewriteLinks,
}

impl fmt::Display for MoveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Capture => "capture",
            Self::Rename => "rename",
            Self::RewriteMoved => "rewrite-moved-document",
            Self::RewriteLinks => "rewrite-links",
        };
        f.write_str(name)
    }
}

/// The core error type for all wikigraph operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Storage I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Document does not exist
    #[error("Document not found: {id}")]
    NotFound { id: String },

    /// Destination already exists and overwrite was not requested
    #[error("Document already exists: {id}")]
    AlreadyExists { id: String },

    /// Path escapes the permitted root or is malformed
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// A move step failed and every completed step was compensated
    #[error("Move failed at step {step} on {document} after {completed} completed write(s): {cause}")]
    MoveFailed {
        document: String,
        step: MoveStep,
        completed: usize,
        #[source]
        cause: Box<Error>,
    },

    /// Compensation after a failed move did not complete
    #[error("Rollback failed ({} restore error(s): {}) after: {cause}", .failures.len(), .failures.join("; "))]
    RollbackFailed {
        #[source]
        cause: Box<Error>,
        failures: Vec<String>,
    },

    /// Invalid link target or other input validation failure
    #[error("Validation error: {reason}")]
    Validation { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Malformed document header or configuration file
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound { id: id.into() }
    }

    /// Create an already exists error
    pub fn already_exists(id: impl Into<String>) -> Self {
        Error::AlreadyExists { id: id.into() }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a move failed error wrapping the original cause
    pub fn move_failed(
        document: impl Into<String>,
        step: MoveStep,
        completed: usize,
        cause: Error,
    ) -> Self {
        Error::MoveFailed {
            document: document.into(),
            step,
            completed,
            cause: Box::new(cause),
        }
    }

    /// Create a rollback failed error, keeping the original cause
    pub fn rollback_failed(cause: Error, failures: Vec<String>) -> Self {
        Error::RollbackFailed {
            cause: Box::new(cause),
            failures,
        }
    }

    /// Create a validation error
    pub fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Error::Parse {
            reason: reason.into(),
        }
    }

    /// Whether this error left the corpus untouched (failed move fully compensated).
    pub fn is_compensated(&self) -> bool {
        !matches!(self, Error::RollbackFailed { .. })
    }
}
