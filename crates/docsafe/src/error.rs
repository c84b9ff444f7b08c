//! Error types for the document safety layer.
//!
//! Every fallible operation returns [`SafetyError`]. Document-quality
//! findings are never errors: the validator reports them as issues inside a
//! `ValidationResult`. This enum only covers failures that stop an operation
//! from completing.

use std::io;
use std::path::{Path, PathBuf};

use strum::Display;
use thiserror::Error;

use crate::transaction::TransactionState;

/// Closed classification of [`SafetyError`] variants.
///
/// Validation issues reuse this taxonomy so callers can match corruption
/// findings and corruption errors the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A source or target path does not exist.
    NotFound,
    /// The destination exists and replacing it was not permitted.
    OverwriteDenied,
    /// A backup copy could not be made before an allowed overwrite.
    Backup,
    /// A transaction operation was attempted in the wrong state.
    TransactionMisuse,
    /// A document failed to parse as its container format.
    Corruption,
    /// Any other filesystem failure.
    Io,
}

/// Errors surfaced by workspaces, the safe writer, transactions and the
/// validator.
#[derive(Debug, Error)]
pub enum SafetyError {
    /// A required file was missing.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// Path that does not exist.
        path: PathBuf,
    },

    /// The destination exists and the overwrite was refused.
    #[error("refusing to overwrite {}: {reason}", path.display())]
    OverwriteDenied {
        /// Destination that was left untouched.
        path: PathBuf,
        /// Why the overwrite was refused.
        reason: String,
    },

    /// Copying the destination to its backup sibling failed.
    #[error("failed to back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        /// File that was about to be overwritten.
        path: PathBuf,
        /// Backup path that could not be written.
        backup: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A transaction operation was not valid in the current state.
    #[error("cannot {operation} a transaction that is {state}")]
    TransactionMisuse {
        /// Operation the caller attempted.
        operation: &'static str,
        /// State the transaction was in.
        state: TransactionState,
    },

    /// The document could not be opened as a zipped XML package.
    #[error("corrupt document {}: {message}", path.display())]
    Corruption {
        /// Document that failed to open.
        path: PathBuf,
        /// Description of the structural failure.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("failed to {operation} {}: {source}", path.display())]
    Io {
        /// Short verb phrase naming the operation.
        operation: &'static str,
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl SafetyError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates an overwrite-denied error.
    #[must_use]
    pub fn overwrite_denied(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::OverwriteDenied {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a backup error.
    #[must_use]
    pub fn backup(path: impl Into<PathBuf>, backup: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Backup {
            path: path.into(),
            backup: backup.into(),
            source,
        }
    }

    /// Creates a transaction misuse error.
    #[must_use]
    pub const fn misuse(operation: &'static str, state: TransactionState) -> Self {
        Self::TransactionMisuse { operation, state }
    }

    /// Creates a corruption error.
    #[must_use]
    pub fn corruption(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corruption {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an I/O error that keeps `source`, whatever its kind.
    ///
    /// Callers that mean "the input is missing" check for it first and use
    /// [`SafetyError::not_found`].
    #[must_use]
    pub fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::OverwriteDenied { .. } => ErrorKind::OverwriteDenied,
            Self::Backup { .. } => ErrorKind::Backup,
            Self::TransactionMisuse { .. } => ErrorKind::TransactionMisuse,
            Self::Corruption { .. } => ErrorKind::Corruption,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}
