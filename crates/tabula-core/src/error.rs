//! Error types for tabula.
//!
//! This module provides a unified error type with explicit variants for the
//! three outcomes a caller has to tell apart: the input was rejected, the
//! record does not exist, or the storage medium failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::validate::Violations;

/// The unified error type for tabula operations.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more field constraints were violated.
    #[error("validation failed: {0}")]
    ValidationFailed(Violations),

    /// No record with the given id exists.
    #[error("record {id} not found")]
    NotFound { id: String },

    /// The storage medium could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    /// Input that could not be interpreted at all (bad id, non-object body).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Returns true if the caller can correct the request and retry.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Error::StorageUnavailable(_))
    }
}

/// Storage-level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem access failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted document exists but cannot be interpreted.
    #[error("corrupt document {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    /// The collection could not be serialized.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The embedded database reported an error.
    #[error("database error: {message}")]
    Database { message: String },

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {message}")]
    Task { message: String },
}

impl StorageError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a corruption error for the given document.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Input validation errors that are not field violations.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid record id.
    #[error("invalid id '{value}': {reason}")]
    RecordId { value: String, reason: String },

    /// Invalid record value.
    #[error("invalid record: {reason}")]
    Record { reason: String },
}
