//! Error types for YuDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in YuDB core operations.
///
/// Expected failures such as an invalid name or a missing schema are not
/// errors; they are reported as [`crate::Outcome::Message`]. A `CoreError`
/// always means an external subsystem failed or was misconfigured.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage engine error, passed through unmodified.
    #[error("storage error: {0}")]
    Storage(#[from] yudb_storage::StorageError),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A named schema could not be resolved.
    #[error("schema not found: {name}")]
    SchemaNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// Backup data is malformed or of an unsupported version.
    #[error("invalid backup format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Checksum mismatch detected.
    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// Restore was requested but no backup exists.
    #[error("no backup available")]
    NoBackup,

    /// Credential store failure.
    #[error("credential error: {message}")]
    Credentials {
        /// Description of the failure.
        message: String,
    },

    /// A collaborator needed by the operation was not configured.
    #[error("{subsystem} subsystem is not configured")]
    NotConfigured {
        /// Name of the missing subsystem.
        subsystem: &'static str,
    },
}

impl CoreError {
    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates a credential error.
    pub fn credentials(message: impl Into<String>) -> Self {
        Self::Credentials {
            message: message.into(),
        }
    }

    /// Creates a schema-not-found error.
    pub fn schema_not_found(name: impl Into<String>) -> Self {
        Self::SchemaNotFound { name: name.into() }
    }
}
