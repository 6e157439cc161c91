//! Error types for storage engine operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed error raised by a caller-supplied document callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during storage engine operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored or submitted text is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The database does not exist.
    #[error("database not found: {database}")]
    DatabaseNotFound {
        /// Name of the database.
        database: String,
    },

    /// The database already exists.
    #[error("database already exists: {database}")]
    DatabaseExists {
        /// Name of the database.
        database: String,
    },

    /// The collection does not exist.
    #[error("collection not found: {database}/{collection}")]
    CollectionNotFound {
        /// Owning database.
        database: String,
        /// Name of the collection.
        collection: String,
    },

    /// The collection already exists.
    #[error("collection already exists: {database}/{collection}")]
    CollectionExists {
        /// Owning database.
        database: String,
        /// Name of the collection.
        collection: String,
    },

    /// A name cannot be used as a database or collection name by this engine.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// A collection schema is malformed.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A document does not satisfy its collection schema.
    #[error("schema violation in {database}/{collection}: {message}")]
    SchemaViolation {
        /// Owning database.
        database: String,
        /// Collection whose schema was violated.
        collection: String,
        /// Description of the violation.
        message: String,
    },

    /// A document is not a JSON object.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Another document in the collection already uses this `$id`.
    #[error("duplicate document id {id} in {database}/{collection}")]
    DuplicateId {
        /// Owning database.
        database: String,
        /// Collection holding the duplicate.
        collection: String,
        /// The conflicting `$id`.
        id: String,
    },

    /// A filter or transform callback failed while evaluating a document.
    #[error("document callback failed: {0}")]
    Callback(CallbackError),

    /// Another process holds the engine directory.
    #[error("storage locked: another process has exclusive access")]
    Locked,

    /// Persisted engine data is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Wraps a callback failure.
    pub fn callback(err: impl Into<CallbackError>) -> Self {
        Self::Callback(err.into())
    }

    /// Creates a database-not-found error.
    pub fn database_not_found(database: &str) -> Self {
        Self::DatabaseNotFound {
            database: database.to_string(),
        }
    }

    /// Creates a collection-not-found error.
    pub fn collection_not_found(database: &str, collection: &str) -> Self {
        Self::CollectionNotFound {
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }

    /// Creates a schema violation error.
    pub fn schema_violation(database: &str, collection: &str, message: impl Into<String>) -> Self {
        Self::SchemaViolation {
            database: database.to_string(),
            collection: collection.to_string(),
            message: message.into(),
        }
    }
}
