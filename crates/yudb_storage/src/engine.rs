//! Storage engine trait definition.

use crate::error::{CallbackError, StorageError, StorageResult};

/// Filter callback invoked by an engine once per stored document.
///
/// The engine hands over the document in its encoded (JSON text) form.
/// Returning an error aborts the whole engine operation.
pub trait DocumentFilter {
    /// Decides whether the encoded document matches.
    fn matches(&self, document: &str) -> StorageResult<bool>;
}

/// Transform callback invoked by an engine once per matching document.
pub trait DocumentTransform {
    /// Produces the encoded replacement for an encoded document.
    fn transform(&self, document: &str) -> StorageResult<String>;
}

impl<F> DocumentFilter for F
where
    F: Fn(&str) -> Result<bool, CallbackError>,
{
    fn matches(&self, document: &str) -> StorageResult<bool> {
        self(document).map_err(StorageError::Callback)
    }
}

impl<F> DocumentTransform for F
where
    F: Fn(&str) -> Result<String, CallbackError>,
{
    fn transform(&self, document: &str) -> StorageResult<String> {
        self(document).map_err(StorageError::Callback)
    }
}

/// Filter matching every document without decoding it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchAll;

impl DocumentFilter for MatchAll {
    fn matches(&self, _document: &str) -> StorageResult<bool> {
        Ok(true)
    }
}

/// The authoritative document store behind YuDB.
///
/// An engine owns the namespace of databases and collections, the
/// collection schemas, and every stored document. Documents cross this
/// boundary as JSON text; the engine assigns a `$id` to documents that
/// arrive without one and validates every write against the schema.
///
/// # Invariants
///
/// - `list_databases` and `list_collections` report exactly the entities
///   that currently exist, in lexicographic order
/// - `read_documents` returns documents in insertion order
/// - `delete_documents` and `replace_documents` evaluate every callback
///   before mutating anything, so a failing callback leaves the collection
///   unchanged
/// - Callbacks may read from the engine that invokes them but must not
///   write to it; a write from inside a callback deadlocks
/// - Engines must be `Send + Sync` so facades can share them
///
/// # Implementors
///
/// - [`super::InMemoryEngine`] - For testing and ephemeral use
/// - [`super::FileEngine`] - Directory-backed persistent engine
pub trait StorageEngine: Send + Sync {
    /// Lists every database.
    fn list_databases(&self) -> StorageResult<Vec<String>>;

    /// Lists the collections of a database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the database does not exist.
    fn list_collections(&self, database: &str) -> StorageResult<Vec<String>>;

    /// Creates an empty database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseExists` if the name is taken.
    fn create_database(&self, database: &str) -> StorageResult<()>;

    /// Deletes a database and everything in it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` if the database does not exist.
    fn delete_database(&self, database: &str) -> StorageResult<()>;

    /// Creates a collection governed by the encoded schema.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The database does not exist
    /// - The collection already exists
    /// - The schema is malformed
    fn create_collection(&self, database: &str, collection: &str, schema: &str)
        -> StorageResult<()>;

    /// Deletes a collection and its documents.
    fn delete_collection(&self, database: &str, collection: &str) -> StorageResult<()>;

    /// Returns the encoded schema of a collection.
    fn read_schema(&self, database: &str, collection: &str) -> StorageResult<String>;

    /// Writes one encoded document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a JSON object, reuses an
    /// existing `$id`, or violates the collection schema.
    fn write_document(&self, database: &str, collection: &str, document: &str)
        -> StorageResult<()>;

    /// Returns every encoded document the filter accepts.
    fn read_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
    ) -> StorageResult<Vec<String>>;

    /// Deletes every document the filter accepts and returns how many.
    fn delete_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
    ) -> StorageResult<usize>;

    /// Replaces every document the filter accepts with its transform.
    ///
    /// Returns the number of replaced documents.
    fn replace_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
        transform: &dyn DocumentTransform,
    ) -> StorageResult<usize>;
}

/// Rejects names an engine cannot store safely.
///
/// This is deliberately looser than the facade's identifier rules: engines
/// only refuse names that are empty or would escape a directory.
pub(crate) fn check_name(name: &str) -> StorageResult<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_filter_maps_errors() {
        let filter = |doc: &str| -> Result<bool, CallbackError> {
            if doc.is_empty() {
                Err("empty document".into())
            } else {
                Ok(true)
            }
        };

        assert!(filter.matches("{}").unwrap());
        assert!(matches!(
            filter.matches(""),
            Err(StorageError::Callback(_))
        ));
    }

    #[test]
    fn closure_transform_passes_through() {
        let transform = |doc: &str| -> Result<String, CallbackError> { Ok(doc.to_uppercase()) };
        assert_eq!(transform.transform("abc").unwrap(), "ABC");
    }

    #[test]
    fn match_all_accepts_garbage() {
        assert!(MatchAll.matches("not json").unwrap());
    }

    #[test]
    fn check_name_rejects_path_escapes() {
        assert!(check_name("users").is_ok());
        assert!(check_name("with space").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("a/b").is_err());
        assert!(check_name("a\\b").is_err());
    }
}
