//! In-memory storage engine for testing.

use crate::collection::{Plan, StoredCollection};
use crate::engine::{check_name, DocumentFilter, DocumentTransform, StorageEngine};
use crate::error::{StorageError, StorageResult};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::BTreeMap;
use tracing::debug;

type Databases = BTreeMap<String, BTreeMap<String, StoredCollection>>;

/// An in-memory storage engine.
///
/// This engine keeps every database in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral shells that don't need persistence
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads. Each
/// operation holds the namespace lock for its whole duration, so document
/// operations are atomic with respect to each other. Deletes and
/// replacements run their callbacks under an upgradable read lock, so a
/// callback may read from the engine but must not write to it.
///
/// # Example
///
/// ```rust
/// use yudb_storage::{InMemoryEngine, MatchAll, StorageEngine};
///
/// let engine = InMemoryEngine::new();
/// engine.create_database("shop").unwrap();
/// engine.create_collection("shop", "items", "{}").unwrap();
/// engine.write_document("shop", "items", r#"{"sku":"a1"}"#).unwrap();
/// assert_eq!(engine.read_documents("shop", "items", &MatchAll).unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    databases: RwLock<Databases>,
}

impl InMemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored documents.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.databases
            .read_recursive()
            .values()
            .flat_map(|collections| collections.values())
            .map(|c| c.documents().count())
            .sum()
    }

    /// Removes every database.
    pub fn clear(&self) {
        self.databases.write().clear();
    }

    fn with_collection<R>(
        &self,
        database: &str,
        collection: &str,
        f: impl FnOnce(&StoredCollection) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let databases = self.databases.read_recursive();
        f(lookup(&databases, database, collection)?)
    }

    fn with_collection_mut<R>(
        &self,
        database: &str,
        collection: &str,
        f: impl FnOnce(&mut StoredCollection) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut databases = self.databases.write();
        f(lookup_mut(&mut databases, database, collection)?)
    }

    /// Computes a plan while readers may still enter, then applies it under
    /// the write lock.
    fn with_plan(
        &self,
        database: &str,
        collection: &str,
        plan: impl FnOnce(&StoredCollection) -> StorageResult<Plan>,
    ) -> StorageResult<usize> {
        let databases = self.databases.upgradable_read();
        let planned = plan(lookup(&databases, database, collection)?)?;
        let mut databases = RwLockUpgradableReadGuard::upgrade(databases);
        Ok(lookup_mut(&mut databases, database, collection)?.apply(planned))
    }
}

fn lookup<'a>(
    databases: &'a Databases,
    database: &str,
    collection: &str,
) -> StorageResult<&'a StoredCollection> {
    databases
        .get(database)
        .ok_or_else(|| StorageError::database_not_found(database))?
        .get(collection)
        .ok_or_else(|| StorageError::collection_not_found(database, collection))
}

fn lookup_mut<'a>(
    databases: &'a mut Databases,
    database: &str,
    collection: &str,
) -> StorageResult<&'a mut StoredCollection> {
    databases
        .get_mut(database)
        .ok_or_else(|| StorageError::database_not_found(database))?
        .get_mut(collection)
        .ok_or_else(|| StorageError::collection_not_found(database, collection))
}

impl StorageEngine for InMemoryEngine {
    fn list_databases(&self) -> StorageResult<Vec<String>> {
        Ok(self.databases.read_recursive().keys().cloned().collect())
    }

    fn list_collections(&self, database: &str) -> StorageResult<Vec<String>> {
        self.databases
            .read_recursive()
            .get(database)
            .map(|collections| collections.keys().cloned().collect())
            .ok_or_else(|| StorageError::database_not_found(database))
    }

    fn create_database(&self, database: &str) -> StorageResult<()> {
        check_name(database)?;
        let mut databases = self.databases.write();
        if databases.contains_key(database) {
            return Err(StorageError::DatabaseExists {
                database: database.to_string(),
            });
        }
        databases.insert(database.to_string(), BTreeMap::new());
        debug!(database, "created database");
        Ok(())
    }

    fn delete_database(&self, database: &str) -> StorageResult<()> {
        if self.databases.write().remove(database).is_none() {
            return Err(StorageError::database_not_found(database));
        }
        debug!(database, "deleted database");
        Ok(())
    }

    fn create_collection(
        &self,
        database: &str,
        collection: &str,
        schema: &str,
    ) -> StorageResult<()> {
        check_name(collection)?;
        let mut databases = self.databases.write();
        let collections = databases
            .get_mut(database)
            .ok_or_else(|| StorageError::database_not_found(database))?;
        if collections.contains_key(collection) {
            return Err(StorageError::CollectionExists {
                database: database.to_string(),
                collection: collection.to_string(),
            });
        }
        let stored = StoredCollection::new(database, collection, schema)?;
        collections.insert(collection.to_string(), stored);
        debug!(database, collection, "created collection");
        Ok(())
    }

    fn delete_collection(&self, database: &str, collection: &str) -> StorageResult<()> {
        let mut databases = self.databases.write();
        let collections = databases
            .get_mut(database)
            .ok_or_else(|| StorageError::database_not_found(database))?;
        if collections.remove(collection).is_none() {
            return Err(StorageError::collection_not_found(database, collection));
        }
        debug!(database, collection, "deleted collection");
        Ok(())
    }

    fn read_schema(&self, database: &str, collection: &str) -> StorageResult<String> {
        self.with_collection(database, collection, |c| Ok(c.schema_text().to_string()))
    }

    fn write_document(
        &self,
        database: &str,
        collection: &str,
        document: &str,
    ) -> StorageResult<()> {
        self.with_collection_mut(database, collection, |c| c.insert(document).map(|_| ()))
    }

    fn read_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
    ) -> StorageResult<Vec<String>> {
        self.with_collection(database, collection, |c| c.select(filter))
    }

    fn delete_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
    ) -> StorageResult<usize> {
        self.with_plan(database, collection, |c| c.plan_removal(filter))
    }

    fn replace_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
        transform: &dyn DocumentTransform,
    ) -> StorageResult<usize> {
        self.with_plan(database, collection, |c| {
            c.plan_replacement(filter, transform)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MatchAll;
    use crate::error::CallbackError;
    use serde_json::Value;

    fn engine_with_collection() -> InMemoryEngine {
        let engine = InMemoryEngine::new();
        engine.create_database("db").unwrap();
        engine.create_collection("db", "c", "{}").unwrap();
        engine
    }

    #[test]
    fn memory_new_is_empty() {
        let engine = InMemoryEngine::new();
        assert!(engine.list_databases().unwrap().is_empty());
        assert_eq!(engine.document_count(), 0);
    }

    #[test]
    fn memory_lists_sorted() {
        let engine = InMemoryEngine::new();
        for name in ["zeta", "alpha", "mid"] {
            engine.create_database(name).unwrap();
        }
        assert_eq!(engine.list_databases().unwrap(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn memory_duplicate_database_fails() {
        let engine = InMemoryEngine::new();
        engine.create_database("db").unwrap();
        assert!(matches!(
            engine.create_database("db"),
            Err(StorageError::DatabaseExists { .. })
        ));
    }

    #[test]
    fn memory_collection_requires_database() {
        let engine = InMemoryEngine::new();
        assert!(matches!(
            engine.create_collection("missing", "c", "{}"),
            Err(StorageError::DatabaseNotFound { .. })
        ));
    }

    #[test]
    fn memory_invalid_schema_rejected() {
        let engine = InMemoryEngine::new();
        engine.create_database("db").unwrap();
        assert!(matches!(
            engine.create_collection("db", "c", "{"),
            Err(StorageError::InvalidSchema(_))
        ));
        assert!(engine.list_collections("db").unwrap().is_empty());
    }

    #[test]
    fn memory_delete_database_removes_collections() {
        let engine = engine_with_collection();
        engine.write_document("db", "c", "{}").unwrap();
        engine.delete_database("db").unwrap();
        assert!(engine.list_databases().unwrap().is_empty());
        assert_eq!(engine.document_count(), 0);
        assert!(engine.delete_database("db").is_err());
    }

    #[test]
    fn memory_delete_collection() {
        let engine = engine_with_collection();
        engine.delete_collection("db", "c").unwrap();
        assert!(engine.list_collections("db").unwrap().is_empty());
        assert!(matches!(
            engine.delete_collection("db", "c"),
            Err(StorageError::CollectionNotFound { .. })
        ));
    }

    #[test]
    fn memory_read_schema() {
        let engine = InMemoryEngine::new();
        engine.create_database("db").unwrap();
        engine
            .create_collection("db", "c", r#"{"type":"object"}"#)
            .unwrap();
        assert_eq!(engine.read_schema("db", "c").unwrap(), r#"{"type":"object"}"#);
    }

    #[test]
    fn memory_write_read_delete() {
        let engine = engine_with_collection();
        engine.write_document("db", "c", r#"{"$id":"1"}"#).unwrap();
        engine.write_document("db", "c", r#"{"$id":"2"}"#).unwrap();

        assert_eq!(engine.read_documents("db", "c", &MatchAll).unwrap().len(), 2);
        assert_eq!(engine.delete_documents("db", "c", &MatchAll).unwrap(), 2);
        assert!(engine.read_documents("db", "c", &MatchAll).unwrap().is_empty());
    }

    #[test]
    fn memory_clear() {
        let engine = engine_with_collection();
        engine.clear();
        assert!(engine.list_databases().unwrap().is_empty());
    }

    #[test]
    fn memory_callbacks_may_read_the_engine() {
        let engine = engine_with_collection();
        engine.create_collection("db", "banned", "{}").unwrap();
        engine
            .write_document("db", "banned", r#"{"$id":"b","name":"x"}"#)
            .unwrap();
        engine.write_document("db", "c", r#"{"$id":"1","name":"x"}"#).unwrap();
        engine.write_document("db", "c", r#"{"$id":"2","name":"y"}"#).unwrap();

        let is_banned = |doc: &str| -> Result<bool, CallbackError> {
            let name = serde_json::from_str::<Value>(doc)?["name"].clone();
            let banned = engine.read_documents("db", "banned", &MatchAll)?;
            Ok(banned
                .iter()
                .any(|b| serde_json::from_str::<Value>(b).is_ok_and(|v| v["name"] == name)))
        };
        let mark = |doc: &str| -> Result<String, CallbackError> {
            let schema = engine.read_schema("db", "banned")?;
            Ok(doc.replace("\"name\"", &format!("\"schema\":{schema:?},\"name\"")))
        };

        assert_eq!(engine.replace_documents("db", "c", &is_banned, &mark).unwrap(), 1);
        assert_eq!(engine.delete_documents("db", "c", &is_banned).unwrap(), 1);

        let left = engine.read_documents("db", "c", &MatchAll).unwrap();
        assert_eq!(left, vec![r#"{"$id":"2","name":"y"}"#]);
    }
}
