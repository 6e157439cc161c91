//! Collection facade.

use crate::adapter::{to_engine_predicate, to_engine_updater};
use crate::error::{CoreError, CoreResult};
use crate::outcome::{Added, Deleted, Updated};
use crate::Document;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use yudb_storage::StorageEngine;

/// A handle on one collection.
///
/// `Collection` caches nothing: every call is a blocking round trip to the
/// storage engine, and engine failures propagate unmodified. Queries are
/// expressed with host-language closures rather than a query language:
///
/// ```rust,ignore
/// use yudb_core::{all, id};
///
/// let adults = people.read(|p| p["age"].as_i64() >= Some(18))?;
/// people.update(id("7f3c"), |mut p| { p["age"] = 31.into(); p })?;
/// people.delete(all)?;
/// ```
#[derive(Clone)]
pub struct Collection {
    engine: Arc<dyn StorageEngine>,
    database: String,
    name: String,
}

impl Collection {
    /// Creates a handle on `database/name`.
    ///
    /// This does not contact the engine.
    pub fn new(engine: Arc<dyn StorageEngine>, database: &str, name: &str) -> Self {
        Self {
            engine,
            database: database.to_string(),
            name: name.to_string(),
        }
    }

    /// Returns the owning database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Writes each document individually.
    ///
    /// The reported count is the number of documents submitted. A failing
    /// write stops the call; earlier writes stay in the engine.
    pub fn add(&self, documents: &[Document]) -> CoreResult<Added> {
        for document in documents {
            let encoded = serde_json::to_string(document)?;
            self.engine
                .write_document(&self.database, &self.name, &encoded)?;
        }
        debug!(
            database = %self.database,
            collection = %self.name,
            count = documents.len(),
            "added documents"
        );
        Ok(Added {
            added: documents.len(),
        })
    }

    /// Returns every document `predicate` accepts, in engine order.
    pub fn read<P>(&self, predicate: P) -> CoreResult<Vec<Document>>
    where
        P: Fn(&Document) -> bool,
    {
        let filter = to_engine_predicate(predicate);
        self.engine
            .read_documents(&self.database, &self.name, &filter)?
            .iter()
            .map(|text| serde_json::from_str(text).map_err(CoreError::from))
            .collect()
    }

    /// Deletes every document `predicate` accepts.
    pub fn delete<P>(&self, predicate: P) -> CoreResult<Deleted>
    where
        P: Fn(&Document) -> bool,
    {
        let filter = to_engine_predicate(predicate);
        let deleted = self
            .engine
            .delete_documents(&self.database, &self.name, &filter)?;
        debug!(database = %self.database, collection = %self.name, deleted, "deleted documents");
        Ok(Deleted { deleted })
    }

    /// Replaces every document `predicate` accepts with `updater`'s result.
    ///
    /// Atomicity is whatever the engine provides for a single replace call.
    pub fn update<P, U>(&self, predicate: P, updater: U) -> CoreResult<Updated>
    where
        P: Fn(&Document) -> bool,
        U: Fn(Document) -> Document,
    {
        let filter = to_engine_predicate(predicate);
        let transform = to_engine_updater(updater);
        let updated =
            self.engine
                .replace_documents(&self.database, &self.name, &filter, &transform)?;
        debug!(database = %self.database, collection = %self.name, updated, "updated documents");
        Ok(Updated { updated })
    }
}

impl PartialEq for Collection {
    fn eq(&self, other: &Self) -> bool {
        self.database == other.database && self.name == other.name
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("database", &self.database)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{all, id};
    use serde_json::json;
    use yudb_storage::{InMemoryEngine, StorageError};

    fn people() -> Collection {
        let engine = Arc::new(InMemoryEngine::new());
        engine.create_database("db").unwrap();
        engine.create_collection("db", "people", "{}").unwrap();
        Collection::new(engine, "db", "people")
    }

    #[test]
    fn metadata() {
        let c = people();
        assert_eq!(c.database(), "db");
        assert_eq!(c.name(), "people");
    }

    #[test]
    fn add_then_read_all() {
        let c = people();
        let added = c
            .add(&[json!({"name": "Ada"}), json!({"name": "Alan"})])
            .unwrap();
        assert_eq!(added, Added { added: 2 });

        let docs = c.read(all).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d["name"].clone()).collect();
        assert_eq!(names, vec![json!("Ada"), json!("Alan")]);
        assert!(docs.iter().all(|d| d["$id"].is_string()));
    }

    #[test]
    fn add_nothing() {
        let c = people();
        assert_eq!(c.add(&[]).unwrap(), Added { added: 0 });
    }

    #[test]
    fn read_by_id() {
        let c = people();
        c.add(&[json!({"$id": "a"}), json!({"$id": "b"}), json!({"$id": "c"})])
            .unwrap();
        let docs = c.read(id("b")).unwrap();
        assert_eq!(docs, vec![json!({"$id": "b"})]);
    }

    #[test]
    fn update_reports_count() {
        let c = people();
        c.add(&[json!({"n": 1}), json!({"n": 2}), json!({"n": 3})])
            .unwrap();

        let updated = c
            .update(
                |d| d["n"].as_i64() >= Some(2),
                |mut d| {
                    d["big"] = json!(true);
                    d
                },
            )
            .unwrap();
        assert_eq!(updated, Updated { updated: 2 });
        assert_eq!(c.read(|d| d["big"] == json!(true)).unwrap().len(), 2);
    }

    #[test]
    fn delete_reports_count() {
        let c = people();
        c.add(&[json!({"n": 1}), json!({"n": 2})]).unwrap();
        assert_eq!(c.delete(|d| d["n"] == json!(1)).unwrap(), Deleted { deleted: 1 });
        assert_eq!(c.read(all).unwrap().len(), 1);
    }

    #[test]
    fn engine_errors_propagate() {
        let engine = Arc::new(InMemoryEngine::new());
        let c = Collection::new(engine, "missing", "c");
        assert!(matches!(
            c.read(all),
            Err(CoreError::Storage(StorageError::DatabaseNotFound { .. }))
        ));
        assert!(c.add(&[json!({})]).is_err());
    }

    #[test]
    fn equality_ignores_engine() {
        let a = Collection::new(Arc::new(InMemoryEngine::new()), "db", "c");
        let b = Collection::new(Arc::new(InMemoryEngine::new()), "db", "c");
        assert_eq!(a, b);
    }
}
