//! Database facade.

use crate::collection::Collection;
use crate::error::CoreResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use yudb_storage::StorageEngine;

/// A handle on one database and its collections.
///
/// Opening a `Database` enumerates the engine's collections for that name
/// and builds a [`Collection`] handle for each. The result is a snapshot:
/// collections created or deleted by another path afterwards are not seen
/// until the database is opened again.
///
/// # Example
///
/// ```rust,ignore
/// let shop = Database::open(&engine, "shop")?;
/// if let Some(items) = shop.collection("items") {
///     items.add(&[json!({"sku": "a1"})])?;
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    name: String,
    collections: BTreeMap<String, Collection>,
}

impl Database {
    /// Opens `name`, materializing one handle per existing collection.
    ///
    /// # Errors
    ///
    /// Returns the engine's error if the collections cannot be listed,
    /// e.g. because the database does not exist.
    pub fn open(engine: &Arc<dyn StorageEngine>, name: &str) -> CoreResult<Self> {
        let collections = engine
            .list_collections(name)?
            .into_iter()
            .map(|collection| {
                let handle = Collection::new(Arc::clone(engine), name, &collection);
                (collection, handle)
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            collections,
        })
    }

    /// Returns the database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the named collection, if it was present when opened.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Returns the collection names in lexicographic order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Returns every collection handle.
    pub fn collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections.values()
    }

    /// Returns the number of collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns true if the database has no collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    pub(crate) fn insert_collection(&mut self, collection: Collection) {
        self.collections
            .insert(collection.name().to_string(), collection);
    }

    pub(crate) fn remove_collection(&mut self, name: &str) -> Option<Collection> {
        self.collections.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yudb_storage::InMemoryEngine;

    fn engine() -> Arc<dyn StorageEngine> {
        let engine = InMemoryEngine::new();
        engine.create_database("shop").unwrap();
        engine.create_collection("shop", "orders", "{}").unwrap();
        engine.create_collection("shop", "items", "{}").unwrap();
        Arc::new(engine)
    }

    #[test]
    fn open_materializes_collections() {
        let engine = engine();
        let db = Database::open(&engine, "shop").unwrap();

        assert_eq!(db.name(), "shop");
        assert_eq!(db.len(), 2);
        assert_eq!(db.collection_names().collect::<Vec<_>>(), vec!["items", "orders"]);
        let items = db.collection("items").unwrap();
        assert_eq!(items.database(), "shop");
        assert!(db.collection("missing").is_none());
    }

    #[test]
    fn open_missing_database_fails() {
        let engine = engine();
        assert!(Database::open(&engine, "nope").is_err());
    }

    #[test]
    fn open_is_a_snapshot() {
        let engine = engine();
        let db = Database::open(&engine, "shop").unwrap();
        engine.create_collection("shop", "later", "{}").unwrap();

        assert!(db.collection("later").is_none());
        let reopened = Database::open(&engine, "shop").unwrap();
        assert!(reopened.collection("later").is_some());
    }

    #[test]
    fn empty_database() {
        let engine: Arc<dyn StorageEngine> = Arc::new(InMemoryEngine::new());
        engine.create_database("blank").unwrap();
        let db = Database::open(&engine, "blank").unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn insert_and_remove_collection_handles() {
        let engine = engine();
        let mut db = Database::open(&engine, "shop").unwrap();
        db.insert_collection(Collection::new(Arc::clone(&engine), "shop", "extra"));
        assert!(db.collection("extra").is_some());
        assert!(db.remove_collection("extra").is_some());
        assert!(db.remove_collection("extra").is_none());
    }
}
