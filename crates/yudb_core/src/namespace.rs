//! In-process mirror of the engine namespace.

use crate::collection::Collection;
use crate::database::Database;
use crate::error::CoreResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use yudb_storage::StorageEngine;

/// Cache of database and collection handles, keyed by name.
///
/// The engine is authoritative; the namespace only mirrors it. After a
/// [`Namespace::load`] or [`Namespace::reload`], and after every successful
/// create or remove issued through [`crate::Shell`], its names equal the
/// engine's. Changes made to the engine by any other path are not seen
/// until the next reload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    databases: BTreeMap<String, Database>,
}

impl Namespace {
    /// Creates an empty namespace without contacting the engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a namespace from the engine's current state.
    pub fn load(engine: &Arc<dyn StorageEngine>) -> CoreResult<Self> {
        let mut databases = BTreeMap::new();
        for name in engine.list_databases()? {
            let database = Database::open(engine, &name)?;
            databases.insert(name, database);
        }
        debug!(databases = databases.len(), "loaded namespace");
        Ok(Self { databases })
    }

    /// Replaces the whole namespace with the engine's current state.
    ///
    /// On failure the previous contents are kept.
    pub fn reload(&mut self, engine: &Arc<dyn StorageEngine>) -> CoreResult<()> {
        *self = Self::load(engine)?;
        Ok(())
    }

    /// Returns the named database.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.get(name)
    }

    /// Returns the named collection of the named database.
    #[must_use]
    pub fn collection(&self, database: &str, collection: &str) -> Option<&Collection> {
        self.database(database)?.collection(collection)
    }

    /// Returns the database names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    /// Returns every database handle.
    pub fn databases(&self) -> impl Iterator<Item = &Database> {
        self.databases.values()
    }

    /// Returns the number of databases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// Returns true if no database is mirrored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    pub(crate) fn insert(&mut self, database: Database) {
        self.databases.insert(database.name().to_string(), database);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Database> {
        self.databases.remove(name)
    }

    pub(crate) fn database_mut(&mut self, name: &str) -> Option<&mut Database> {
        self.databases.get_mut(name)
    }
}
