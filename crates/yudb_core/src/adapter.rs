//! Bridges native predicates and updaters to the engine callback traits.
//!
//! Engines evaluate callbacks on encoded documents. The adapters here decode
//! each document, run the caller's logic on the structured value, and (for
//! updaters) encode the result again. A document that fails to decode makes
//! the callback return an error, which aborts the engine operation.

use crate::Document;
use yudb_storage::{DocumentFilter, DocumentTransform, StorageError, StorageResult};

/// A native predicate wrapped for engine-side evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EnginePredicate<P> {
    predicate: P,
}

/// A native updater wrapped for engine-side evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EngineUpdater<U> {
    updater: U,
}

/// Wraps `predicate` so an engine can call it on encoded documents.
pub fn to_engine_predicate<P>(predicate: P) -> EnginePredicate<P>
where
    P: Fn(&Document) -> bool,
{
    EnginePredicate { predicate }
}

/// Wraps `updater` so an engine can call it on encoded documents.
///
/// The replacement is not required to keep the `$id` of its input.
pub fn to_engine_updater<U>(updater: U) -> EngineUpdater<U>
where
    U: Fn(Document) -> Document,
{
    EngineUpdater { updater }
}

impl<P> DocumentFilter for EnginePredicate<P>
where
    P: Fn(&Document) -> bool,
{
    fn matches(&self, document: &str) -> StorageResult<bool> {
        let decoded: Document = serde_json::from_str(document).map_err(StorageError::callback)?;
        Ok((self.predicate)(&decoded))
    }
}

impl<U> DocumentTransform for EngineUpdater<U>
where
    U: Fn(Document) -> Document,
{
    fn transform(&self, document: &str) -> StorageResult<String> {
        let decoded: Document = serde_json::from_str(document).map_err(StorageError::callback)?;
        serde_json::to_string(&(self.updater)(decoded)).map_err(StorageError::callback)
    }
}
