//! Built-in predicates.
//!
//! These are plain functions usable anywhere a predicate is expected:
//!
//! ```rust,ignore
//! users.read(all)?;
//! users.delete(id("7f3c"))?;
//! ```

use crate::Document;
use yudb_storage::ID_FIELD;

/// Matches every document.
#[must_use]
pub fn all(_document: &Document) -> bool {
    true
}

/// Matches documents whose `$id` equals `target`.
pub fn id(target: impl Into<Document>) -> impl Fn(&Document) -> bool {
    let target = target.into();
    move |document| document.get(ID_FIELD) == Some(&target)
}
