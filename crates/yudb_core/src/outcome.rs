//! Result values returned by the user-facing surface.
//!
//! Operations distinguish structured success from a human-readable refusal
//! without raising errors for expected failures. Both shapes serialize to
//! the plain JSON a shell prints: `{"created":"db"}` or `"'1x' is not a
//! valid name for a database"`.

use serde::Serialize;

/// Message returned when `create` is called without a database name.
pub const CREATE_NEEDS_DATABASE: &str =
    "The function 'create' accepts at least one argument (the database name)";

/// Message returned when `remove` is called without a database name.
pub const REMOVE_NEEDS_DATABASE: &str =
    "The function 'remove' accepts at least one argument (the database name)";

/// Message returned when a collection is created without a schema.
pub const SCHEMA_REQUIRED: &str = "A schema must be provided when creating a new collection";

/// Either a success payload or a descriptive message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    /// The operation ran; carries its payload.
    Done(T),
    /// The operation was refused before reaching any subsystem.
    Message(String),
}

impl<T> Outcome<T> {
    /// Creates a refusal.
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    /// Returns the payload, if the operation ran.
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(payload) => Some(payload),
            Self::Message(_) => None,
        }
    }

    /// Returns the refusal text, if any.
    #[must_use]
    pub fn as_message(&self) -> Option<&str> {
        match self {
            Self::Done(_) => None,
            Self::Message(text) => Some(text),
        }
    }

    /// Returns true if the operation ran.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// Refusal for a name that fails [`crate::validate_name`] as a database.
pub(crate) fn invalid_database_name(name: &str) -> String {
    format!("'{name}' is not a valid name for a database")
}

/// Refusal for a name that fails [`crate::validate_name`] as a collection.
pub(crate) fn invalid_collection_name(name: &str) -> String {
    format!("'{name}' is not a valid name for a collection")
}

/// A database or collection was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Created {
    /// `db` or `db/collection`.
    pub created: String,
}

/// A database or collection was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removed {
    /// `db` or `db/collection`.
    pub deleted: String,
}

/// Documents were submitted to a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Added {
    /// Number of documents submitted.
    pub added: usize,
}

/// Documents were deleted from a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    /// Number reported by the engine.
    pub deleted: usize,
}

/// Documents were replaced in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Updated {
    /// Number reported by the engine.
    pub updated: usize,
}

/// Human-readable report from the credential commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The report text.
    pub result: String,
}

impl Report {
    pub(crate) fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_like_a_shell_value() {
        let done: Outcome<Created> = Outcome::Done(Created {
            created: "db/c".into(),
        });
        assert_eq!(serde_json::to_string(&done).unwrap(), r#"{"created":"db/c"}"#);

        let refused: Outcome<Created> = Outcome::message(SCHEMA_REQUIRED);
        assert_eq!(
            serde_json::to_string(&refused).unwrap(),
            format!("\"{SCHEMA_REQUIRED}\"")
        );
    }

    #[test]
    fn accessors() {
        let done = Outcome::Done(Added { added: 2 });
        assert!(done.is_done());
        assert_eq!(done.as_message(), None);
        assert_eq!(done.done(), Some(Added { added: 2 }));

        let refused: Outcome<Added> = Outcome::message("no");
        assert_eq!(refused.as_message(), Some("no"));
        assert_eq!(refused.done(), None);
    }

    #[test]
    fn name_messages() {
        assert_eq!(
            invalid_database_name("1x"),
            "'1x' is not a valid name for a database"
        );
        assert_eq!(
            invalid_collection_name("a-b"),
            "'a-b' is not a valid name for a collection"
        );
    }
}
