//! Cross-crate integration test helpers.
//!
//! Provides a harness that drives a shell and checks its namespace mirror
//! against the storage engine after every step.

use crate::fixtures::TestShell;
use crate::generators::NamespaceOperation;
use serde_json::json;
use yudb_core::{validate_name, CoreResult, Namespace, Outcome};

/// A test harness for namespace integration testing.
pub struct ShellHarness {
    /// The shell under test.
    pub shell: TestShell,
    applied: usize,
    refused: usize,
    failed: usize,
}

impl ShellHarness {
    /// Creates a harness over an in-memory shell.
    pub fn new() -> Self {
        Self {
            shell: TestShell::memory(),
            applied: 0,
            refused: 0,
            failed: 0,
        }
    }

    /// Applies one operation, then verifies the mirror.
    ///
    /// Refusals and engine errors are counted rather than propagated; the
    /// mirror must match the engine either way.
    pub fn apply(&mut self, operation: &NamespaceOperation) {
        let result: CoreResult<bool> = match operation {
            NamespaceOperation::CreateDatabase { database } => self
                .shell
                .create(Some(database.as_str()), None, None)
                .map(|outcome| outcome.is_done()),
            NamespaceOperation::CreateCollection {
                database,
                collection,
            } => self
                .shell
                .create(
                    Some(database.as_str()),
                    Some(collection.as_str()),
                    Some(json!({}).into()),
                )
                .map(|outcome| outcome.is_done()),
            NamespaceOperation::RemoveDatabase { database } => self
                .shell
                .remove(Some(database.as_str()), None)
                .map(|outcome| outcome.is_done()),
            NamespaceOperation::RemoveCollection {
                database,
                collection,
            } => self
                .shell
                .remove(Some(database.as_str()), Some(collection.as_str()))
                .map(|outcome| outcome.is_done()),
        };

        match result {
            Ok(true) => self.applied += 1,
            Ok(false) => self.refused += 1,
            Err(_) => self.failed += 1,
        }
        self.verify_mirror();
    }

    /// Asserts that the mirror equals a fresh load of the engine.
    pub fn verify_mirror(&self) {
        let fresh = Namespace::load(self.shell.engine()).expect("Failed to load namespace");
        assert_eq!(
            self.shell.namespace(),
            &fresh,
            "Mirror diverged from engine"
        );
    }

    /// Asserts that every name in the engine is a valid name.
    pub fn verify_names(&self) {
        for database in self.shell.namespace().databases() {
            assert!(validate_name(database.name()), "{}", database.name());
            for collection in database.collection_names() {
                assert!(validate_name(collection), "{collection}");
            }
        }
    }

    /// Returns (applied, refused, failed) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.applied, self.refused, self.failed)
    }
}

impl Default for ShellHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the refusal text of an outcome, panicking on success.
pub fn expect_message<T: std::fmt::Debug>(outcome: Outcome<T>) -> String {
    match outcome {
        Outcome::Message(text) => text,
        Outcome::Done(payload) => panic!("expected a message, got {payload:?}"),
    }
}
