//! Test fixtures and shell helpers.
//!
//! Provides convenience functions for setting up test shells
//! and common test scenarios.

use crate::presenter::ScriptedPresenter;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use yudb_core::{
    DirectorySchemaLoader, FileBackup, FileCredentials, MapSchemaLoader, MemoryBackup,
    MemoryCredentials, Shell, ShellConfig,
};
use yudb_storage::{FileEngine, InMemoryEngine, StorageEngine};

/// Named schemas every test shell can resolve.
///
/// - `any`: accepts every object
/// - `person`: requires a string `name`
pub fn test_schemas() -> MapSchemaLoader {
    MapSchemaLoader::new().with("any", json!({})).with(
        "person",
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}}
        }),
    )
}

/// A test shell with automatic cleanup.
pub struct TestShell {
    /// The shell instance.
    pub shell: Shell,
    /// The presenter wired into the shell.
    pub presenter: ScriptedPresenter,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestShell {
    /// Creates a shell over an in-memory engine.
    pub fn memory() -> Self {
        Self::memory_with(ScriptedPresenter::new())
    }

    /// Creates an in-memory shell using `presenter`.
    pub fn memory_with(presenter: ScriptedPresenter) -> Self {
        let engine: Arc<dyn StorageEngine> = Arc::new(InMemoryEngine::new());
        let shell = Shell::builder(Arc::clone(&engine))
            .backup(MemoryBackup::new(engine))
            .credentials(MemoryCredentials::default())
            .presenter(presenter.clone())
            .schema_loader(test_schemas())
            .build()
            .expect("Failed to build in-memory shell");

        Self {
            shell,
            presenter,
            _temp_dir: None,
        }
    }

    /// Creates a shell over a file engine in a temporary directory.
    ///
    /// Every named schema of [`test_schemas`] is also written to the
    /// schema directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = ShellConfig::new(temp_dir.path());

        std::fs::create_dir_all(&config.schema_dir).expect("Failed to create schema dir");
        std::fs::write(config.schema_dir.join("any.json"), "{}")
            .expect("Failed to write schema");
        std::fs::write(
            config.schema_dir.join("person.json"),
            r#"{"type":"object","required":["name"],"properties":{"name":{"type":"string"}}}"#,
        )
        .expect("Failed to write schema");

        let presenter = ScriptedPresenter::new();
        let shell = open_file_shell(&config, presenter.clone());

        Self {
            shell,
            presenter,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the root directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Drops the shell and opens a new one over the same directory.
    ///
    /// # Panics
    ///
    /// Panics if the shell is in-memory.
    pub fn reopen(self) -> Self {
        let temp_dir = self._temp_dir.expect("Only file shells can be reopened");
        let presenter = self.presenter;
        drop(self.shell);

        let config = ShellConfig::new(temp_dir.path());
        let shell = open_file_shell(&config, presenter.clone());
        Self {
            shell,
            presenter,
            _temp_dir: Some(temp_dir),
        }
    }
}

fn open_file_shell(config: &ShellConfig, presenter: ScriptedPresenter) -> Shell {
    let engine: Arc<dyn StorageEngine> = Arc::new(
        FileEngine::open(&config.data_dir, true).expect("Failed to open file engine"),
    );
    Shell::builder(Arc::clone(&engine))
        .backup(FileBackup::new(engine, &config.backup_path))
        .credentials(
            FileCredentials::open(&config.credentials_path).expect("Failed to open credentials"),
        )
        .presenter(presenter)
        .schema_loader(DirectorySchemaLoader::new(&config.schema_dir))
        .build()
        .expect("Failed to build file shell")
}

impl std::ops::Deref for TestShell {
    type Target = Shell;

    fn deref(&self) -> &Self::Target {
        &self.shell
    }
}

impl std::ops::DerefMut for TestShell {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.shell
    }
}

/// Runs a test with a temporary in-memory shell.
///
/// # Example
///
/// ```rust,ignore
/// use yudb_testkit::with_temp_shell;
///
/// #[test]
/// fn my_test() {
///     with_temp_shell(|shell| {
///         shell.create(Some("app"), None, None).unwrap();
///     });
/// }
/// ```
pub fn with_temp_shell<F, R>(f: F) -> R
where
    F: FnOnce(&mut Shell) -> R,
{
    let mut test_shell = TestShell::memory();
    f(&mut test_shell.shell)
}

/// Runs a test with a temporary file-backed shell.
pub fn with_file_shell<F, R>(f: F) -> R
where
    F: FnOnce(&mut Shell, &Path) -> R,
{
    let mut test_shell = TestShell::file();
    let path = test_shell
        .path()
        .expect("File shell should have a path")
        .to_path_buf();
    f(&mut test_shell.shell, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates a shell with `app/items` holding `document_count` documents
    /// of the form `{"index": i}`.
    pub fn populated_shell(document_count: usize) -> TestShell {
        let mut test_shell = TestShell::memory();
        test_shell
            .create(Some("app"), None, None)
            .expect("Failed to create database");
        test_shell
            .create(Some("app"), Some("items"), Some(json!({}).into()))
            .expect("Failed to create collection");

        let documents: Vec<_> = (0..document_count).map(|i| json!({ "index": i })).collect();
        test_shell
            .collection("app", "items")
            .expect("Collection should be mirrored")
            .add(&documents)
            .expect("Failed to add documents");

        test_shell
    }

    /// Creates a shell with one database holding `collection_count`
    /// collections named `collection_<i>`.
    pub fn multi_collection_shell(collection_count: usize) -> TestShell {
        let mut test_shell = TestShell::memory();
        test_shell
            .create(Some("app"), None, None)
            .expect("Failed to create database");

        for i in 0..collection_count {
            let name = format!("collection_{i}");
            test_shell
                .create(Some("app"), Some(name.as_str()), Some("any".into()))
                .expect("Failed to create collection");
        }

        test_shell
    }
}
