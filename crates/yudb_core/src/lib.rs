//! # YuDB Core
//!
//! Database and collection facade for YuDB.
//!
//! This crate provides:
//! - Name validation for databases and collections
//! - Adapters turning Rust closures into engine callbacks
//! - `Collection` and `Database` handles over a [`yudb_storage::StorageEngine`]
//! - The `Namespace` mirror and the `Shell` lifecycle operations
//! - Backup, credential, presentation, and schema-loading collaborators
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use yudb_core::{all, Shell};
//! use yudb_storage::{InMemoryEngine, StorageEngine};
//!
//! let engine: Arc<dyn StorageEngine> = Arc::new(InMemoryEngine::new());
//! let mut shell = Shell::builder(engine).build().unwrap();
//!
//! shell.create(Some("app"), None, None).unwrap();
//! shell.create(Some("app"), Some("users"), Some(json!({}).into())).unwrap();
//!
//! let users = shell.collection("app", "users").unwrap();
//! users.add(&[json!({"name": "Ada"})]).unwrap();
//! assert_eq!(users.read(all).unwrap().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod backup;
mod collection;
mod config;
mod database;
mod error;
mod filter;
mod name;
mod namespace;
mod outcome;
mod schema;
mod security;
mod shell;
mod view;

/// A JSON document.
pub type Document = serde_json::Value;

/// Version of the YuDB crates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use adapter::{to_engine_predicate, to_engine_updater, EnginePredicate, EngineUpdater};
pub use backup::{
    BackupManager, BackupMetadata, BackupRecord, BackupResult, BackupService, FileBackup,
    MemoryBackup, RestoreStats,
};
pub use collection::Collection;
pub use config::ShellConfig;
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use filter::{all, id};
pub use name::validate_name;
pub use namespace::Namespace;
pub use outcome::{
    Added, Created, Deleted, Outcome, Removed, Report, Updated, CREATE_NEEDS_DATABASE,
    REMOVE_NEEDS_DATABASE, SCHEMA_REQUIRED,
};
pub use schema::{DirectorySchemaLoader, MapSchemaLoader, SchemaLoader, SchemaSource};
pub use security::{
    CredentialStore, FileCredentials, MemoryCredentials, DEFAULT_PASSWORD, DEFAULT_USERNAME,
};
pub use shell::{Shell, ShellBuilder};
pub use view::{Presenter, TerminalPresenter};
pub use yudb_storage::ID_FIELD;
