//! # YuDB Storage
//!
//! Storage engine trait and reference engines for YuDB.
//!
//! This crate provides the authoritative document store that the YuDB
//! facade delegates to. Engines own the namespace of databases and
//! collections, schema enforcement, identity assignment, and persistence.
//! They see documents only as JSON text and evaluate caller logic through
//! one-method callback traits.
//!
//! ## Design Principles
//!
//! - Documents cross the engine boundary as encoded JSON text
//! - Filters and transforms are narrow callbacks invoked per document
//! - Must be `Send + Sync` so facades can share one engine
//! - The engine is the source of truth; facades only mirror its namespace
//!
//! ## Available Engines
//!
//! - [`InMemoryEngine`] - For testing and ephemeral storage
//! - [`FileEngine`] - Directory-backed persistent storage
//!
//! ## Example
//!
//! ```rust
//! use yudb_storage::{InMemoryEngine, MatchAll, StorageEngine};
//!
//! let engine = InMemoryEngine::new();
//! engine.create_database("app").unwrap();
//! engine.create_collection("app", "users", "{}").unwrap();
//! engine.write_document("app", "users", r#"{"name":"Ada"}"#).unwrap();
//! let docs = engine.read_documents("app", "users", &MatchAll).unwrap();
//! assert!(docs[0].contains("$id"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod engine;
mod error;
mod file;
mod memory;
mod schema;

pub use collection::ID_FIELD;
pub use engine::{DocumentFilter, DocumentTransform, MatchAll, StorageEngine};
pub use error::{CallbackError, StorageError, StorageResult};
pub use file::FileEngine;
pub use memory::InMemoryEngine;
pub use schema::Schema;
