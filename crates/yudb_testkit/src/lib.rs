//! # YuDB Testkit
//!
//! Test utilities for YuDB.
//!
//! This crate provides:
//! - Shell fixtures over in-memory and file-backed engines
//! - A scripted presenter for the interactive commands
//! - Property-based test generators using proptest
//! - A harness checking the namespace mirror against the engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use yudb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_shell() {
//!     with_temp_shell(|shell| {
//!         shell.create(Some("app"), None, None).unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod presenter;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::presenter::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use presenter::*;
