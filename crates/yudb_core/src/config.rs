//! Shell configuration.

use std::path::{Path, PathBuf};

/// Configuration for opening a file-backed shell.
///
/// Every path defaults to a fixed location under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Root of the storage engine's directory tree.
    pub data_dir: PathBuf,

    /// File holding the last backup.
    pub backup_path: PathBuf,

    /// Directory that named schemas are loaded from.
    pub schema_dir: PathBuf,

    /// File holding the shell credentials.
    pub credentials_path: PathBuf,

    /// Whether to create the data directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl ShellConfig {
    /// Creates a configuration with every path under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            data_dir: root.join("databases"),
            backup_path: root.join("backup.yudb"),
            schema_dir: root.join("schemas"),
            credentials_path: root.join("credentials.json"),
            create_if_missing: true,
        }
    }

    /// Sets the storage engine directory.
    #[must_use]
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the backup file.
    #[must_use]
    pub fn backup_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_path = path.into();
        self
    }

    /// Sets the named-schema directory.
    #[must_use]
    pub fn schema_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_dir = path.into();
        self
    }

    /// Sets the credentials file.
    #[must_use]
    pub fn credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }

    /// Sets whether to create the data directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }
}
