//! Directory-backed storage engine for persistent storage.
//!
//! The engine maps the namespace directly onto the file system:
//!
//! ```text
//! <root>/
//! ├─ .lock                     # Advisory lock for single-process access
//! └─ <database>/
//!    └─ <collection>/
//!       ├─ schema.json         # Encoded collection schema
//!       └─ documents.jsonl     # One encoded document per line
//! ```
//!
//! Appends go straight to `documents.jsonl`; deletes and replacements write
//! a temporary file and rename it over the original.

use crate::collection::StoredCollection;
use crate::engine::{check_name, DocumentFilter, DocumentTransform, StorageEngine};
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Starts with a dot so it can never collide with a valid database name.
const LOCK_FILE: &str = ".lock";
const SCHEMA_FILE: &str = "schema.json";
const DOCUMENTS_FILE: &str = "documents.jsonl";
const DOCUMENTS_TEMP: &str = "documents.jsonl.tmp";

/// A directory-backed storage engine.
///
/// Data survives process restarts. Every operation reads the affected
/// collection from disk, so external edits to the directory are visible
/// on the next call.
///
/// # Thread Safety
///
/// This engine is thread-safe and can be shared across threads. An internal
/// lock serializes mutations and the `.lock` file keeps other processes out.
/// Delete and replace callbacks may read from the engine but must not write
/// to it.
///
/// # Example
///
/// ```no_run
/// use yudb_storage::{FileEngine, StorageEngine};
/// use std::path::Path;
///
/// let engine = FileEngine::open(Path::new("data"), true).unwrap();
/// engine.create_database("shop").unwrap();
/// ```
#[derive(Debug)]
pub struct FileEngine {
    root: PathBuf,
    guard: RwLock<()>,
    _lock_file: File,
}

impl FileEngine {
    /// Opens an engine rooted at `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - Directory holding every database
    /// * `create_if_missing` - If true, creates the directory if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `Locked`)
    /// - I/O errors occur
    pub fn open(root: &Path, create_if_missing: bool) -> StorageResult<Self> {
        if !root.exists() {
            if create_if_missing {
                fs::create_dir_all(root)?;
            } else {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("engine directory does not exist: {}", root.display()),
                )));
            }
        }

        if !root.is_dir() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path is not a directory: {}", root.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(root.join(LOCK_FILE))?;

        // Try to acquire exclusive lock (non-blocking)
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked);
        }

        Ok(Self {
            root: root.to_path_buf(),
            guard: RwLock::new(()),
            _lock_file: lock_file,
        })
    }

    /// Returns the engine's root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn database_dir(&self, database: &str) -> StorageResult<PathBuf> {
        check_name(database)?;
        let dir = self.root.join(database);
        if !dir.is_dir() {
            return Err(StorageError::database_not_found(database));
        }
        Ok(dir)
    }

    fn collection_dir(&self, database: &str, collection: &str) -> StorageResult<PathBuf> {
        check_name(collection)?;
        let dir = self.database_dir(database)?.join(collection);
        if !dir.is_dir() {
            return Err(StorageError::collection_not_found(database, collection));
        }
        Ok(dir)
    }

    fn load(
        &self,
        database: &str,
        collection: &str,
    ) -> StorageResult<(PathBuf, StoredCollection)> {
        let dir = self.collection_dir(database, collection)?;
        let schema = fs::read_to_string(dir.join(SCHEMA_FILE))?;

        let mut texts = Vec::new();
        let documents = dir.join(DOCUMENTS_FILE);
        if documents.exists() {
            for line in BufReader::new(File::open(&documents)?).lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    texts.push(line);
                }
            }
        }

        let stored = StoredCollection::restore(database, collection, &schema, texts)?;
        Ok((dir, stored))
    }

    fn persist(dir: &Path, stored: &StoredCollection) -> StorageResult<()> {
        let temp = dir.join(DOCUMENTS_TEMP);
        {
            let mut file = File::create(&temp)?;
            for text in stored.documents() {
                file.write_all(text.as_bytes())?;
                file.write_all(b"\n")?;
            }
            file.sync_all()?;
        }
        fs::rename(&temp, dir.join(DOCUMENTS_FILE))?;
        Ok(())
    }

    fn list_dirs(dir: &Path) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl StorageEngine for FileEngine {
    fn list_databases(&self) -> StorageResult<Vec<String>> {
        let _read = self.guard.read_recursive();
        Self::list_dirs(&self.root)
    }

    fn list_collections(&self, database: &str) -> StorageResult<Vec<String>> {
        let _read = self.guard.read_recursive();
        Self::list_dirs(&self.database_dir(database)?)
    }

    fn create_database(&self, database: &str) -> StorageResult<()> {
        check_name(database)?;
        let _write = self.guard.write();
        let dir = self.root.join(database);
        if dir.exists() {
            return Err(StorageError::DatabaseExists {
                database: database.to_string(),
            });
        }
        fs::create_dir(&dir)?;
        debug!(database, "created database directory");
        Ok(())
    }

    fn delete_database(&self, database: &str) -> StorageResult<()> {
        let _write = self.guard.write();
        let dir = self.database_dir(database)?;
        fs::remove_dir_all(dir)?;
        debug!(database, "deleted database directory");
        Ok(())
    }

    fn create_collection(
        &self,
        database: &str,
        collection: &str,
        schema: &str,
    ) -> StorageResult<()> {
        check_name(collection)?;
        let _write = self.guard.write();
        let dir = self.database_dir(database)?.join(collection);
        if dir.exists() {
            return Err(StorageError::CollectionExists {
                database: database.to_string(),
                collection: collection.to_string(),
            });
        }

        // Reject the schema before touching the disk.
        StoredCollection::new(database, collection, schema)?;

        fs::create_dir(&dir)?;
        fs::write(dir.join(SCHEMA_FILE), schema)?;
        File::create(dir.join(DOCUMENTS_FILE))?;
        debug!(database, collection, "created collection directory");
        Ok(())
    }

    fn delete_collection(&self, database: &str, collection: &str) -> StorageResult<()> {
        let _write = self.guard.write();
        let dir = self.collection_dir(database, collection)?;
        fs::remove_dir_all(dir)?;
        debug!(database, collection, "deleted collection directory");
        Ok(())
    }

    fn read_schema(&self, database: &str, collection: &str) -> StorageResult<String> {
        let _read = self.guard.read_recursive();
        let dir = self.collection_dir(database, collection)?;
        Ok(fs::read_to_string(dir.join(SCHEMA_FILE))?)
    }

    fn write_document(
        &self,
        database: &str,
        collection: &str,
        document: &str,
    ) -> StorageResult<()> {
        let _write = self.guard.write();
        let (dir, mut stored) = self.load(database, collection)?;
        let text = stored.insert(document)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(DOCUMENTS_FILE))?;
        file.write_all(text.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_data()?;
        Ok(())
    }

    fn read_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
    ) -> StorageResult<Vec<String>> {
        let _read = self.guard.read_recursive();
        let (_, stored) = self.load(database, collection)?;
        stored.select(filter)
    }

    fn delete_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
    ) -> StorageResult<usize> {
        let planning = self.guard.upgradable_read();
        let (dir, mut stored) = self.load(database, collection)?;
        let plan = stored.plan_removal(filter)?;

        let _write = RwLockUpgradableReadGuard::upgrade(planning);
        let removed = stored.apply(plan);
        if removed > 0 {
            Self::persist(&dir, &stored)?;
        }
        Ok(removed)
    }

    fn replace_documents(
        &self,
        database: &str,
        collection: &str,
        filter: &dyn DocumentFilter,
        transform: &dyn DocumentTransform,
    ) -> StorageResult<usize> {
        let planning = self.guard.upgradable_read();
        let (dir, mut stored) = self.load(database, collection)?;
        let plan = stored.plan_replacement(filter, transform)?;

        let _write = RwLockUpgradableReadGuard::upgrade(planning);
        let replaced = stored.apply(plan);
        if replaced > 0 {
            Self::persist(&dir, &stored)?;
        }
        Ok(replaced)
    }
}
