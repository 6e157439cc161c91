//! Backup and restore of a whole engine namespace.
//!
//! A backup is a point-in-time dump of every database, collection schema,
//! and document an engine holds. Restoring wipes the engine and replays the
//! dump, so the restored namespace equals the one that was backed up.
//!
//! ## Backup Format
//!
//! ```text
//! | magic (4) | version (2) | timestamp (8) | record_count (4) | records... | crc32 (4) |
//! ```
//!
//! Each record is a little-endian `u32` length followed by that many bytes
//! of JSON. Records appear in replay order: a database precedes its
//! collections, a collection precedes its documents.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};
use yudb_storage::{MatchAll, StorageEngine};

/// Magic bytes for backup files.
const BACKUP_MAGIC: [u8; 4] = *b"YUDB";
/// Current backup format version.
const BACKUP_VERSION: u16 = 1;
/// Header size (magic + version + timestamp + record_count).
const HEADER_SIZE: usize = 4 + 2 + 8 + 4;
/// Footer size (checksum).
const FOOTER_SIZE: usize = 4;

/// The backup subsystem as seen by the shell.
pub trait BackupService: Send + Sync {
    /// Takes a backup of the current engine state.
    fn backup(&self) -> CoreResult<BackupMetadata>;

    /// Replaces the engine state with the last backup.
    fn restore(&self) -> CoreResult<RestoreStats>;
}

/// One entry of a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackupRecord {
    /// A database.
    Database {
        /// Database name.
        name: String,
    },
    /// A collection and its encoded schema.
    Collection {
        /// Owning database.
        database: String,
        /// Collection name.
        name: String,
        /// Encoded schema.
        schema: String,
    },
    /// An encoded document.
    Document {
        /// Owning database.
        database: String,
        /// Owning collection.
        collection: String,
        /// Encoded document, `$id` included.
        document: String,
    },
}

/// Metadata about a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupMetadata {
    /// When the backup was created (Unix timestamp in milliseconds).
    pub timestamp: u64,
    /// Number of records in the backup.
    pub record_count: u32,
    /// Size of the backup data in bytes.
    pub size: usize,
}

/// Result of a backup operation.
#[derive(Debug)]
pub struct BackupResult {
    /// Backup metadata.
    pub metadata: BackupMetadata,
    /// The backup data.
    pub data: Vec<u8>,
}

/// Counts of what a restore replayed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreStats {
    /// Databases recreated.
    pub databases: usize,
    /// Collections recreated.
    pub collections: usize,
    /// Documents rewritten.
    pub documents: usize,
}

/// Serializes engine state to backup data and back.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackupManager;

impl BackupManager {
    /// Creates a backup manager.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Dumps every database, collection, and document of `engine`.
    pub fn create_backup(&self, engine: &dyn StorageEngine) -> CoreResult<BackupResult> {
        let mut records = Vec::new();
        for database in engine.list_databases()? {
            records.push(BackupRecord::Database {
                name: database.clone(),
            });
            for collection in engine.list_collections(&database)? {
                records.push(BackupRecord::Collection {
                    database: database.clone(),
                    name: collection.clone(),
                    schema: engine.read_schema(&database, &collection)?,
                });
                for document in engine.read_documents(&database, &collection, &MatchAll)? {
                    records.push(BackupRecord::Document {
                        database: database.clone(),
                        collection: collection.clone(),
                        document,
                    });
                }
            }
        }
        self.create_backup_from_records(&records)
    }

    /// Creates backup data from a set of records.
    pub fn create_backup_from_records(&self, records: &[BackupRecord]) -> CoreResult<BackupResult> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let record_count = u32::try_from(records.len())
            .map_err(|_| CoreError::invalid_format("too many records for one backup"))?;

        let mut data = Vec::with_capacity(HEADER_SIZE + FOOTER_SIZE);
        data.extend_from_slice(&BACKUP_MAGIC);
        data.extend_from_slice(&BACKUP_VERSION.to_le_bytes());
        data.extend_from_slice(&timestamp.to_le_bytes());
        data.extend_from_slice(&record_count.to_le_bytes());

        for record in records {
            let encoded = serde_json::to_vec(record)?;
            let len = u32::try_from(encoded.len())
                .map_err(|_| CoreError::invalid_format("record too large"))?;
            data.extend_from_slice(&len.to_le_bytes());
            data.extend_from_slice(&encoded);
        }

        let checksum = compute_crc32(&data);
        data.extend_from_slice(&checksum.to_le_bytes());

        let metadata = BackupMetadata {
            timestamp,
            record_count,
            size: data.len(),
        };
        Ok(BackupResult { metadata, data })
    }

    /// Reads backup metadata without parsing records.
    pub fn read_metadata(&self, data: &[u8]) -> CoreResult<BackupMetadata> {
        if data.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(CoreError::invalid_format("backup data too small"));
        }
        if data[0..4] != BACKUP_MAGIC {
            return Err(CoreError::invalid_format("invalid backup magic"));
        }

        let version = u16::from_le_bytes([data[4], data[5]]);
        if version != BACKUP_VERSION {
            return Err(CoreError::invalid_format(format!(
                "unsupported backup version: {version}"
            )));
        }

        Ok(BackupMetadata {
            timestamp: u64::from_le_bytes(read_array(&data[6..14])),
            record_count: u32::from_le_bytes(read_array(&data[14..18])),
            size: data.len(),
        })
    }

    /// Returns true if the data has the right magic and checksum.
    pub fn validate_backup(&self, data: &[u8]) -> CoreResult<bool> {
        if data.len() < HEADER_SIZE + FOOTER_SIZE || data[0..4] != BACKUP_MAGIC {
            return Ok(false);
        }
        let (stored, computed) = checksums(data);
        Ok(stored == computed)
    }

    /// Parses backup data into its records.
    pub fn read_records(&self, data: &[u8]) -> CoreResult<(BackupMetadata, Vec<BackupRecord>)> {
        let metadata = self.read_metadata(data)?;

        let (expected, actual) = checksums(data);
        if expected != actual {
            return Err(CoreError::ChecksumMismatch { expected, actual });
        }

        let body = &data[HEADER_SIZE..data.len() - FOOTER_SIZE];
        // Every record needs at least its 4-byte length prefix.
        let capacity = (metadata.record_count as usize).min(body.len() / 4);
        let mut records = Vec::with_capacity(capacity);
        let mut offset = 0usize;
        while offset < body.len() {
            if offset + 4 > body.len() {
                return Err(CoreError::invalid_format("truncated record length"));
            }
            let len = u32::from_le_bytes(read_array(&body[offset..offset + 4])) as usize;
            offset += 4;
            if offset + len > body.len() {
                return Err(CoreError::invalid_format("record extends beyond data"));
            }
            records.push(serde_json::from_slice(&body[offset..offset + len])?);
            offset += len;
        }

        if records.len() != metadata.record_count as usize {
            return Err(CoreError::invalid_format(format!(
                "record count mismatch: expected {}, got {}",
                metadata.record_count,
                records.len()
            )));
        }

        Ok((metadata, records))
    }

    /// Wipes `engine` and replays the backup into it.
    ///
    /// The backup is fully parsed and verified before anything is deleted.
    pub fn restore(&self, engine: &dyn StorageEngine, data: &[u8]) -> CoreResult<RestoreStats> {
        let (_, records) = self.read_records(data)?;

        for database in engine.list_databases()? {
            engine.delete_database(&database)?;
        }

        let mut stats = RestoreStats::default();
        for record in records {
            match record {
                BackupRecord::Database { name } => {
                    engine.create_database(&name)?;
                    stats.databases += 1;
                }
                BackupRecord::Collection {
                    database,
                    name,
                    schema,
                } => {
                    engine.create_collection(&database, &name, &schema)?;
                    stats.collections += 1;
                }
                BackupRecord::Document {
                    database,
                    collection,
                    document,
                } => {
                    engine.write_document(&database, &collection, &document)?;
                    stats.documents += 1;
                }
            }
        }
        Ok(stats)
    }
}

/// Backup service storing the backup in a single file.
pub struct FileBackup {
    engine: Arc<dyn StorageEngine>,
    path: PathBuf,
    manager: BackupManager,
}

impl FileBackup {
    /// Creates a service backing up `engine` to `path`.
    pub fn new(engine: Arc<dyn StorageEngine>, path: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            path: path.into(),
            manager: BackupManager::new(),
        }
    }

    /// Returns the backup file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupService for FileBackup {
    fn backup(&self) -> CoreResult<BackupMetadata> {
        let backup = self.manager.create_backup(self.engine.as_ref())?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, &backup.data)?;
        fs::rename(&temp, &self.path)?;

        info!(
            path = %self.path.display(),
            records = backup.metadata.record_count,
            "backup written"
        );
        Ok(backup.metadata)
    }

    fn restore(&self) -> CoreResult<RestoreStats> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "restore requested without a backup");
            return Err(CoreError::NoBackup);
        }
        let data = fs::read(&self.path)?;
        let stats = self.manager.restore(self.engine.as_ref(), &data)?;
        info!(path = %self.path.display(), ?stats, "backup restored");
        Ok(stats)
    }
}

/// Backup service keeping the last backup in memory.
pub struct MemoryBackup {
    engine: Arc<dyn StorageEngine>,
    data: Mutex<Option<Vec<u8>>>,
    manager: BackupManager,
}

impl MemoryBackup {
    /// Creates a service backing up `engine`.
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            engine,
            data: Mutex::new(None),
            manager: BackupManager::new(),
        }
    }

    /// Returns true once a backup has been taken.
    #[must_use]
    pub fn has_backup(&self) -> bool {
        self.data.lock().is_some()
    }
}

impl BackupService for MemoryBackup {
    fn backup(&self) -> CoreResult<BackupMetadata> {
        let backup = self.manager.create_backup(self.engine.as_ref())?;
        *self.data.lock() = Some(backup.data);
        Ok(backup.metadata)
    }

    fn restore(&self) -> CoreResult<RestoreStats> {
        let data = self.data.lock().clone().ok_or(CoreError::NoBackup)?;
        self.manager.restore(self.engine.as_ref(), &data)
    }
}

#[inline]
fn read_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&slice[..N]);
    out
}

/// Returns (stored, computed) checksums of backup data.
fn checksums(data: &[u8]) -> (u32, u32) {
    let offset = data.len() - FOOTER_SIZE;
    let stored = u32::from_le_bytes(read_array(&data[offset..]));
    (stored, compute_crc32(&data[..offset]))
}

/// CRC32 (IEEE polynomial) of `data`.
fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use yudb_storage::InMemoryEngine;

    fn populated() -> Arc<dyn StorageEngine> {
        let engine = InMemoryEngine::new();
        engine.create_database("shop").unwrap();
        engine
            .create_collection("shop", "items", r#"{"required":["sku"]}"#)
            .unwrap();
        engine
            .write_document("shop", "items", r#"{"$id":"1","sku":"a"}"#)
            .unwrap();
        engine
            .write_document("shop", "items", r#"{"$id":"2","sku":"b"}"#)
            .unwrap();
        engine.create_database("empty").unwrap();
        Arc::new(engine)
    }

    #[test]
    fn crc32_known_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn backup_counts_records() {
        let engine = populated();
        let backup = BackupManager::new().create_backup(engine.as_ref()).unwrap();
        // 2 databases + 1 collection + 2 documents
        assert_eq!(backup.metadata.record_count, 5);
        assert_eq!(backup.metadata.size, backup.data.len());
    }

    #[test]
    fn backup_and_restore_roundtrip() {
        let engine = populated();
        let manager = BackupManager::new();
        let backup = manager.create_backup(engine.as_ref()).unwrap();

        engine.delete_database("shop").unwrap();
        engine.create_database("stray").unwrap();

        let stats = manager.restore(engine.as_ref(), &backup.data).unwrap();
        assert_eq!(
            stats,
            RestoreStats {
                databases: 2,
                collections: 1,
                documents: 2
            }
        );
        assert_eq!(engine.list_databases().unwrap(), vec!["empty", "shop"]);
        assert_eq!(
            engine.read_documents("shop", "items", &MatchAll).unwrap(),
            vec![r#"{"$id":"1","sku":"a"}"#, r#"{"$id":"2","sku":"b"}"#]
        );
        assert_eq!(
            engine.read_schema("shop", "items").unwrap(),
            r#"{"required":["sku"]}"#
        );
    }

    #[test]
    fn validate_backup_detects_corruption() {
        let manager = BackupManager::new();
        let backup = manager.create_backup(populated().as_ref()).unwrap();
        assert!(manager.validate_backup(&backup.data).unwrap());

        let mut corrupted = backup.data.clone();
        corrupted[HEADER_SIZE + 6] ^= 0xFF;
        assert!(!manager.validate_backup(&corrupted).unwrap());
        assert!(matches!(
            manager.read_records(&corrupted),
            Err(CoreError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn corrupted_backup_leaves_engine_alone() {
        let engine = populated();
        let manager = BackupManager::new();
        let mut data = manager.create_backup(engine.as_ref()).unwrap().data;
        let last = data.len() - 1;
        data[last] ^= 0x01;

        assert!(manager.restore(engine.as_ref(), &data).is_err());
        assert_eq!(engine.list_databases().unwrap(), vec!["empty", "shop"]);
    }

    #[test]
    fn invalid_magic_rejected() {
        let manager = BackupManager::new();
        let mut bad = vec![0u8; HEADER_SIZE + FOOTER_SIZE];
        bad[0..4].copy_from_slice(b"XXXX");
        assert!(manager.read_metadata(&bad).is_err());
        assert!(!manager.validate_backup(&bad).unwrap());
    }

    #[test]
    fn inflated_record_count_is_rejected() {
        let manager = BackupManager::new();
        let mut data = Vec::new();
        data.extend_from_slice(&BACKUP_MAGIC);
        data.extend_from_slice(&BACKUP_VERSION.to_le_bytes());
        data.extend_from_slice(&0u64.to_le_bytes());
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        let checksum = compute_crc32(&data);
        data.extend_from_slice(&checksum.to_le_bytes());

        assert!(manager.validate_backup(&data).unwrap());
        match manager.read_records(&data) {
            Err(CoreError::InvalidFormat { message }) => {
                assert!(message.contains("record count mismatch"));
            }
            other => panic!("expected a format error, got {other:?}"),
        }
    }

    #[test]
    fn backup_too_small_fails() {
        let manager = BackupManager::new();
        assert!(manager.read_records(&[0u8; 10]).is_err());
    }

    #[test]
    fn empty_backup() {
        let manager = BackupManager::new();
        let backup = manager.create_backup_from_records(&[]).unwrap();
        assert_eq!(backup.metadata.record_count, 0);
        let (_, records) = manager.read_records(&backup.data).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn read_metadata_without_parsing_records() {
        let manager = BackupManager::new();
        let records = vec![BackupRecord::Database { name: "a".into() }];
        let backup = manager.create_backup_from_records(&records).unwrap();
        let metadata = manager.read_metadata(&backup.data).unwrap();
        assert_eq!(metadata.record_count, 1);
        assert_eq!(metadata.timestamp, backup.metadata.timestamp);
    }

    #[test]
    fn file_backup_roundtrip() {
        let dir = tempdir().unwrap();
        let engine = populated();
        let path = dir.path().join("b").join("backup.yudb");
        let service = FileBackup::new(Arc::clone(&engine), path);

        assert!(matches!(service.restore(), Err(CoreError::NoBackup)));

        service.backup().unwrap();
        assert!(service.path().exists());

        engine.delete_database("empty").unwrap();
        let stats = service.restore().unwrap();
        assert_eq!(stats.databases, 2);
        assert_eq!(engine.list_databases().unwrap(), vec!["empty", "shop"]);
    }

    #[test]
    fn memory_backup_roundtrip() {
        let engine = populated();
        let service = MemoryBackup::new(Arc::clone(&engine));
        assert!(!service.has_backup());
        assert!(matches!(service.restore(), Err(CoreError::NoBackup)));

        service.backup().unwrap();
        assert!(service.has_backup());
        engine.delete_database("shop").unwrap();
        service.restore().unwrap();
        assert_eq!(engine.list_collections("shop").unwrap(), vec!["items"]);
    }
}
