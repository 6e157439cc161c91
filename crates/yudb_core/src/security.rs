//! Credential subsystem.
//!
//! Passwords are never stored in clear: each record keeps a random 16-byte
//! salt and the SHA-256 digest of `salt || password`, both hex encoded.
//! New stores start with the account `admin` / `admin`.

use crate::error::{CoreError, CoreResult};
use parking_lot::Mutex;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Username of a freshly created credential store.
pub const DEFAULT_USERNAME: &str = "admin";
/// Password of a freshly created credential store.
pub const DEFAULT_PASSWORD: &str = "admin";

const SALT_SIZE: usize = 16;

/// Stores the shell user's name and password.
pub trait CredentialStore: Send + Sync {
    /// Renames the user.
    ///
    /// Surrounding whitespace is dropped. Returns the name that was stored,
    /// or `None` if the name was refused.
    fn change_username(&self, new_username: &str) -> CoreResult<Option<String>>;

    /// Replaces the password. Returns false if `old_password` is wrong.
    fn change_password(&self, old_password: &str, new_password: &str) -> CoreResult<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CredentialRecord {
    username: String,
    salt: String,
    password_hash: String,
}

impl CredentialRecord {
    fn new(username: &str, password: &str) -> Self {
        let mut record = Self {
            username: username.to_string(),
            salt: String::new(),
            password_hash: String::new(),
        };
        record.set_password(password);
        record
    }

    fn set_password(&mut self, password: &str) {
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        self.salt = to_hex(&salt);
        self.password_hash = hash_password(&self.salt, password);
    }

    fn password_matches(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }

    /// Applies a rename; blank names are refused.
    fn rename(&mut self, new_username: &str) -> Option<String> {
        let trimmed = new_username.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.username = trimmed.to_string();
        Some(self.username.clone())
    }
}

fn hash_password(salt_hex: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt_hex.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Credentials kept in memory for the life of the process.
#[derive(Debug)]
pub struct MemoryCredentials {
    record: Mutex<CredentialRecord>,
}

impl MemoryCredentials {
    /// Creates a store holding one account.
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            record: Mutex::new(CredentialRecord::new(username, password)),
        }
    }
}

impl Default for MemoryCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl CredentialStore for MemoryCredentials {
    fn change_username(&self, new_username: &str) -> CoreResult<Option<String>> {
        Ok(self.record.lock().rename(new_username))
    }

    fn change_password(&self, old_password: &str, new_password: &str) -> CoreResult<bool> {
        let mut record = self.record.lock();
        if !record.password_matches(old_password) {
            return Ok(false);
        }
        record.set_password(new_password);
        Ok(true)
    }
}

/// Credentials persisted as a JSON file.
///
/// The file is rewritten through a temporary file and a rename, so a crash
/// never leaves a half-written record.
#[derive(Debug)]
pub struct FileCredentials {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentials {
    /// Opens the credential file, creating it with the default account if
    /// it does not exist.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let store = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            store.save(&CredentialRecord::new(DEFAULT_USERNAME, DEFAULT_PASSWORD))?;
            info!(path = %path.display(), "created default credentials");
        }
        Ok(store)
    }

    /// Returns the credential file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CoreResult<CredentialRecord> {
        let text = fs::read_to_string(&self.path)?;
        serde_json::from_str(&text)
            .map_err(|e| CoreError::credentials(format!("unreadable credential file: {e}")))
    }

    fn save(&self, record: &CredentialRecord) -> CoreResult<()> {
        let temp = self.path.with_extension("tmp");
        fs::write(&temp, serde_json::to_vec_pretty(record)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentials {
    fn change_username(&self, new_username: &str) -> CoreResult<Option<String>> {
        let _guard = self.lock.lock();
        let mut record = self.load()?;
        let applied = record.rename(new_username);
        if applied.is_some() {
            self.save(&record)?;
        }
        Ok(applied)
    }

    fn change_password(&self, old_password: &str, new_password: &str) -> CoreResult<bool> {
        let _guard = self.lock.lock();
        let mut record = self.load()?;
        if !record.password_matches(old_password) {
            return Ok(false);
        }
        record.set_password(new_password);
        self.save(&record)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn signs_in(record: &CredentialRecord, username: &str, password: &str) -> bool {
        record.username == username && record.password_matches(password)
    }

    fn memory_record(store: &MemoryCredentials) -> CredentialRecord {
        store.record.lock().clone()
    }

    #[test]
    fn memory_defaults() {
        let store = MemoryCredentials::default();
        let record = memory_record(&store);
        assert!(signs_in(&record, DEFAULT_USERNAME, DEFAULT_PASSWORD));
        assert!(!signs_in(&record, DEFAULT_USERNAME, "wrong"));
    }

    #[test]
    fn memory_change_username() {
        let store = MemoryCredentials::default();
        assert_eq!(store.change_username("root").unwrap().as_deref(), Some("root"));
        assert_eq!(store.change_username("   ").unwrap(), None);
        assert_eq!(memory_record(&store).username, "root");
    }

    #[test]
    fn change_username_trims_and_reports_applied_name() {
        let store = MemoryCredentials::default();
        assert_eq!(store.change_username("  ops \t").unwrap().as_deref(), Some("ops"));
        assert_eq!(memory_record(&store).username, "ops");
    }

    #[test]
    fn memory_change_password_requires_old() {
        let store = MemoryCredentials::new("u", "old");
        assert!(!store.change_password("nope", "new").unwrap());
        assert!(signs_in(&memory_record(&store), "u", "old"));

        assert!(store.change_password("old", "new").unwrap());
        let record = memory_record(&store);
        assert!(signs_in(&record, "u", "new"));
        assert!(!signs_in(&record, "u", "old"));
    }

    #[test]
    fn salts_differ_between_records() {
        let a = CredentialRecord::new("u", "same");
        let b = CredentialRecord::new("u", "same");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.password_hash, b.password_hash);
        assert_eq!(a.password_hash.len(), 64);
    }

    #[test]
    fn file_store_creates_default_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("credentials.json");

        {
            let store = FileCredentials::open(&path).unwrap();
            assert!(path.exists());
            assert!(signs_in(&store.load().unwrap(), DEFAULT_USERNAME, DEFAULT_PASSWORD));
            assert_eq!(store.change_username(" ops ").unwrap().as_deref(), Some("ops"));
            assert!(store.change_password(DEFAULT_PASSWORD, "s3cret").unwrap());
        }

        let store = FileCredentials::open(&path).unwrap();
        assert!(signs_in(&store.load().unwrap(), "ops", "s3cret"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn file_store_rejects_wrong_password() {
        let dir = tempdir().unwrap();
        let store = FileCredentials::open(&dir.path().join("c.json")).unwrap();
        assert!(!store.change_password("bad", "x").unwrap());
        assert!(signs_in(&store.load().unwrap(), DEFAULT_USERNAME, DEFAULT_PASSWORD));
    }

    #[test]
    fn file_store_reports_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "garbage").unwrap();
        let store = FileCredentials::open(&path).unwrap();
        assert!(matches!(
            store.change_username("ops"),
            Err(CoreError::Credentials { .. })
        ));
    }
}
