//! Key-value storage for the persisted snapshot.
//!
//! The gateway needs three operations on a single well-known key, so the
//! port is small and synchronous: writes happen inside the store's commit
//! and must finish before the action returns. Both backends can enforce a
//! per-record byte quota, which is what drives the gateway's trim-and-retry
//! path.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StorageError;

/// Synchronous key-value storage.
pub trait SnapshotStorage: Send + Sync {
    /// Read the value at `key`, or `None` if nothing is stored there.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value at `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reject a record larger than `quota`.
fn check_quota(value: &str, quota: Option<u64>) -> Result<(), StorageError> {
    let size = u64::try_from(value.len()).unwrap_or(u64::MAX);
    match quota {
        Some(quota) if size > quota => Err(StorageError::QuotaExceeded { size, quota }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

/// One file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    /// Storage rooted at `directory`. The directory is created on first write.
    pub fn new(directory: impl Into<PathBuf>, quota_bytes: Option<u64>) -> Self {
        Self {
            directory: directory.into(),
            quota_bytes,
        }
    }

    /// Root directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && !key.ends_with(".tmp");
        if !valid {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.directory.join(key))
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        check_quota(value, self.quota_bytes)?;
        fs::create_dir_all(&self.directory)?;
        let tmp = self.directory.join(format!("{key}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory storage
// ---------------------------------------------------------------------------

/// In-process storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStorage {
    /// Empty storage with no quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty storage that rejects records larger than `quota_bytes`.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            entries: Mutex::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        check_quota(value, self.quota_bytes)?;
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}
