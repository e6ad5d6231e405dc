//! Error types for the persistence layer.
//!
//! Neither error ever leaves [`PersistenceGateway`](crate::PersistenceGateway):
//! storage failures become a [`PersistOutcome`](gloomling_core::PersistOutcome)
//! and snapshot failures become a fresh state. Both are logged at error
//! severity where they are absorbed.

use std::io::ErrorKind;

use gloomling_core::InventoryError;
use gloomling_types::{IdentityError, LogEntryId};

/// Errors raised by a [`SnapshotStorage`](crate::SnapshotStorage) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The record does not fit in the configured byte quota.
    #[error("storage quota exceeded: record is {size} bytes, quota is {quota}")]
    QuotaExceeded {
        /// Size of the rejected record.
        size: u64,
        /// Configured limit.
        quota: u64,
    },

    /// The key cannot be used as a storage name.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// The snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this failure may clear after shrinking the record.
    ///
    /// Covers the configured byte quota as well as a full disk or an
    /// exhausted filesystem quota reported by the OS.
    pub fn is_quota(&self) -> bool {
        match self {
            Self::QuotaExceeded { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                ErrorKind::StorageFull | ErrorKind::QuotaExceeded
            ),
            Self::InvalidKey(_) | Self::Serialization(_) => false,
        }
    }
}

/// Reasons a stored record cannot be restored.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The record is not valid JSON for the snapshot schema.
    #[error("snapshot parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The record was written by an unknown schema version.
    #[error("unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Version in the record.
        found: u32,
        /// Version this build writes.
        expected: u32,
    },

    /// A stat lies outside 0 to 100.
    #[error("snapshot stats out of bounds")]
    StatsOutOfBounds,

    /// Inventory capacity or id uniqueness is violated.
    #[error("snapshot inventory invalid: {0}")]
    Inventory(#[from] InventoryError),

    /// The stored identity breaks the name or color rules.
    #[error("snapshot identity invalid: {0}")]
    Identity(#[from] IdentityError),

    /// Two log entries share an id.
    #[error("duplicate log entry id {0}")]
    DuplicateLogEntry(LogEntryId),

    /// Volume is above 100.
    #[error("snapshot volume {0} is above 100")]
    VolumeOutOfRange(u8),

    /// The record describes a living pet that was never created.
    #[error("snapshot has gameplay state but no identity")]
    OrphanedState,
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn capacity_failures_count_as_quota() {
        let configured = StorageError::QuotaExceeded { size: 10, quota: 5 };
        let disk_full = StorageError::Io(io::Error::from(ErrorKind::StorageFull));
        let fs_quota = StorageError::Io(io::Error::from(ErrorKind::QuotaExceeded));
        assert!(configured.is_quota());
        assert!(disk_full.is_quota());
        assert!(fs_quota.is_quota());
    }

    #[test]
    fn other_failures_are_not_quota() {
        assert!(!StorageError::Io(io::Error::other("disk gone")).is_quota());
        assert!(!StorageError::Io(io::Error::from(ErrorKind::PermissionDenied)).is_quota());
        assert!(!StorageError::InvalidKey(String::from("..")).is_quota());
    }
}
