//! Persistence for the Gloomling pet.
//!
//! The store calls into this crate synchronously after every commit (via
//! the [`StateSink`](gloomling_core::StateSink) impl on
//! [`PersistenceGateway`]), and the binary calls [`PersistenceGateway::load`]
//! once at startup.
//!
//! # Modules
//!
//! - [`storage`] -- `SnapshotStorage` port with file and memory backends
//! - [`snapshot`] -- Versioned, whitelisted snapshot schema
//! - [`gateway`] -- Save with quota recovery, load with offline catch-up
//! - [`error`] -- Storage and snapshot error types

pub mod error;
pub mod gateway;
pub mod snapshot;
pub mod storage;

pub use error::{SnapshotError, StorageError};
pub use gateway::{CatchUp, DEFAULT_STORAGE_KEY, LoadSource, Loaded, PersistenceGateway, catch_up};
pub use snapshot::{PersistedSnapshot, SNAPSHOT_VERSION};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
