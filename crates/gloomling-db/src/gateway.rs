//! The persistence gateway: save after every commit, restore on startup.
//!
//! # Write path
//!
//! Every committed state is captured as a [`PersistedSnapshot`] and written
//! under one key. When storage reports that the record is over quota, the
//! log is cut to the newest [`QUOTA_TRIM_KEEP`] entries and the write is
//! retried once. The store is told how many entries survived so its
//! in-memory log can match.
//!
//! # Load path
//!
//! A missing record yields a fresh state. A record that fails to parse or
//! validate is removed and also yields a fresh state. A living pet is then
//! advanced through the offline gap in a single engine step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gloomling_core::log::{death_line, evolution_line, time_passed_line};
use gloomling_core::rules::{CATCH_UP_NOTICE_MINUTES, QUOTA_TRIM_KEEP};
use gloomling_core::{PersistOutcome, PetState, StageTransition, StateSink, elapsed_game_minutes, step};
use gloomling_types::{LogSource, UserSettings};
use tracing::{debug, error, info, warn};

use crate::error::StorageError;
use crate::snapshot::PersistedSnapshot;
use crate::storage::SnapshotStorage;

/// Default storage key for the snapshot record.
pub const DEFAULT_STORAGE_KEY: &str = "gloomling.snapshot";

/// How a state came out of [`PersistenceGateway::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Nothing was stored.
    Empty,
    /// A valid record was restored.
    Restored,
    /// The stored record was unusable and has been removed.
    Recovered,
}

/// What offline catch-up did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchUp {
    /// Game-minutes applied. Less than the gap only if the pet died.
    pub minutes: u64,
    /// Stage change during the gap.
    pub transition: Option<StageTransition>,
    /// True if the pet collapsed while away.
    pub died: bool,
}

/// Result of [`PersistenceGateway::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    /// State to hand to the store.
    pub state: PetState,
    /// Where it came from.
    pub source: LoadSource,
    /// Catch-up applied, if the pet was alive and time had passed.
    pub catch_up: Option<CatchUp>,
}

/// Reads and writes the pet snapshot through a [`SnapshotStorage`].
pub struct PersistenceGateway {
    storage: Arc<dyn SnapshotStorage>,
    key: String,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PersistenceGateway {
    /// A gateway writing under `key`.
    pub fn new(storage: Arc<dyn SnapshotStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Storage key in use.
    pub fn key(&self) -> &str {
        &self.key
    }

    // -- Write path ---------------------------------------------------------

    /// Persist `state`, trimming the log once if storage is full.
    pub fn save(&self, state: &PetState) -> PersistOutcome {
        let mut snapshot = PersistedSnapshot::capture(state);
        match self.write(&snapshot) {
            Ok(()) => return PersistOutcome::Saved,
            Err(e) if e.is_quota() => {
                warn!(error = %e, keep = QUOTA_TRIM_KEEP, "snapshot over quota, trimming logs");
            }
            Err(e) => {
                error!(error = %e, key = %self.key, "snapshot write failed");
                return PersistOutcome::Failed;
            }
        }

        snapshot.trim_logs(QUOTA_TRIM_KEEP);
        match self.write(&snapshot) {
            Ok(()) => PersistOutcome::SavedAfterTrim {
                kept: snapshot.logs.len(),
            },
            Err(e) => {
                error!(
                    error = %e,
                    key = %self.key,
                    "snapshot write failed after trimming, progress is not being saved"
                );
                PersistOutcome::Failed
            }
        }
    }

    fn write(&self, snapshot: &PersistedSnapshot) -> Result<(), StorageError> {
        let raw = snapshot.encode()?;
        self.storage.write(&self.key, &raw)
    }

    // -- Load path ----------------------------------------------------------

    /// Restore the stored session and run offline catch-up.
    ///
    /// Never fails: unreadable or invalid records are logged, removed, and
    /// replaced by a fresh state with default settings.
    pub fn load(&self, now: DateTime<Utc>, log_capacity: usize) -> Loaded {
        let fresh = || PetState::fresh(log_capacity, UserSettings::default(), now);

        let raw = match self.storage.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(key = %self.key, "no saved pet, starting fresh");
                return Loaded {
                    state: fresh(),
                    source: LoadSource::Empty,
                    catch_up: None,
                };
            }
            Err(e) => {
                error!(error = %e, key = %self.key, "snapshot read failed, starting fresh");
                return Loaded {
                    state: fresh(),
                    source: LoadSource::Recovered,
                    catch_up: None,
                };
            }
        };

        let restored = PersistedSnapshot::decode(&raw).and_then(|s| s.restore(log_capacity));
        let mut state = match restored {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, key = %self.key, "saved pet is corrupted, discarding it");
                if let Err(e) = self.storage.remove(&self.key) {
                    error!(error = %e, key = %self.key, "failed to remove corrupted snapshot");
                }
                return Loaded {
                    state: fresh(),
                    source: LoadSource::Recovered,
                    catch_up: None,
                };
            }
        };

        let catch_up = catch_up(&mut state, now);
        info!(
            age = state.vitals.age,
            stage = %state.vitals.stage,
            alive = state.vitals.is_alive,
            caught_up = catch_up.map_or(0, |c| c.minutes),
            "saved pet restored"
        );
        Loaded {
            state,
            source: LoadSource::Restored,
            catch_up,
        }
    }
}

impl StateSink for PersistenceGateway {
    fn persist(&self, state: &PetState) -> PersistOutcome {
        self.save(state)
    }
}

/// Advance a restored pet through the time it spent offline.
///
/// Runs the engine once with the whole gap. Uninitialized and dead pets
/// are skipped. Long gaps get a SYSTEM notice; a stage change or a collapse
/// during the gap is logged as it would have been live.
pub fn catch_up(state: &mut PetState, now: DateTime<Utc>) -> Option<CatchUp> {
    if !state.is_active() {
        return None;
    }
    let elapsed = elapsed_game_minutes(state.last_tick_at, now);
    if elapsed == 0 {
        return None;
    }

    let outcome = match step(&state.vitals, elapsed) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, elapsed, "offline catch-up failed, keeping saved vitals");
            return None;
        }
    };
    state.vitals = outcome.next;
    state.last_tick_at = now;

    let age = state.vitals.age;
    if elapsed >= CATCH_UP_NOTICE_MINUTES {
        state.log.push(time_passed_line(elapsed), LogSource::System, age, false);
    }
    let name = state.identity.as_ref().map(|i| i.name.clone()).unwrap_or_default();
    if let Some(transition) = outcome.transition {
        state
            .log
            .push(evolution_line(&name, transition.to), LogSource::System, age, false);
    }
    if outcome.died {
        state.log.push(death_line(&name), LogSource::System, age, false);
    }

    debug!(elapsed, applied = outcome.minutes_applied, "offline catch-up applied");
    Some(CatchUp {
        minutes: outcome.minutes_applied,
        transition: outcome.transition,
        died: outcome.died,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeDelta;
    use gloomling_types::{Archetype, PetIdentity, Stage};

    use super::*;
    use crate::storage::MemoryStorage;

    fn living(now: DateTime<Utc>) -> PetState {
        let mut state = PetState::fresh(200, UserSettings::default(), now);
        state.identity = PetIdentity::new("Mote", Archetype::Husk, 0).ok();
        state
    }

    #[test]
    fn save_then_load_without_gap() {
        let storage = Arc::new(MemoryStorage::new());
        let gateway = PersistenceGateway::new(storage, DEFAULT_STORAGE_KEY);
        let now = Utc::now();
        let state = living(now);

        assert_eq!(gateway.save(&state), PersistOutcome::Saved);
        let loaded = gateway.load(now, 200);
        assert_eq!(loaded.source, LoadSource::Restored);
        assert_eq!(loaded.catch_up, None);
        assert_eq!(loaded.state, state);
    }

    #[test]
    fn io_failures_are_reported_without_retry() {
        struct Broken;
        impl SnapshotStorage for Broken {
            fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::Io(std::io::Error::other("disk gone")))
            }
            fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::Io(std::io::Error::other("disk gone")))
            }
            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let gateway = PersistenceGateway::new(Arc::new(Broken), "k");
        let now = Utc::now();
        assert_eq!(gateway.save(&living(now)), PersistOutcome::Failed);
        let loaded = gateway.load(now, 200);
        assert_eq!(loaded.source, LoadSource::Recovered);
        assert!(!loaded.state.is_initialized());
    }

    /// Reports a full disk for any record longer than `limit`.
    struct FullDisk {
        limit: usize,
        writes: AtomicUsize,
        stored: Mutex<Option<String>>,
    }

    impl SnapshotStorage for FullDisk {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.stored.lock().unwrap().clone())
        }
        fn write(&self, _key: &str, value: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if value.len() > self.limit {
                return Err(StorageError::Io(std::io::Error::from(
                    std::io::ErrorKind::StorageFull,
                )));
            }
            *self.stored.lock().unwrap() = Some(value.to_owned());
            Ok(())
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn full_disk_trims_logs_and_retries() {
        let now = Utc::now();
        let mut state = living(now);
        for i in 0..100 {
            state.log.push(format!("line {i}"), LogSource::System, 0, false);
        }
        let mut trimmed = PersistedSnapshot::capture(&state);
        trimmed.trim_logs(QUOTA_TRIM_KEEP);
        let storage = Arc::new(FullDisk {
            limit: trimmed.encode().unwrap().len(),
            writes: AtomicUsize::new(0),
            stored: Mutex::new(None),
        });
        let gateway = PersistenceGateway::new(
            Arc::clone(&storage) as Arc<dyn SnapshotStorage>,
            DEFAULT_STORAGE_KEY,
        );

        assert_eq!(
            gateway.save(&state),
            PersistOutcome::SavedAfterTrim { kept: 50 }
        );
        assert_eq!(storage.writes.load(Ordering::SeqCst), 2);
        let raw = storage.read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let saved = PersistedSnapshot::decode(&raw).unwrap();
        assert_eq!(saved.logs.len(), 50);
        assert_eq!(saved.logs.last().map(|e| e.text.as_str()), Some("line 99"));
    }

    #[test]
    fn catch_up_skips_dead_and_empty_sessions() {
        let then = Utc::now();
        let later = then + TimeDelta::hours(5);

        let mut empty = PetState::fresh(200, UserSettings::default(), then);
        assert_eq!(catch_up(&mut empty, later), None);

        let mut dead = living(then);
        dead.vitals.is_alive = false;
        let before = dead.clone();
        assert_eq!(catch_up(&mut dead, later), None);
        assert_eq!(dead, before);
    }

    #[test]
    fn short_gap_adds_no_notice() {
        let then = Utc::now();
        let mut state = living(then);
        let report = catch_up(&mut state, then + TimeDelta::seconds(59)).unwrap();
        assert_eq!(report.minutes, 59);
        assert_eq!(state.vitals.age, 59);
        assert_eq!(state.vitals.stage, Stage::Baby);
        let texts: Vec<_> = state.log.iter().map(|e| e.text.clone()).collect();
        assert_eq!(texts, ["Mote has evolved into BABY."]);
    }

    #[test]
    fn long_gap_jumps_egg_to_teen() {
        let then = Utc::now();
        let mut state = living(then);
        let report = catch_up(&mut state, then + TimeDelta::seconds(2000)).unwrap();
        assert_eq!(report.transition.map(|t| t.to), Some(Stage::Teen));
        assert_eq!(state.vitals.stage, Stage::Teen);
        assert_eq!(state.last_tick_at, then + TimeDelta::seconds(2000));
        let texts: Vec<_> = state.log.iter().map(|e| e.text.clone()).collect();
        assert_eq!(
            texts,
            [
                "While you were away, 33 hours and 20 minutes passed.",
                "Mote has evolved into TEEN.",
            ]
        );
    }

    #[test]
    fn pet_can_die_while_away() {
        let then = Utc::now();
        let mut state = living(then);
        let report = catch_up(&mut state, then + TimeDelta::days(7)).unwrap();
        assert!(report.died);
        assert_eq!(report.minutes, 5000);
        assert!(!state.vitals.is_alive);
        assert!(state.log.iter().any(|e| e.text.contains("collapsed")));
    }
}
