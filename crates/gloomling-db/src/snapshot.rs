//! The persisted snapshot schema.
//!
//! Only a whitelisted subset of [`PetState`] is written: identity, stats,
//! stage, age, inventory, logs, counters, the alive flag, the last tick
//! time, and settings. Store bookkeeping such as in-flight scavenges or the
//! session epoch never reaches storage.
//!
//! Restoring re-checks every invariant the store relies on. A record that
//! fails any check is treated as corrupted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use gloomling_core::{Inventory, NarrativeLog, PetState, Vitals};
use gloomling_types::{
    DailyCounters, LogEntry, Offering, PetIdentity, PetStats, Stage, UserSettings,
};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Schema version written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One versioned record describing a whole pet session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    /// Schema version.
    pub version: u32,
    /// `None` for an uninitialized session.
    pub identity: Option<PetIdentity>,
    /// Hunger, sanity, corruption.
    pub stats: PetStats,
    /// Evolutionary stage.
    pub stage: Stage,
    /// Age in game-minutes.
    pub age: u64,
    /// Held offerings, kinds included.
    pub inventory: Vec<Offering>,
    /// Narrative log, oldest first.
    pub logs: Vec<LogEntry>,
    /// Feed and day counters.
    pub counters: DailyCounters,
    /// False once the pet has collapsed.
    pub is_alive: bool,
    /// Wall-clock time of the last committed tick.
    pub last_tick_at: DateTime<Utc>,
    /// Player preferences.
    pub settings: UserSettings,
}

impl PersistedSnapshot {
    /// Capture the persistable part of `state`.
    pub fn capture(state: &PetState) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            identity: state.identity.clone(),
            stats: state.vitals.stats,
            stage: state.vitals.stage,
            age: state.vitals.age,
            inventory: state.inventory.items().to_vec(),
            logs: state.log.to_vec(),
            counters: state.vitals.counters,
            is_alive: state.vitals.is_alive,
            last_tick_at: state.last_tick_at,
            settings: state.settings.clone(),
        }
    }

    /// Drop all but the newest `keep` log entries.
    pub fn trim_logs(&mut self, keep: usize) {
        let excess = self.logs.len().saturating_sub(keep);
        self.logs.drain(..excess);
    }

    /// Serialize to the stored JSON form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored record. Does not validate; see [`Self::restore`].
    pub fn decode(raw: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Check every invariant a restored state must satisfy.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if !self.stats.is_within_bounds() {
            return Err(SnapshotError::StatsOutOfBounds);
        }
        if let Some(identity) = &self.identity {
            identity.validate()?;
        } else if !self.inventory.is_empty() {
            return Err(SnapshotError::OrphanedState);
        }
        if self.settings.volume > 100 {
            return Err(SnapshotError::VolumeOutOfRange(self.settings.volume));
        }
        let mut seen = HashSet::with_capacity(self.logs.len());
        for entry in &self.logs {
            if !seen.insert(entry.id) {
                return Err(SnapshotError::DuplicateLogEntry(entry.id));
            }
        }
        Ok(())
    }

    /// Validate and rebuild the in-memory state.
    ///
    /// Logs beyond `log_capacity` are dropped oldest first.
    pub fn restore(self, log_capacity: usize) -> Result<PetState, SnapshotError> {
        self.validate()?;
        let inventory = Inventory::from_items(self.inventory)?;
        Ok(PetState {
            identity: self.identity,
            vitals: Vitals {
                stats: self.stats,
                stage: self.stage,
                age: self.age,
                counters: self.counters,
                is_alive: self.is_alive,
            },
            inventory,
            log: NarrativeLog::from_entries(self.logs, log_capacity),
            last_tick_at: self.last_tick_at,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gloomling_types::{Archetype, LogSource, OfferingId, OfferingKind};
    use rust_decimal_macros::dec;

    use super::*;

    fn living_state() -> PetState {
        let mut state = PetState::fresh(200, UserSettings::default(), Utc::now());
        state.identity = PetIdentity::new("Mote", Archetype::Specter, 0x33_4455).ok();
        state.vitals.stats.hunger = dec!(12.35);
        state.vitals.stats.corruption = dec!(40);
        state.vitals.stage = Stage::Baby;
        state.vitals.age = 77;
        state.vitals.counters.daily_feeds = 2;
        state.log.push("hello", LogSource::System, 0, false);
        state.log.push("...", LogSource::Pet, 3, true);
        let _ = state.inventory.push(Offering {
            id: OfferingId::new(),
            kind: OfferingKind::Rot,
            description: "grey".to_owned(),
            icon: "x".to_owned(),
        });
        state
    }

    #[test]
    fn restore_returns_the_captured_state() {
        let state = living_state();
        let raw = PersistedSnapshot::capture(&state).encode().unwrap();
        let restored = PersistedSnapshot::decode(&raw).unwrap().restore(200).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn trim_keeps_the_newest_entries() {
        let mut state = living_state();
        for i in 0..10 {
            state.log.push(format!("line {i}"), LogSource::System, i, false);
        }
        let mut snapshot = PersistedSnapshot::capture(&state);
        snapshot.trim_logs(3);
        let texts: Vec<_> = snapshot.logs.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["line 7", "line 8", "line 9"]);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut snapshot = PersistedSnapshot::capture(&living_state());
        snapshot.version = 99;
        assert!(matches!(
            snapshot.restore(200),
            Err(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn out_of_bounds_stats_are_rejected() {
        let mut snapshot = PersistedSnapshot::capture(&living_state());
        snapshot.stats.sanity = dec!(-1);
        assert!(matches!(snapshot.restore(200), Err(SnapshotError::StatsOutOfBounds)));
    }

    #[test]
    fn overfull_inventory_is_rejected() {
        let mut snapshot = PersistedSnapshot::capture(&living_state());
        let extra = snapshot.inventory.first().cloned().unwrap();
        for _ in 0..3 {
            snapshot.inventory.push(Offering {
                id: OfferingId::new(),
                ..extra.clone()
            });
        }
        assert!(matches!(snapshot.restore(200), Err(SnapshotError::Inventory(_))));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut snapshot = PersistedSnapshot::capture(&living_state());
        let first = snapshot.logs.first().cloned().unwrap();
        snapshot.logs.push(first);
        assert!(matches!(
            snapshot.clone().restore(200),
            Err(SnapshotError::DuplicateLogEntry(_))
        ));

        let mut snapshot = PersistedSnapshot::capture(&living_state());
        let item = snapshot.inventory.first().cloned().unwrap();
        snapshot.inventory.push(item);
        assert!(matches!(snapshot.restore(200), Err(SnapshotError::Inventory(_))));
    }

    #[test]
    fn blank_identity_is_rejected() {
        let mut snapshot = PersistedSnapshot::capture(&living_state());
        if let Some(identity) = snapshot.identity.as_mut() {
            identity.name = "   ".to_owned();
        }
        assert!(matches!(snapshot.restore(200), Err(SnapshotError::Identity(_))));
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(
            PersistedSnapshot::decode("{not json"),
            Err(SnapshotError::Parse(_))
        ));
        assert!(PersistedSnapshot::decode("{\"version\":1}").is_err());
    }

    #[test]
    fn uninitialized_session_round_trips() {
        let state = PetState::fresh(200, UserSettings::default(), Utc::now());
        let restored = PersistedSnapshot::capture(&state).restore(200).unwrap();
        assert_eq!(restored, state);
    }
}
