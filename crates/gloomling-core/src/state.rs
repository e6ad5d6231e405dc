//! The complete mutable state owned by a [`PetStore`](crate::store::PetStore).

use chrono::{DateTime, Utc};
use gloomling_types::{PetIdentity, PetView, UserSettings};

use crate::economy::Inventory;
use crate::log::NarrativeLog;
use crate::vitals::Vitals;

/// Everything that describes one pet session.
///
/// Ephemeral bookkeeping (in-flight scavenges, the session epoch) lives on
/// the store itself and is not part of this struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetState {
    /// `None` until [`initialize_pet`](crate::store::PetStore::initialize_pet).
    pub identity: Option<PetIdentity>,
    /// Stats, stage, age, counters, alive flag.
    pub vitals: Vitals,
    /// Held offerings.
    pub inventory: Inventory,
    /// Narrative log.
    pub log: NarrativeLog,
    /// Wall-clock time of the last committed tick.
    pub last_tick_at: DateTime<Utc>,
    /// Player preferences.
    pub settings: UserSettings,
}

impl PetState {
    /// An uninitialized state with the given settings.
    pub fn fresh(log_capacity: usize, settings: UserSettings, now: DateTime<Utc>) -> Self {
        Self {
            identity: None,
            vitals: Vitals::newborn(),
            inventory: Inventory::new(),
            log: NarrativeLog::new(log_capacity),
            last_tick_at: now,
            settings,
        }
    }

    /// Whether a pet has been created.
    pub const fn is_initialized(&self) -> bool {
        self.identity.is_some()
    }

    /// Whether time and actions affect this pet.
    pub const fn is_active(&self) -> bool {
        self.identity.is_some() && self.vitals.is_alive
    }

    /// Presentation projection. Corruption and offering kinds are left out.
    pub fn view(&self, is_scavenging: bool) -> PetView {
        PetView {
            identity: self.identity.clone(),
            stage: self.vitals.stage,
            hunger: self.vitals.stats.hunger,
            sanity: self.vitals.stats.sanity,
            age: self.vitals.age,
            daily_feeds: self.vitals.counters.daily_feeds,
            game_day: self.vitals.counters.game_day,
            is_alive: self.vitals.is_alive,
            is_scavenging,
            inventory: self.inventory.views(),
            logs: self.log.to_vec(),
            settings: self.settings.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use gloomling_types::{Archetype, Stage};

    use super::*;

    #[test]
    fn fresh_state_is_inactive() {
        let state = PetState::fresh(10, UserSettings::default(), Utc::now());
        assert!(!state.is_initialized());
        assert!(!state.is_active());
        assert_eq!(state.vitals.stage, Stage::Egg);
    }

    #[test]
    fn view_hides_corruption() {
        let mut state = PetState::fresh(10, UserSettings::default(), Utc::now());
        state.identity = PetIdentity::new("Mote", Archetype::Gloom, 0).ok();
        let json = serde_json::to_string(&state.view(false)).unwrap_or_default();
        assert!(json.contains("Mote"));
        assert!(!json.contains("corruption"));
    }
}
