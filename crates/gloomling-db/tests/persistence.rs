//! Integration tests for the persistence gateway wired into a live store.
//!
//! All tests use [`MemoryStorage`] except the last, which goes through the
//! filesystem in a scratch directory.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use gloomling_core::economy::OfferingRoll;
use gloomling_core::{
    EventReceiver, FeedOutcome, PersistOutcome, PetState, PetStore, StateSink, StoreConfig,
    StubNarrative, event_channel,
};
use gloomling_db::{
    DEFAULT_STORAGE_KEY, FileStorage, LoadSource, MemoryStorage, PersistedSnapshot,
    PersistenceGateway, SnapshotStorage,
};
use gloomling_types::{Archetype, LogSource, OfferingKind, PetIdentity, Stage, UserSettings};
use rust_decimal_macros::dec;

fn identity() -> PetIdentity {
    PetIdentity::new("Test", Archetype::Gloom, 0xff_0000).unwrap()
}

fn store_with(gateway: &Arc<PersistenceGateway>, state: PetState) -> (PetStore, EventReceiver) {
    let (tx, rx) = event_channel();
    let config = StoreConfig {
        seed: Some(7),
        ..StoreConfig::default()
    };
    let sink: Arc<dyn StateSink> = Arc::clone(gateway) as Arc<dyn StateSink>;
    let store = PetStore::new(config, state, Arc::new(StubNarrative::new()), tx).with_sink(sink);
    (store, rx)
}

fn memory_gateway(storage: &Arc<MemoryStorage>) -> Arc<PersistenceGateway> {
    let storage: Arc<dyn SnapshotStorage> = Arc::clone(storage) as Arc<dyn SnapshotStorage>;
    Arc::new(PersistenceGateway::new(storage, DEFAULT_STORAGE_KEY))
}

fn stored(storage: &MemoryStorage) -> PersistedSnapshot {
    let raw = storage.read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    PersistedSnapshot::decode(&raw).unwrap()
}

fn fresh(now: DateTime<Utc>) -> PetState {
    PetState::fresh(200, UserSettings::default(), now)
}

#[test]
fn every_action_is_persisted() {
    let storage = Arc::new(MemoryStorage::new());
    let gateway = memory_gateway(&storage);
    let (store, _rx) = store_with(&gateway, fresh(Utc::now()));

    store.initialize_pet(identity());
    assert_eq!(stored(&storage).identity.map(|i| i.name).as_deref(), Some("Test"));

    for _ in 0..5 {
        store.tick().unwrap();
    }
    let snapshot = stored(&storage);
    assert_eq!(snapshot.age, 5);
    assert_eq!(snapshot.stage, Stage::Baby);
    assert_eq!(snapshot.logs.len(), store.view().logs.len());
}

#[test]
fn scenario_d_catch_up_matches_live_ticks() {
    let start = Utc::now();
    let storage = Arc::new(MemoryStorage::new());
    let gateway = memory_gateway(&storage);

    let (offline, _rx) = store_with(&gateway, fresh(start));
    offline.initialize_pet_at(identity(), start);
    drop(offline);

    let loaded = gateway.load(start + TimeDelta::seconds(3600), 200);
    assert_eq!(loaded.source, LoadSource::Restored);
    assert_eq!(loaded.catch_up.map(|c| c.minutes), Some(3600));

    let (tx, _live_rx) = event_channel();
    let live = PetStore::new(
        StoreConfig::default(),
        fresh(start),
        Arc::new(StubNarrative::new()),
        tx,
    );
    live.initialize_pet_at(identity(), start);
    for _ in 0..3600 {
        live.tick().unwrap();
    }

    let jumped = loaded.state.vitals;
    let ticked = live.vitals();
    assert_eq!(jumped.stats.hunger, ticked.stats.hunger);
    assert_eq!(jumped.stats.sanity, ticked.stats.sanity);
    assert_eq!(jumped.age, ticked.age);
    assert_eq!(jumped.counters, ticked.counters);
    assert_eq!(jumped.stage, ticked.stage);
    assert_eq!(jumped.is_alive, ticked.is_alive);
    assert_eq!(jumped.stats.hunger, dec!(100));
    assert_eq!(jumped.stats.sanity, dec!(28));
    assert_eq!(jumped.counters.game_day, 2);

    assert!(
        loaded
            .state
            .log
            .iter()
            .any(|e| e.source == LogSource::System && e.text.starts_with("While you were away"))
    );
}

#[test]
fn scenario_e_corrupted_record_yields_fresh_state() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .write(DEFAULT_STORAGE_KEY, "{\"version\":1,\"identity\":{\"name\":")
        .unwrap();
    let gateway = memory_gateway(&storage);

    let now = Utc::now();
    let loaded = gateway.load(now, 200);

    assert_eq!(loaded.source, LoadSource::Recovered);
    assert_eq!(loaded.state, fresh(now));
    assert!(storage.read(DEFAULT_STORAGE_KEY).unwrap().is_none());
}

#[test]
fn invariant_violations_count_as_corruption() {
    let storage = Arc::new(MemoryStorage::new());
    let gateway = memory_gateway(&storage);
    let now = Utc::now();

    let mut state = fresh(now);
    state.identity = Some(identity());
    let mut snapshot = PersistedSnapshot::capture(&state);
    snapshot.stats.hunger = dec!(140);
    storage
        .write(DEFAULT_STORAGE_KEY, &snapshot.encode().unwrap())
        .unwrap();

    let loaded = gateway.load(now, 200);
    assert_eq!(loaded.source, LoadSource::Recovered);
    assert!(!loaded.state.is_initialized());
}

#[test]
fn quota_failure_trims_logs_in_storage_and_memory() {
    let storage = Arc::new(MemoryStorage::with_quota(25_000));
    let gateway = memory_gateway(&storage);
    let (store, _rx) = store_with(&gateway, fresh(Utc::now()));
    store.initialize_pet(identity());

    let early = store.add_log("...", LogSource::Pet, true);
    let line = "a long, dripping sentence ".repeat(8);
    for _ in 0..120 {
        store.add_log(line.as_str(), LogSource::System, false);
    }

    let in_memory = store.view().logs.len();
    assert!(in_memory >= 50, "kept {in_memory}");
    assert!(in_memory < 120, "kept {in_memory}");
    assert_eq!(stored(&storage).logs.len(), in_memory);

    assert!(!store.update_log_text(early, "too late"));
}

#[test]
fn failed_save_after_trim_keeps_play_going() {
    let storage = Arc::new(MemoryStorage::with_quota(2_000));
    let gateway = memory_gateway(&storage);

    let mut state = fresh(Utc::now());
    state.identity = Some(identity());
    let line = "a long, dripping sentence ".repeat(8);
    for _ in 0..60 {
        state.log.push(line.as_str(), LogSource::System, 0, false);
    }
    let offering = OfferingRoll {
        kind: OfferingKind::Purity,
        icon: "x",
    }
    .into_offering(String::from("a pale stone"));
    let offering_id = offering.id;
    state.inventory.push(offering).unwrap();

    assert_eq!(gateway.save(&state), PersistOutcome::Failed);
    assert!(storage.read(DEFAULT_STORAGE_KEY).unwrap().is_none());

    let (store, _rx) = store_with(&gateway, state);
    let report = store.tick().unwrap();
    assert_eq!(report.minutes, 1);
    assert_eq!(store.view().logs.len(), 60);

    assert!(matches!(store.feed(offering_id), FeedOutcome::Fed { .. }));
    let view = store.view();
    assert!(view.logs.len() > 60, "kept {}", view.logs.len());
    assert_eq!(view.age, 1);
    assert!(view.inventory.is_empty());
    assert!(storage.is_empty());
}

#[test]
fn settings_survive_restart() {
    let storage = Arc::new(MemoryStorage::new());
    let gateway = memory_gateway(&storage);
    let (store, _rx) = store_with(&gateway, fresh(Utc::now()));
    store.update_settings(UserSettings {
        audio_enabled: false,
        volume: 15,
        narrative_enabled: false,
    });
    drop(store);

    let loaded = gateway.load(Utc::now(), 200);
    assert_eq!(loaded.source, LoadSource::Restored);
    assert!(!loaded.state.settings.audio_enabled);
    assert_eq!(loaded.state.settings.volume, 15);
}

#[test]
fn file_backed_gateway_restores_a_pet() {
    let dir = std::env::temp_dir().join(format!("gloomling-gateway-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let storage: Arc<dyn SnapshotStorage> = Arc::new(FileStorage::new(&dir, None));
    let gateway = Arc::new(PersistenceGateway::new(storage, DEFAULT_STORAGE_KEY));

    let now = Utc::now();
    let (store, _rx) = store_with(&gateway, fresh(now));
    store.initialize_pet_at(identity(), now);
    drop(store);

    let loaded = gateway.load(now + TimeDelta::seconds(10), 200);
    assert_eq!(loaded.source, LoadSource::Restored);
    assert_eq!(loaded.state.vitals.age, 10);
    assert_eq!(loaded.state.vitals.stage, Stage::Baby);
    let _ = std::fs::remove_dir_all(&dir);
}
