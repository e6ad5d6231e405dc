//! The state store: single owner of the pet and its only mutation point.
//!
//! Every action follows the same shape:
//!
//! 1. Take the state lock
//! 2. Compute the whole next state from the current one (engine, economy)
//! 3. Commit it, append any log lines, and persist synchronously
//! 4. Release the lock, then hand narrative and audio work to the dispatcher
//!
//! The lock is a plain [`std::sync::Mutex`] and is never held across an
//! `.await`. The only action that waits on a collaborator, [`PetStore::scavenge`],
//! rolls its offering under the lock, releases it while the description is
//! generated, and re-validates before committing.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use gloomling_types::{
    CueEvent, LogEntry, LogEntryId, LogSource, OfferingId, OfferingView, PetIdentity, PetView, Stage,
    UserSettings,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::clock::GameClock;
use crate::dispatch::{EventSender, StoreEvent};
use crate::economy::{apply_offering, roll_offering};
use crate::engine::{CriticalEvent, EngineError, detect_critical, step};
use crate::evolution::StageTransition;
use crate::log::{birth_line, death_line, evolution_line};
use crate::narrative::{
    CuePayload, FALLBACK_DESCRIPTIONS, FALLBACK_TEXT, NarrativeRequest, NarrativeSource,
};
use crate::prompts::{PromptContext, PromptEngine, PromptKind};
use crate::rules::DEFAULT_LOG_CAPACITY;
use crate::state::PetState;
use crate::vitals::Vitals;

// ---------------------------------------------------------------------------
// Configuration and ports
// ---------------------------------------------------------------------------

/// Store construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Scheduler cadence; decides minutes advanced per tick.
    pub clock: GameClock,
    /// Narrative log ring-buffer size.
    pub log_capacity: usize,
    /// Seed for the offering RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            clock: GameClock::default(),
            log_capacity: DEFAULT_LOG_CAPACITY,
            seed: None,
        }
    }
}

/// What a [`StateSink`] did with a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Written as-is.
    Saved,
    /// Written after dropping all but the newest `kept` log entries.
    SavedAfterTrim {
        /// Entries that fit.
        kept: usize,
    },
    /// Not written. The sink has already logged why.
    Failed,
}

/// Synchronous persistence hook called after every commit.
pub trait StateSink: Send + Sync {
    /// Persist `state`. Must not panic; report failure through the outcome.
    fn persist(&self, state: &PetState) -> PersistOutcome;
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Errors a tick can produce.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The engine refused the step.
    #[error("engine step failed: {0}")]
    Engine(#[from] EngineError),

    /// The tick panicked and was caught by the scheduler.
    #[error("tick panicked: {0}")]
    Panicked(String),
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Game-minutes applied. Zero for an idle tick.
    pub minutes: u64,
    /// Stage change, if any.
    pub transition: Option<StageTransition>,
    /// Critical crossings, in detection order.
    pub critical: Vec<CriticalEvent>,
    /// True if the pet collapsed on this tick.
    pub died: bool,
}

/// Result of [`PetStore::scavenge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScavengeOutcome {
    /// An offering was added.
    Found {
        /// The new offering, kind hidden.
        offering: OfferingView,
    },
    /// Inventory was already at capacity.
    InventoryFull,
    /// No living pet.
    Inactive,
    /// The pet was reset or replaced while the description was generated.
    Discarded,
}

/// Result of [`PetStore::feed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FeedOutcome {
    /// The offering was eaten.
    Fed {
        /// True if the daily allowance was exceeded.
        overfed: bool,
        /// Stage after feeding.
        stage: Stage,
    },
    /// No offering with that id is held.
    UnknownOffering,
    /// No living pet.
    Inactive,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Single source of truth for one pet.
///
/// Construct one per session and share it behind an [`Arc`]. Several stores
/// can coexist; nothing here is global.
pub struct PetStore {
    state: Mutex<PetState>,
    config: StoreConfig,
    narrative: Arc<dyn NarrativeSource>,
    prompts: PromptEngine,
    events: EventSender,
    sink: Option<Arc<dyn StateSink>>,
    rng: Mutex<StdRng>,
    epoch: AtomicU64,
    pending_scavenges: AtomicUsize,
}

impl std::fmt::Debug for PetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PetStore")
            .field("config", &self.config)
            .field("epoch", &self.epoch)
            .field("pending_scavenges", &self.pending_scavenges)
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight scavenge counter however the scavenge ends.
struct ScavengeGuard<'a>(&'a AtomicUsize);

impl Drop for ScavengeGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PetStore {
    /// Build a store around an initial state.
    pub fn new(
        config: StoreConfig,
        initial: PetState,
        narrative: Arc<dyn NarrativeSource>,
        events: EventSender,
    ) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            state: Mutex::new(initial),
            config,
            narrative,
            prompts: PromptEngine::default(),
            events,
            sink: None,
            rng: Mutex::new(rng),
            epoch: AtomicU64::new(0),
            pending_scavenges: AtomicUsize::new(0),
        }
    }

    /// Attach a persistence sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn StateSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Construction parameters.
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    // -- Actions ------------------------------------------------------------

    /// Create a new pet, replacing whatever existed. Settings are kept.
    pub fn initialize_pet(&self, identity: PetIdentity) -> PetView {
        self.initialize_pet_at(identity, Utc::now())
    }

    /// [`initialize_pet`](Self::initialize_pet) with an explicit wall-clock time.
    pub fn initialize_pet_at(&self, identity: PetIdentity, now: DateTime<Utc>) -> PetView {
        let mut events = Vec::new();
        let view = {
            let mut state = self.lock_state();
            let settings = state.settings.clone();
            *state = PetState::fresh(self.config.log_capacity, settings, now);
            state
                .log
                .push(birth_line(&identity.name, identity.archetype), LogSource::System, 0, false);
            tracing::info!(name = %identity.name, archetype = %identity.archetype, "pet initialized");
            state.identity = Some(identity);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.cue(&state, CueEvent::Hatch, &mut events);
            self.commit(&mut state);
            state.view(self.is_scavenging())
        };
        self.dispatch(events);
        view
    }

    /// Advance the pet by one scheduler period.
    ///
    /// Idle (uninitialized or dead) pets are left alone. Log lines are only
    /// written for stage changes, critical crossings, and death.
    pub fn tick(&self) -> Result<TickReport, TickError> {
        let mut events = Vec::new();
        let report = {
            let mut state = self.lock_state();
            if !state.is_active() {
                return Ok(TickReport::default());
            }
            let previous = state.vitals;
            let outcome = step(&previous, self.config.clock.minutes_per_tick())?;
            state.vitals = outcome.next;
            state.last_tick_at = Utc::now();

            let critical = detect_critical(&previous, &outcome.next);
            self.record_consequences(
                &mut state,
                &critical,
                outcome.transition,
                outcome.died,
                &mut events,
            );
            self.commit(&mut state);

            tracing::debug!(
                age = state.vitals.age,
                hunger = %state.vitals.stats.hunger,
                sanity = %state.vitals.stats.sanity,
                "tick"
            );
            TickReport {
                minutes: outcome.minutes_applied,
                transition: outcome.transition,
                critical,
                died: outcome.died,
            }
        };
        self.dispatch(events);
        Ok(report)
    }

    /// Look for an offering.
    ///
    /// The kind and icon are rolled under the lock; the description is
    /// generated with the lock released. Capacity and session are checked
    /// again before the offering is added.
    pub async fn scavenge(&self) -> ScavengeOutcome {
        let (roll, epoch, request) = {
            let state = self.lock_state();
            if !state.is_active() {
                return ScavengeOutcome::Inactive;
            }
            if state.inventory.is_full() {
                return ScavengeOutcome::InventoryFull;
            }
            let roll = roll_offering(&mut *self.lock_rng());
            let request = if state.settings.narrative_enabled {
                self.prompt_context(&state).map(|ctx| {
                    NarrativeRequest::new(
                        self.prompts
                            .render_or_fallback(PromptKind::Scavenge, &ctx.with_kind(roll.kind)),
                    )
                })
            } else {
                None
            };
            (roll, self.epoch.load(Ordering::SeqCst), request)
        };

        self.pending_scavenges.fetch_add(1, Ordering::SeqCst);
        let guard = ScavengeGuard(&self.pending_scavenges);
        let description = match request {
            Some(request) => {
                let response = self.narrative.generate(request).await;
                if let Some(error) = &response.error {
                    tracing::warn!(error = %error, "offering description fell back");
                }
                response.text
            }
            None => self.fallback_description(),
        };
        drop(guard);

        let mut events = Vec::new();
        let outcome = {
            let mut state = self.lock_state();
            if self.epoch.load(Ordering::SeqCst) != epoch || !state.is_active() {
                tracing::debug!("scavenge result discarded, session changed");
                return ScavengeOutcome::Discarded;
            }
            let offering = roll.into_offering(description);
            let view = OfferingView::from(&offering);
            if state.inventory.push(offering).is_err() {
                return ScavengeOutcome::InventoryFull;
            }
            self.cue(&state, CueEvent::Scavenge, &mut events);
            self.commit(&mut state);
            ScavengeOutcome::Found { offering: view }
        };
        self.dispatch(events);
        outcome
    }

    /// Eat the offering with id `id`.
    pub fn feed(&self, id: OfferingId) -> FeedOutcome {
        let mut events = Vec::new();
        let outcome = {
            let mut state = self.lock_state();
            if !state.is_active() {
                return FeedOutcome::Inactive;
            }
            let Some(offering) = state.inventory.take(id) else {
                return FeedOutcome::UnknownOffering;
            };
            let previous = state.vitals;
            let effect = apply_offering(&previous, offering.kind);
            state.vitals = effect.next;

            if let Some(ctx) = self.prompt_context(&state) {
                let ctx = ctx
                    .with_description(offering.description.as_str())
                    .with_overfed(effect.overfed);
                self.narrate(&mut state, PromptKind::Feed, &ctx, &mut events);
            }
            self.cue(&state, CueEvent::Feed, &mut events);

            let critical = detect_critical(&previous, &effect.next);
            self.record_consequences(&mut state, &critical, effect.transition, false, &mut events);
            self.commit(&mut state);

            tracing::debug!(
                offering = %id,
                overfed = effect.overfed,
                daily_feeds = state.vitals.counters.daily_feeds,
                "fed"
            );
            FeedOutcome::Fed {
                overfed: effect.overfed,
                stage: state.vitals.stage,
            }
        };
        self.dispatch(events);
        outcome
    }

    /// Append a log entry and return its id.
    pub fn add_log(&self, text: impl Into<String>, source: LogSource, pending: bool) -> LogEntryId {
        let mut state = self.lock_state();
        let age = state.vitals.age;
        let id = state.log.push(text, source, age, pending);
        self.commit(&mut state);
        id
    }

    /// Replace the text of entry `id` if it still exists.
    ///
    /// Returns `false` when the entry has been trimmed or the log cleared.
    pub fn update_log_text(&self, id: LogEntryId, text: impl Into<String>) -> bool {
        let mut state = self.lock_state();
        let patched = state.log.patch(id, text);
        if patched {
            self.commit(&mut state);
        }
        patched
    }

    /// Discard the pet. Only settings survive.
    pub fn reset(&self) -> PetView {
        let mut state = self.lock_state();
        let settings = state.settings.clone();
        *state = PetState::fresh(self.config.log_capacity, settings, Utc::now());
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.commit(&mut state);
        tracing::info!("pet reset");
        state.view(self.is_scavenging())
    }

    /// Replace the player settings. Volume is clamped to 100.
    pub fn update_settings(&self, settings: UserSettings) -> UserSettings {
        let mut state = self.lock_state();
        state.settings = UserSettings {
            volume: settings.volume.min(100),
            ..settings
        };
        self.commit(&mut state);
        state.settings.clone()
    }

    /// Persist the current state outside of any action.
    ///
    /// Goes through the same path as an action commit, so a trimmed save
    /// also trims the in-memory log. `None` when no sink is attached.
    pub fn persist_now(&self) -> Option<PersistOutcome> {
        let mut state = self.lock_state();
        self.commit(&mut state)
    }

    // -- Reads --------------------------------------------------------------

    /// A copy of the full state.
    pub fn snapshot(&self) -> PetState {
        self.lock_state().clone()
    }

    /// Presentation projection.
    pub fn view(&self) -> PetView {
        self.lock_state().view(self.is_scavenging())
    }

    /// The newest `limit` log entries, oldest first.
    pub fn recent_logs(&self, limit: usize) -> Vec<LogEntry> {
        self.lock_state().log.recent(limit)
    }

    /// Current vitals.
    pub fn vitals(&self) -> Vitals {
        self.lock_state().vitals
    }

    /// Whether any scavenge is waiting on its description.
    pub fn is_scavenging(&self) -> bool {
        self.pending_scavenges.load(Ordering::SeqCst) > 0
    }

    // -- Internals ----------------------------------------------------------

    fn lock_state(&self) -> MutexGuard<'_, PetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, state: &mut PetState) -> Option<PersistOutcome> {
        let sink = self.sink.as_ref()?;
        let outcome = sink.persist(state);
        if let PersistOutcome::SavedAfterTrim { kept } = outcome {
            let dropped = state.log.trim_to(kept);
            tracing::warn!(kept, dropped, "log trimmed to fit storage");
        }
        Some(outcome)
    }

    fn dispatch(&self, events: Vec<StoreEvent>) {
        for event in events {
            if self.events.send(event).is_err() {
                tracing::debug!("dispatcher gone, dropping store event");
            }
        }
    }

    fn prompt_context(&self, state: &PetState) -> Option<PromptContext> {
        let identity = state.identity.as_ref()?;
        Some(PromptContext::new(
            identity,
            state.vitals.stage,
            state.vitals.stats.hunger,
            state.vitals.stats.sanity,
        ))
    }

    /// Append a PET placeholder and queue the text that will replace it.
    fn narrate(
        &self,
        state: &mut PetState,
        kind: PromptKind,
        ctx: &PromptContext,
        events: &mut Vec<StoreEvent>,
    ) {
        let age = state.vitals.age;
        if !state.settings.narrative_enabled {
            state.log.push(FALLBACK_TEXT, LogSource::Pet, age, false);
            return;
        }
        let entry_id = state.log.push(FALLBACK_TEXT, LogSource::Pet, age, true);
        let prompt = self.prompts.render_or_fallback(kind, ctx);
        events.push(StoreEvent::Narrate {
            entry_id,
            request: NarrativeRequest::new(prompt),
        });
    }

    fn cue(&self, state: &PetState, event: CueEvent, events: &mut Vec<StoreEvent>) {
        if !state.settings.audio_enabled {
            return;
        }
        events.push(StoreEvent::Cue(CuePayload {
            event,
            stage: state.vitals.stage,
            archetype: state.identity.as_ref().map(|i| i.archetype),
            hunger: state.vitals.stats.hunger,
            sanity: state.vitals.stats.sanity,
            volume: state.settings.volume,
        }));
    }

    /// Warnings, evolution, and death lines shared by `tick` and `feed`.
    fn record_consequences(
        &self,
        state: &mut PetState,
        critical: &[CriticalEvent],
        transition: Option<StageTransition>,
        died: bool,
        events: &mut Vec<StoreEvent>,
    ) {
        let age = state.vitals.age;
        let name = state
            .identity
            .as_ref()
            .map_or_else(String::new, |i| i.name.clone());

        for event in critical {
            tracing::info!(event = event.as_str(), "critical threshold crossed");
            state.log.push(event.warning(), LogSource::System, age, false);
        }
        if !critical.is_empty() {
            self.cue(state, CueEvent::Critical, events);
        }

        if let Some(t) = transition {
            tracing::info!(from = %t.from, to = %t.to, "pet evolved");
            state
                .log
                .push(evolution_line(&name, t.to), LogSource::System, age, false);
            if let Some(ctx) = self.prompt_context(state) {
                self.narrate(state, PromptKind::Evolution, &ctx, events);
            }
            self.cue(state, CueEvent::Evolution, events);
        }

        if died {
            tracing::info!(age, "pet died");
            state.log.push(death_line(&name), LogSource::System, age, false);
            self.cue(state, CueEvent::Death, events);
        }
    }

    fn fallback_description(&self) -> String {
        let index = self.lock_rng().random_range(0..FALLBACK_DESCRIPTIONS.len());
        FALLBACK_DESCRIPTIONS
            .get(index)
            .copied()
            .unwrap_or(FALLBACK_TEXT)
            .to_owned()
    }
}
