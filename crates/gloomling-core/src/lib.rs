//! Simulation core for the Gloomling pet.
//!
//! This crate holds the deterministic game-state engine and everything that
//! drives it: the pure decay/evolution step, the feeding economy, the
//! state store with its atomic actions, the tick scheduler, and the ports
//! through which narrative and audio collaborators are reached.
//!
//! # Modules
//!
//! - [`rules`] -- Rates, thresholds, and deltas
//! - [`clock`] -- Real-time to game-time mapping
//! - [`vitals`] -- The engine's working set and clamped arithmetic
//! - [`evolution`] -- Stage rules evaluated to a fixpoint
//! - [`engine`] -- Pure `step` function and critical-crossing detection
//! - [`economy`] -- Inventory, offering rolls, feed deltas
//! - [`log`] -- Bounded narrative log with patch-by-id
//! - [`prompts`] -- `minijinja` narrative prompts
//! - [`narrative`] -- Narrative and audio collaborator ports
//! - [`state`] -- The full mutable pet state
//! - [`store`] -- The state store and its actions
//! - [`dispatch`] -- Background delivery of narrative and audio work
//! - [`scheduler`] -- Fixed-cadence tick timer
//! - [`config`] -- YAML configuration

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod economy;
pub mod engine;
pub mod evolution;
pub mod log;
pub mod narrative;
pub mod prompts;
pub mod rules;
pub mod scheduler;
pub mod state;
pub mod store;
pub mod vitals;

pub use clock::{ClockError, GameClock, elapsed_game_minutes};
pub use config::{ConfigError, GloomlingConfig};
pub use dispatch::{Dispatcher, EventReceiver, EventSender, StoreEvent, event_channel};
pub use economy::{Inventory, InventoryError};
pub use engine::{CriticalEvent, EngineError, StepOutcome, detect_critical, step};
pub use evolution::{StageTransition, evolve};
pub use log::NarrativeLog;
pub use narrative::{
    AudioCue, CueError, CuePayload, NarrativeRequest, NarrativeResponse, NarrativeSource,
    StubNarrative, TracingAudio,
};
pub use scheduler::{Scheduler, Tickable};
pub use state::PetState;
pub use store::{
    FeedOutcome, PersistOutcome, PetStore, ScavengeOutcome, StateSink, StoreConfig, TickError,
    TickReport,
};
pub use vitals::Vitals;
