//! Shared application state for the HTTP API.

use std::sync::Arc;

use gloomling_core::{PetStore, Scheduler, Tickable};

/// Handles every request needs: the pet store and its tick timer.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The pet.
    pub store: Arc<PetStore>,
    /// Timer driving [`PetStore::tick`].
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    /// Bundle a store with the scheduler that drives it.
    pub const fn new(store: Arc<PetStore>, scheduler: Arc<Scheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Start the scheduler on this state's store. `false` if already running.
    pub fn start_ticking(&self) -> bool {
        let target: Arc<dyn Tickable> = Arc::clone(&self.store) as Arc<dyn Tickable>;
        self.scheduler.start(target)
    }
}
