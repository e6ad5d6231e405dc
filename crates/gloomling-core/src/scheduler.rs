//! Fixed-cadence tick timer.
//!
//! The scheduler owns one background task that calls [`Tickable::tick`]
//! every period. Each firing is isolated: an `Err` is logged at warn, a
//! panic is caught and logged at error, and the loop keeps going. Starting
//! an already running scheduler does nothing, so at most one timer ever
//! drives a target.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::clock::GameClock;
use crate::store::{PetStore, TickError};

/// Anything the scheduler can drive.
pub trait Tickable: Send + Sync + 'static {
    /// Advance one period.
    fn tick(&self) -> Result<(), TickError>;
}

impl Tickable for PetStore {
    fn tick(&self) -> Result<(), TickError> {
        Self::tick(self).map(|_| ())
    }
}

/// Counters shared with the timer task.
#[derive(Debug, Default)]
struct TickCounters {
    fired: AtomicU64,
    failed: AtomicU64,
}

/// Owner of the tick timer.
#[derive(Debug)]
pub struct Scheduler {
    clock: GameClock,
    handle: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<TickCounters>,
}

impl Scheduler {
    /// A stopped scheduler with the given cadence.
    pub fn new(clock: GameClock) -> Self {
        Self {
            clock,
            handle: Mutex::new(None),
            counters: Arc::new(TickCounters::default()),
        }
    }

    /// Cadence in use.
    pub const fn clock(&self) -> GameClock {
        self.clock
    }

    /// Start ticking `target`. Returns `false` if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, target: Arc<dyn Tickable>) -> bool {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            debug!("scheduler already running");
            return false;
        }
        let period = self.clock.interval();
        let counters = Arc::clone(&self.counters);
        *handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the pet should wait a full period.
            interval.tick().await;
            loop {
                interval.tick().await;
                fire(target.as_ref(), &counters);
            }
        }));
        info!(interval_ms = self.clock.interval_ms(), "scheduler started");
        true
    }

    /// Stop the timer. Returns `false` if it was not running.
    pub fn stop(&self) -> bool {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);
        match handle.take() {
            Some(h) => {
                h.abort();
                info!("scheduler stopped");
                true
            }
            None => false,
        }
    }

    /// Whether the timer task is alive.
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Ticks fired since creation.
    pub fn fired(&self) -> u64 {
        self.counters.fired.load(Ordering::Relaxed)
    }

    /// Ticks that returned an error or panicked.
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn fire(target: &dyn Tickable, counters: &TickCounters) {
    counters.fired.fetch_add(1, Ordering::Relaxed);
    let result = match catch_unwind(AssertUnwindSafe(|| target.tick())) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| String::from("unknown panic"));
            error!(panic = %message, "tick panicked");
            Err(TickError::Panicked(message))
        }
    };
    if let Err(e) = result {
        counters.failed.fetch_add(1, Ordering::Relaxed);
        if !matches!(e, TickError::Panicked(_)) {
            warn!(error = %e, "tick failed");
        }
    }
}
