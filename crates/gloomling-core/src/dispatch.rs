//! Fire-and-forget delivery of narrative and audio work.
//!
//! The store queues [`StoreEvent`]s on an unbounded channel after it has
//! committed and released its lock. The [`Dispatcher`] drains the channel
//! and runs every job on its own task, so a slow collaborator never delays
//! the next tick or another job. Generated text is written back through
//! [`PetStore::update_log_text`], which ignores entries that no longer
//! exist. The dispatcher only holds a [`Weak`] handle to the store and
//! stops when the store (and with it the sender) is dropped.

use std::sync::{Arc, Weak};

use gloomling_types::LogEntryId;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::narrative::{AudioCue, CuePayload, NarrativeRequest, NarrativeSource};
use crate::store::PetStore;

/// Work queued by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Generate text and patch it into log entry `entry_id`.
    Narrate {
        /// Placeholder entry to patch.
        entry_id: LogEntryId,
        /// What to ask for.
        request: NarrativeRequest,
    },
    /// Forward an audio cue.
    Cue(CuePayload),
}

/// Store side of the event channel.
pub type EventSender = mpsc::UnboundedSender<StoreEvent>;

/// Dispatcher side of the event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<StoreEvent>;

/// Create a new event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Drains store events into the collaborators.
pub struct Dispatcher {
    store: Weak<PetStore>,
    narrative: Arc<dyn NarrativeSource>,
    audio: Arc<dyn AudioCue>,
}

impl Dispatcher {
    /// A dispatcher writing back into `store`.
    pub fn new(
        store: &Arc<PetStore>,
        narrative: Arc<dyn NarrativeSource>,
        audio: Arc<dyn AudioCue>,
    ) -> Self {
        Self {
            store: Arc::downgrade(store),
            narrative,
            audio,
        }
    }

    /// Run [`Dispatcher::run`] on a background task.
    pub fn spawn(self, events: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Process events until every sender is gone.
    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            match event {
                StoreEvent::Narrate { entry_id, request } => {
                    tokio::spawn(narrate(
                        Weak::clone(&self.store),
                        Arc::clone(&self.narrative),
                        entry_id,
                        request,
                    ));
                }
                StoreEvent::Cue(payload) => {
                    tokio::spawn(play(Arc::clone(&self.audio), payload));
                }
            }
        }
        tracing::info!("event channel closed, dispatcher stopping");
    }
}

async fn narrate(
    store: Weak<PetStore>,
    narrative: Arc<dyn NarrativeSource>,
    entry_id: LogEntryId,
    request: NarrativeRequest,
) {
    let response = narrative.generate(request).await;
    if let Some(error) = &response.error {
        tracing::warn!(entry = %entry_id, error = %error, "narrative fell back");
    }
    let Some(store) = store.upgrade() else {
        tracing::debug!(entry = %entry_id, "store dropped before narrative arrived");
        return;
    };
    if !store.update_log_text(entry_id, response.text) {
        tracing::debug!(entry = %entry_id, "log entry gone, narrative dropped");
    }
}

async fn play(audio: Arc<dyn AudioCue>, payload: CuePayload) {
    if let Err(e) = audio.play(&payload).await {
        tracing::warn!(event = payload.event.as_str(), error = %e, "audio cue failed");
    }
}
