//! Ports to the asynchronous collaborators: narrative text and audio cues.
//!
//! The core never waits on these for a state change. Implementations must
//! absorb their own failures: [`NarrativeSource::generate`] always returns
//! usable text, and a failed [`AudioCue::play`] is logged and forgotten.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gloomling_types::{Archetype, CueEvent, Stage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Text used when no collaborator produced anything.
pub const FALLBACK_TEXT: &str = "...";

/// Descriptions used for offerings when narrative generation is disabled.
pub const FALLBACK_DESCRIPTIONS: &[&str] = &[
    "Something small and damp, wrapped in old thread.",
    "A lump that is warmer than it should be.",
    "A shard of something that once had a face.",
    "A bundle of grey fibres that smells of rain.",
];

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// A request for generated text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    /// Fully rendered prompt.
    pub prompt: String,
    /// Sampling temperature. `None` uses the collaborator default.
    pub temperature: Option<f32>,
    /// Output length cap. `None` uses the collaborator default.
    pub max_tokens: Option<u32>,
}

impl NarrativeRequest {
    /// A request with collaborator defaults.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Generated text, possibly a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeResponse {
    /// Text to show. Never empty.
    pub text: String,
    /// Set when `text` is a fallback, describing what went wrong.
    pub error: Option<String>,
}

impl NarrativeResponse {
    /// A successful response.
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    /// A fallback response carrying the reason.
    pub fn fallback(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: Some(error.into()),
        }
    }
}

/// Produces narrative text.
#[async_trait]
pub trait NarrativeSource: Send + Sync {
    /// Generate text for `request`. Must not fail; return a fallback
    /// with `error` set instead.
    async fn generate(&self, request: NarrativeRequest) -> NarrativeResponse;
}

/// Offline narrative source that cycles through canned lines.
#[derive(Debug, Default)]
pub struct StubNarrative {
    next: AtomicUsize,
}

impl StubNarrative {
    /// A new stub starting at the first line.
    pub const fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NarrativeSource for StubNarrative {
    async fn generate(&self, _request: NarrativeRequest) -> NarrativeResponse {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        let slot = index.checked_rem(FALLBACK_DESCRIPTIONS.len()).unwrap_or(0);
        let text = FALLBACK_DESCRIPTIONS.get(slot).copied().unwrap_or(FALLBACK_TEXT);
        NarrativeResponse::ok(text)
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

/// Errors an audio collaborator may report.
#[derive(Debug, thiserror::Error)]
pub enum CueError {
    /// The sink could not play the cue.
    #[error("audio cue failed: {0}")]
    Playback(String),
}

/// Context sent along with an audio cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CuePayload {
    /// What happened.
    pub event: CueEvent,
    /// Stage after the event.
    pub stage: Stage,
    /// Pet archetype, if a pet exists.
    pub archetype: Option<Archetype>,
    /// Hunger after the event.
    pub hunger: Decimal,
    /// Sanity after the event.
    pub sanity: Decimal,
    /// Player volume, 0 to 100.
    pub volume: u8,
}

/// Selects and plays sounds for named events.
#[async_trait]
pub trait AudioCue: Send + Sync {
    /// Play the cue for `payload`.
    async fn play(&self, payload: &CuePayload) -> Result<(), CueError>;
}

/// Audio sink that only records cues in the trace log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudio;

#[async_trait]
impl AudioCue for TracingAudio {
    async fn play(&self, payload: &CuePayload) -> Result<(), CueError> {
        tracing::debug!(
            event = payload.event.as_str(),
            stage = %payload.stage,
            volume = payload.volume,
            "audio cue"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_cycles_through_lines() {
        let stub = StubNarrative::new();
        let mut seen = Vec::new();
        for _ in 0..=FALLBACK_DESCRIPTIONS.len() {
            let response = stub.generate(NarrativeRequest::new("anything")).await;
            assert!(response.error.is_none());
            seen.push(response.text);
        }
        assert_eq!(seen.first(), seen.last());
    }

    #[tokio::test]
    async fn tracing_audio_accepts_everything() {
        let payload = CuePayload {
            event: CueEvent::Death,
            stage: Stage::Teen,
            archetype: Some(Archetype::Husk),
            hunger: Decimal::ONE_HUNDRED,
            sanity: Decimal::ZERO,
            volume: 40,
        };
        assert!(TracingAudio.play(&payload).await.is_ok());
    }
}
