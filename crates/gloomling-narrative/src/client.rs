//! Retrying narrative client.
//!
//! [`NarrativeClient`] adapts a [`Completion`] backend to the core's
//! [`NarrativeSource`] port. Each attempt runs under its own deadline; a
//! failed attempt is retried once, and a second failure yields
//! [`FALLBACK_TEXT`] with the error attached. Nothing here ever returns an
//! error to the store.

use std::time::Duration;

use async_trait::async_trait;
use gloomling_core::config::NarrativeConfig;
use gloomling_core::narrative::{
    FALLBACK_TEXT, NarrativeRequest, NarrativeResponse, NarrativeSource,
};
use tracing::{debug, warn};

use crate::error::NarrativeError;
use crate::llm::{LlmBackend, Sampling, create_backend};

/// Attempts per request: the first call plus one retry.
pub const MAX_ATTEMPTS: u32 = 2;

/// Something that can turn a prompt into raw text.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Produce text for `prompt`.
    async fn complete(&self, prompt: &str, sampling: Sampling) -> Result<String, NarrativeError>;

    /// Name used in log fields.
    fn name(&self) -> &str;
}

#[async_trait]
impl Completion for LlmBackend {
    async fn complete(&self, prompt: &str, sampling: Sampling) -> Result<String, NarrativeError> {
        Self::complete(self, prompt, sampling).await
    }

    fn name(&self) -> &str {
        Self::name(self)
    }
}

/// Narrative source backed by an LLM, with timeout, retry, and fallback.
pub struct NarrativeClient {
    backend: Box<dyn Completion>,
    timeout: Duration,
    defaults: Sampling,
}

impl std::fmt::Debug for NarrativeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeClient")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl NarrativeClient {
    /// Wrap an arbitrary completion backend.
    pub fn new(backend: Box<dyn Completion>, timeout: Duration, defaults: Sampling) -> Self {
        Self {
            backend,
            timeout,
            defaults,
        }
    }

    /// Build a client over the HTTP backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::Config`] for an unknown backend, a missing
    /// API key, or a zero timeout.
    pub fn from_config(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        if config.timeout_ms == 0 {
            return Err(NarrativeError::Config(
                "narrative timeout_ms must be positive".to_owned(),
            ));
        }
        let backend = create_backend(config)?;
        Ok(Self::new(
            Box::new(backend),
            Duration::from_millis(config.timeout_ms),
            Sampling {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            },
        ))
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// One attempt under the per-attempt deadline.
    async fn attempt(&self, prompt: &str, sampling: Sampling) -> Result<String, NarrativeError> {
        let text = tokio::time::timeout(self.timeout, self.backend.complete(prompt, sampling))
            .await
            .map_err(|_elapsed| NarrativeError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        let cleaned = clean_completion(&text);
        if cleaned.is_empty() {
            return Err(NarrativeError::Empty);
        }
        Ok(cleaned)
    }
}

#[async_trait]
impl NarrativeSource for NarrativeClient {
    async fn generate(&self, request: NarrativeRequest) -> NarrativeResponse {
        let sampling = Sampling {
            temperature: request.temperature.unwrap_or(self.defaults.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.defaults.max_tokens),
        };

        let mut last_error = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.attempt(&request.prompt, sampling).await {
                Ok(text) => {
                    debug!(backend = self.backend.name(), attempt, "narrative generated");
                    return NarrativeResponse::ok(text);
                }
                Err(e) => {
                    warn!(
                        backend = self.backend.name(),
                        attempt,
                        error = %e,
                        "narrative attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error.map_or_else(|| "no attempts made".to_owned(), |e| e.to_string());
        warn!(backend = self.backend.name(), reason = %reason, "narrative falling back");
        NarrativeResponse::fallback(FALLBACK_TEXT, reason)
    }
}

/// Trim whitespace and one layer of wrapping quotes from model output.
fn clean_completion(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_owned()
}
