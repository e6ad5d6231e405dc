//! Error types for narrative generation.
//!
//! None of these reach the simulation core: the client turns every error
//! into a fallback response. They exist so the retry loop can log what
//! went wrong.

/// Errors that can occur while generating narrative text.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    Backend(String),

    /// The attempt exceeded its deadline.
    #[error("timeout: no response within {timeout_ms} ms")]
    Timeout {
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },

    /// The backend answered with nothing usable.
    #[error("empty completion")]
    Empty,

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}
