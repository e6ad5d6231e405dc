//! LLM-backed narrative text for the Gloomling pet.
//!
//! Implements the core's [`NarrativeSource`](gloomling_core::NarrativeSource)
//! port over HTTP. The store never sees an error from this crate: every
//! failure ends in a fallback line.
//!
//! # Modules
//!
//! - [`llm`] -- OpenAI-compatible and Anthropic backends
//! - [`client`] -- Timeout, retry, and fallback around a backend
//! - [`error`] -- Narrative error types

pub mod client;
pub mod error;
pub mod llm;

pub use client::{Completion, MAX_ATTEMPTS, NarrativeClient};
pub use error::NarrativeError;
pub use llm::{LlmBackend, Sampling, create_backend};
