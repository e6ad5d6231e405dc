//! Narrative prompt rendering via `minijinja`.
//!
//! Templates are compiled into the binary; they are short and tuning them
//! is a code change. A render failure never blocks an action: callers use
//! [`PromptEngine::render_or_fallback`], which logs and substitutes a plain
//! prompt.

use gloomling_types::{OfferingKind, PetIdentity, Stage};
use minijinja::Environment;
use rust_decimal::Decimal;
use serde::Serialize;

/// Errors that can occur while rendering a prompt.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Template registration or rendering failed.
    #[error("prompt template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Which situation a prompt describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Describe a freshly found offering.
    Scavenge,
    /// The pet reacts to eating.
    Feed,
    /// The pet reacts to changing stage.
    Evolution,
}

impl PromptKind {
    const fn template_name(self) -> &'static str {
        match self {
            Self::Scavenge => "scavenge",
            Self::Feed => "feed",
            Self::Evolution => "evolution",
        }
    }

    const fn fallback(self) -> &'static str {
        match self {
            Self::Scavenge => "Describe a strange object found in the dark, in one sentence.",
            Self::Feed => "In one short line, voice a small creature that has just eaten.",
            Self::Evolution => "In one short line, voice a small creature that has just changed.",
        }
    }
}

const SCAVENGE_TEMPLATE: &str = "\
You write item descriptions for a bleak little creature named {{ name }} ({{ archetype }}).
It has just dragged something back from the dark.
{% if kind == \"PURITY\" %}The thing is faintly clean and calming.{% else %}The thing is quietly rotten and wrong.{% endif %}
Describe it in one eerie sentence under 20 words. Never state whether it is good or bad.";

const FEED_TEMPLATE: &str = "\
You are {{ name }}, a {{ stage }} {{ archetype }} creature.
You just ate: {{ description }}.
Hunger {{ hunger }}/100. Sanity {{ sanity }}/100.
{% if overfed %}You have eaten far too much today and it hurts.{% endif %}
Reply with one short line in your own unsettling voice.";

const EVOLUTION_TEMPLATE: &str = "\
You are {{ name }}, a {{ archetype }} creature that has just become {{ stage }}.
Hunger {{ hunger }}/100. Sanity {{ sanity }}/100.
{% if stage == \"ABOMINATION\" %}Something inside you has curdled for good.{% endif %}
Reply with one short line about how your new body feels.";

/// Values available to every template.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// Pet name.
    pub name: String,
    /// Archetype name.
    pub archetype: String,
    /// Stage string.
    pub stage: String,
    /// Rounded hunger.
    pub hunger: String,
    /// Rounded sanity.
    pub sanity: String,
    /// Hidden offering kind, for scavenge prompts.
    pub kind: Option<&'static str>,
    /// Offering description, for feed prompts.
    pub description: Option<String>,
    /// Whether the daily allowance was exceeded.
    pub overfed: bool,
}

impl PromptContext {
    /// Context for the given pet.
    pub fn new(identity: &PetIdentity, stage: Stage, hunger: Decimal, sanity: Decimal) -> Self {
        Self {
            name: identity.name.clone(),
            archetype: identity.archetype.as_str().to_owned(),
            stage: stage.as_str().to_owned(),
            hunger: hunger.round_dp(0).to_string(),
            sanity: sanity.round_dp(0).to_string(),
            kind: None,
            description: None,
            overfed: false,
        }
    }

    /// Attach the hidden kind of an offering being described.
    #[must_use]
    pub fn with_kind(mut self, kind: OfferingKind) -> Self {
        self.kind = Some(kind.as_str());
        self
    }

    /// Attach the description of an offering being eaten.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the feed as past the daily allowance.
    #[must_use]
    pub fn with_overfed(mut self, overfed: bool) -> Self {
        self.overfed = overfed;
        self
    }
}

/// Compiled prompt templates.
#[derive(Debug)]
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Compile the built-in templates.
    pub fn new() -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.add_template(PromptKind::Scavenge.template_name(), SCAVENGE_TEMPLATE)?;
        env.add_template(PromptKind::Feed.template_name(), FEED_TEMPLATE)?;
        env.add_template(PromptKind::Evolution.template_name(), EVOLUTION_TEMPLATE)?;
        Ok(Self { env })
    }

    /// An engine with no templates. Every render falls back.
    pub fn empty() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Render the template for `kind`.
    pub fn render(&self, kind: PromptKind, context: &PromptContext) -> Result<String, PromptError> {
        let text = self
            .env
            .get_template(kind.template_name())?
            .render(context)?;
        Ok(text.trim().to_owned())
    }

    /// Render, or log and return a generic prompt for `kind`.
    pub fn render_or_fallback(&self, kind: PromptKind, context: &PromptContext) -> String {
        match self.render(kind, context) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(prompt = kind.template_name(), error = %e, "prompt render failed, using fallback");
                kind.fallback().to_owned()
            }
        }
    }
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!(error = %e, "built-in prompt templates failed to compile");
            Self::empty()
        })
    }
}
