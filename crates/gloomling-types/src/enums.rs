//! Enumeration types for the Gloomling simulation.
//!
//! Stage strings are part of the presentation contract: consumers rely on
//! exactly `EGG`, `BABY`, `TEEN` and `ABOMINATION`, so every enum here
//! serializes in `SCREAMING_SNAKE_CASE`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Evolutionary phase of the pet.
///
/// Variants are declared in progression order, so the derived [`Ord`]
/// doubles as the monotonicity check: a later state never compares less
/// than an earlier one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Stage {
    /// Freshly created, not yet hatched.
    Egg,
    /// Hatched after five game-minutes.
    Baby,
    /// Reached after a full game-day of life.
    Teen,
    /// Forced by excess corruption. Terminal.
    Abomination,
}

impl Stage {
    /// The exact string exposed to the presentation layer.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Egg => "EGG",
            Self::Baby => "BABY",
            Self::Teen => "TEEN",
            Self::Abomination => "ABOMINATION",
        }
    }

    /// Whether no further transition can leave this stage.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Abomination)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Offering kind
// ---------------------------------------------------------------------------

/// Hidden nature of an offering. Never part of a presentation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferingKind {
    /// Soothes the pet: less hunger, more sanity, less corruption.
    Purity,
    /// Feeds the pet but erodes its mind and corrupts it.
    Rot,
}

impl OfferingKind {
    /// Upper-case name used in prompts and persisted records.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purity => "PURITY",
            Self::Rot => "ROT",
        }
    }
}

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

/// Cosmetic variant chosen at creation. Opaque to the engine rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum Archetype {
    /// A sullen, dripping shape.
    Gloom,
    /// A flickering, half-there shape.
    Specter,
    /// A dry, hollow shape.
    Husk,
}

impl Archetype {
    /// Upper-case name used in prompts and payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gloom => "GLOOM",
            Self::Specter => "SPECTER",
            Self::Husk => "HUSK",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known [`Archetype`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown archetype: {0}")]
pub struct ParseArchetypeError(pub String);

impl FromStr for Archetype {
    type Err = ParseArchetypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GLOOM" => Ok(Self::Gloom),
            "SPECTER" => Ok(Self::Specter),
            "HUSK" => Ok(Self::Husk),
            other => Err(ParseArchetypeError(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Log source
// ---------------------------------------------------------------------------

/// Who a narrative log entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum LogSource {
    /// Mechanical announcements from the engine.
    System,
    /// Lines voiced by the pet itself.
    Pet,
}

// ---------------------------------------------------------------------------
// Audio cue events
// ---------------------------------------------------------------------------

/// Named events forwarded to the audio-selection collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum CueEvent {
    /// A new pet was created.
    Hatch,
    /// The pet changed stage.
    Evolution,
    /// An offering was consumed.
    Feed,
    /// An offering was found.
    Scavenge,
    /// A stat crossed into a critical range.
    Critical,
    /// The pet died.
    Death,
}

impl CueEvent {
    /// Lower-case event name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hatch => "hatch",
            Self::Evolution => "evolution",
            Self::Feed => "feed",
            Self::Scavenge => "scavenge",
            Self::Critical => "critical",
            Self::Death => "death",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_serializes_to_presentation_strings() {
        let json = serde_json::to_string(&Stage::Abomination).ok();
        assert_eq!(json.as_deref(), Some("\"ABOMINATION\""));
        for stage in [Stage::Egg, Stage::Baby, Stage::Teen, Stage::Abomination] {
            let encoded = serde_json::to_string(&stage).unwrap_or_default();
            assert_eq!(encoded, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn stage_order_follows_progression() {
        assert!(Stage::Egg < Stage::Baby);
        assert!(Stage::Baby < Stage::Teen);
        assert!(Stage::Teen < Stage::Abomination);
        assert!(Stage::Abomination.is_terminal());
        assert!(!Stage::Teen.is_terminal());
    }

    #[test]
    fn archetype_parses_case_insensitively() {
        assert_eq!("gloom".parse::<Archetype>(), Ok(Archetype::Gloom));
        assert_eq!(" Husk ".parse::<Archetype>(), Ok(Archetype::Husk));
        assert!("slime".parse::<Archetype>().is_err());
    }

    #[test]
    fn cue_event_names() {
        assert_eq!(CueEvent::Evolution.as_str(), "evolution");
        let json = serde_json::to_string(&CueEvent::Feed).unwrap_or_default();
        assert_eq!(json, "\"feed\"");
    }
}
