//! Core entity structs for the Gloomling simulation.
//!
//! Covers the pet's identity, stats, offerings, narrative log entries,
//! daily counters, user settings, and the [`PetView`] projection handed to
//! the presentation layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Archetype, LogSource, OfferingKind, Stage};
use crate::ids::{LogEntryId, OfferingId};

/// Maximum pet name length, in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 50;

/// Largest valid 24-bit RGB color.
pub const MAX_COLOR: u32 = 0x00FF_FFFF;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Errors raised when building a [`PetIdentity`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The name was empty once surrounding whitespace was removed.
    #[error("pet name must not be empty")]
    EmptyName,

    /// The trimmed name exceeded [`MAX_NAME_CHARS`].
    #[error("pet name is {length} characters, limit is {MAX_NAME_CHARS}")]
    NameTooLong {
        /// Character count of the trimmed name.
        length: usize,
    },

    /// The color does not fit in 24 bits.
    #[error("color {0:#x} is not a 24-bit RGB value")]
    InvalidColor(u32),
}

/// Who the pet is. Immutable until the next reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PetIdentity {
    /// Display name, trimmed, 1 to 50 characters.
    pub name: String,
    /// Cosmetic variant.
    pub archetype: Archetype,
    /// 24-bit RGB color.
    pub color: u32,
}

impl PetIdentity {
    /// Build an identity, trimming the name and enforcing its bounds.
    pub fn new(name: &str, archetype: Archetype, color: u32) -> Result<Self, IdentityError> {
        let identity = Self {
            name: name.trim().to_owned(),
            archetype,
            color,
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Check the invariants on an identity that did not come through
    /// [`PetIdentity::new`] (e.g. one read back from storage).
    pub fn validate(&self) -> Result<(), IdentityError> {
        let length = self.name.trim().chars().count();
        if length == 0 {
            return Err(IdentityError::EmptyName);
        }
        if length > MAX_NAME_CHARS {
            return Err(IdentityError::NameTooLong { length });
        }
        if self.color > MAX_COLOR {
            return Err(IdentityError::InvalidColor(self.color));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// The pet's three stats, each kept within 0 to 100.
///
/// Values are exact decimals so that a long offline jump and the same span
/// ticked minute by minute land on identical numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PetStats {
    /// Rises with time, lowered by feeding.
    #[ts(as = "String")]
    pub hunger: Decimal,
    /// Falls with time, raised by pure offerings.
    #[ts(as = "String")]
    pub sanity: Decimal,
    /// Hidden. Only offerings move it.
    #[ts(as = "String")]
    pub corruption: Decimal,
}

impl PetStats {
    /// Stats of a newly created pet: `{hunger: 0, sanity: 100, corruption: 0}`.
    pub const fn newborn() -> Self {
        Self {
            hunger: Decimal::ZERO,
            sanity: Decimal::ONE_HUNDRED,
            corruption: Decimal::ZERO,
        }
    }

    /// Whether every stat lies within the closed range 0 to 100.
    pub fn is_within_bounds(&self) -> bool {
        [self.hunger, self.sanity, self.corruption]
            .iter()
            .all(|v| *v >= Decimal::ZERO && *v <= Decimal::ONE_HUNDRED)
    }
}

impl Default for PetStats {
    fn default() -> Self {
        Self::newborn()
    }
}

// ---------------------------------------------------------------------------
// Offerings
// ---------------------------------------------------------------------------

/// A consumable item found by scavenging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offering {
    /// Unique id used by `feed`.
    pub id: OfferingId,
    /// Hidden nature. Never sent to the presentation layer.
    pub kind: OfferingKind,
    /// Text from the narrative collaborator.
    pub description: String,
    /// Display glyph, chosen independently of `kind`.
    pub icon: String,
}

/// An [`Offering`] as the presentation layer sees it: no kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OfferingView {
    /// Unique id used by `feed`.
    pub id: OfferingId,
    /// Text from the narrative collaborator.
    pub description: String,
    /// Display glyph.
    pub icon: String,
}

impl From<&Offering> for OfferingView {
    fn from(offering: &Offering) -> Self {
        Self {
            id: offering.id,
            description: offering.description.clone(),
            icon: offering.icon.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Narrative log
// ---------------------------------------------------------------------------

/// One line in the narrative log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEntry {
    /// Address used by asynchronous text patches.
    pub id: LogEntryId,
    /// Current text. A placeholder while `pending` is set.
    pub text: String,
    /// Who the line belongs to.
    pub source: LogSource,
    /// Pet age in game-minutes when the entry was created.
    pub timestamp: u64,
    /// True while asynchronous text is still expected.
    pub pending: bool,
}

// ---------------------------------------------------------------------------
// Counters and settings
// ---------------------------------------------------------------------------

/// Per-day bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DailyCounters {
    /// Offerings consumed since the last day boundary.
    pub daily_feeds: u32,
    /// Number of day boundaries crossed since creation.
    pub game_day: u64,
}

/// Player preferences. Persisted and kept across resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserSettings {
    /// Whether audio cues are forwarded at all.
    pub audio_enabled: bool,
    /// Playback volume, 0 to 100.
    pub volume: u8,
    /// Whether narrative text is requested for log placeholders.
    pub narrative_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            audio_enabled: true,
            volume: 70,
            narrative_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Presentation projection
// ---------------------------------------------------------------------------

/// Everything the presentation layer may read about the pet.
///
/// Corruption and offering kinds are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PetView {
    /// `None` until a pet has been created.
    pub identity: Option<PetIdentity>,
    /// Current stage.
    pub stage: Stage,
    /// Current hunger, 0 to 100.
    #[ts(as = "String")]
    pub hunger: Decimal,
    /// Current sanity, 0 to 100.
    #[ts(as = "String")]
    pub sanity: Decimal,
    /// Age in game-minutes.
    pub age: u64,
    /// Feeds since the last day boundary.
    pub daily_feeds: u32,
    /// Days lived.
    pub game_day: u64,
    /// False once the pet has collapsed.
    pub is_alive: bool,
    /// True while a scavenge is waiting on the narrative collaborator.
    pub is_scavenging: bool,
    /// Held offerings, oldest first.
    pub inventory: Vec<OfferingView>,
    /// Narrative log, oldest first.
    pub logs: Vec<LogEntry>,
    /// Player preferences.
    pub settings: UserSettings,
}
