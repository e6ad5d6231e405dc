//! Shared type definitions for the Gloomling pet simulation.
//!
//! Every crate in the workspace speaks in these types. The ones that reach
//! the presentation layer derive `ts-rs` so their `TypeScript` shapes are
//! generated alongside the Rust ones.
//!
//! # Modules
//!
//! - [`ids`] -- UUID wrappers for offerings and log entries
//! - [`enums`] -- Stage, offering kind, archetype, log source, cue events
//! - [`structs`] -- Identity, stats, offerings, log entries, settings, views

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{Archetype, CueEvent, LogSource, OfferingKind, ParseArchetypeError, Stage};
pub use ids::{LogEntryId, OfferingId};
pub use structs::{
    DailyCounters, IdentityError, LogEntry, MAX_COLOR, MAX_NAME_CHARS, Offering, OfferingView,
    PetIdentity, PetStats, PetView, UserSettings,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::OfferingId::export_all();
        let _ = crate::ids::LogEntryId::export_all();

        // Enums
        let _ = crate::enums::Stage::export_all();
        let _ = crate::enums::Archetype::export_all();
        let _ = crate::enums::LogSource::export_all();
        let _ = crate::enums::CueEvent::export_all();

        // Structs
        let _ = crate::structs::PetIdentity::export_all();
        let _ = crate::structs::PetStats::export_all();
        let _ = crate::structs::OfferingView::export_all();
        let _ = crate::structs::LogEntry::export_all();
        let _ = crate::structs::DailyCounters::export_all();
        let _ = crate::structs::UserSettings::export_all();
        let _ = crate::structs::PetView::export_all();
    }
}
