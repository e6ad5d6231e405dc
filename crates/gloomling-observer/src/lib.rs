//! HTTP API for the Gloomling pet.
//!
//! A thin Axum layer over [`PetStore`](gloomling_core::PetStore) and its
//! [`Scheduler`](gloomling_core::Scheduler). Handlers call straight into
//! the store; the only validation done here is parsing (ids, names,
//! archetypes), which fails with `400`. Gameplay no-ops come back as
//! tagged outcomes with `200`.
//!
//! Responses expose the [`PetView`](gloomling_types::PetView) projection
//! only, so corruption and offering kinds never leave the process.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
