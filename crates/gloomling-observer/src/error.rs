//! Error types for the HTTP API.
//!
//! [`ObserverError`] covers malformed input only. Gameplay no-ops (unknown
//! offering, full inventory, no living pet) are ordinary `200` outcomes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gloomling_types::{IdentityError, ParseArchetypeError};

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The pet identity was rejected.
    #[error("invalid pet: {0}")]
    Identity(#[from] IdentityError),

    /// The archetype is not one of the known variants.
    #[error("invalid pet: {0}")]
    Archetype(#[from] ParseArchetypeError),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, axum::Json(body)).into_response()
    }
}
