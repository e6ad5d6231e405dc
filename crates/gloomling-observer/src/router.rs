//! Axum router construction for the pet API.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router.
///
/// CORS allows any origin so a locally served front end can call the API.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Pet
        .route("/api/pet", get(handlers::get_pet).post(handlers::create_pet))
        .route("/api/pet/reset", post(handlers::reset_pet))
        .route("/api/pet/scavenge", post(handlers::scavenge))
        .route("/api/pet/feed/{id}", post(handlers::feed))
        // Logs and settings
        .route("/api/logs", get(handlers::list_logs))
        .route("/api/settings", put(handlers::update_settings))
        // Scheduler
        .route("/api/scheduler", get(handlers::scheduler_status))
        .route("/api/scheduler/start", post(handlers::start_scheduler))
        .route("/api/scheduler/stop", post(handlers::stop_scheduler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
