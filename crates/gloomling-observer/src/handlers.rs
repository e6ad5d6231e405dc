//! Endpoint handlers for the pet API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/pet` | Current pet view |
//! | `POST` | `/api/pet` | Create a pet |
//! | `POST` | `/api/pet/reset` | Discard the pet |
//! | `POST` | `/api/pet/scavenge` | Look for an offering |
//! | `POST` | `/api/pet/feed/{id}` | Eat an offering |
//! | `GET` | `/api/logs` | Newest narrative log entries |
//! | `PUT` | `/api/settings` | Replace player settings |
//! | `GET` | `/api/scheduler` | Tick timer status |
//! | `POST` | `/api/scheduler/start` | Start the tick timer |
//! | `POST` | `/api/scheduler/stop` | Stop the tick timer |

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use gloomling_types::{Archetype, OfferingId, PetIdentity, UserSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default number of entries returned by `GET /api/logs`.
const DEFAULT_LOG_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/pet`.
#[derive(Debug, Deserialize)]
pub struct CreatePetRequest {
    /// Display name, 1 to 50 characters after trimming.
    pub name: String,
    /// `GLOOM`, `SPECTER` or `HUSK`, any case.
    pub archetype: String,
    /// 24-bit RGB color.
    pub color: u32,
}

/// Query parameters for `GET /api/logs`.
#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Maximum entries to return (default 50).
    pub limit: Option<usize>,
}

/// Body of the scheduler endpoints.
#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    /// Whether the timer is running.
    pub running: bool,
    /// Whether this request changed the running state.
    pub changed: bool,
    /// Real milliseconds per tick.
    pub interval_ms: u64,
    /// Ticks fired so far.
    pub fired: u64,
    /// Ticks that failed or panicked.
    pub failed: u64,
}

impl SchedulerStatus {
    fn read(state: &AppState, changed: bool) -> Self {
        let scheduler = &state.scheduler;
        Self {
            running: scheduler.is_running(),
            changed,
            interval_ms: scheduler.clock().interval_ms(),
            fired: scheduler.fired(),
            failed: scheduler.failed(),
        }
    }
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the pet's vitals and the API routes.
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.store.view();
    let name = view
        .identity
        .as_ref()
        .map_or_else(|| String::from("(no pet)"), |i| escape_html(&i.name));
    let status = match (view.identity.is_some(), view.is_alive) {
        (false, _) => "EMPTY",
        (true, true) => "ALIVE",
        (true, false) => "DEAD",
    };
    let ticking = if state.scheduler.is_running() { "running" } else { "stopped" };
    let stage = view.stage;
    let hunger = view.hunger.round_dp(1);
    let sanity = view.sanity.round_dp(1);
    let age = view.age;
    let held = view.inventory.len();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Gloomling</title>
    <style>
        body {{
            background: #0b0a10;
            color: #c9c3d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 720px;
            margin: 0 auto;
        }}
        h1 {{ color: #9a7fd1; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #6e6880; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #15131d;
            border: 1px solid #2c2838;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 100px;
        }}
        .metric .label {{ color: #6e6880; font-size: 0.85rem; }}
        .metric .value {{ color: #9a7fd1; font-size: 1.5rem; font-weight: bold; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>{name}</h1>
    <p class="subtitle">{status} &middot; scheduler {ticking}</p>
    <div>
        <div class="metric"><div class="label">Stage</div><div class="value">{stage}</div></div>
        <div class="metric"><div class="label">Hunger</div><div class="value">{hunger}</div></div>
        <div class="metric"><div class="label">Sanity</div><div class="value">{sanity}</div></div>
        <div class="metric"><div class="label">Age</div><div class="value">{age}</div></div>
        <div class="metric"><div class="label">Held</div><div class="value">{held}</div></div>
    </div>
    <h3>API</h3>
    <ul>
        <li>GET /api/pet</li>
        <li>POST /api/pet</li>
        <li>POST /api/pet/reset</li>
        <li>POST /api/pet/scavenge</li>
        <li>POST /api/pet/feed/{{id}}</li>
        <li>GET /api/logs?limit=N</li>
        <li>PUT /api/settings</li>
        <li>GET /api/scheduler</li>
        <li>POST /api/scheduler/start</li>
        <li>POST /api/scheduler/stop</li>
    </ul>
</body>
</html>"#
    ))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Pet
// ---------------------------------------------------------------------------

/// Return the current pet view.
pub async fn get_pet(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.view())
}

/// Create a pet, replacing any existing one.
pub async fn create_pet(
    State(state): State<AppState>,
    Json(body): Json<CreatePetRequest>,
) -> Result<impl IntoResponse, ObserverError> {
    let archetype: Archetype = body.archetype.parse()?;
    let identity = PetIdentity::new(&body.name, archetype, body.color)?;
    let view = state.store.initialize_pet(identity);
    Ok((StatusCode::CREATED, Json(view)))
}

/// Discard the pet. Settings survive.
pub async fn reset_pet(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.reset())
}

/// Look for an offering. Waits for its description.
pub async fn scavenge(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.store.scavenge().await;
    debug!(?outcome, "scavenge request");
    Json(outcome)
}

/// Eat the offering with the given id.
pub async fn feed(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = OfferingId::from(parse_uuid(&id_str)?);
    Ok(Json(state.store.feed(id)))
}

// ---------------------------------------------------------------------------
// Logs and settings
// ---------------------------------------------------------------------------

/// Return the newest log entries, oldest first.
///
/// # Query Parameters
///
/// - `limit`: 1 or more (default 50)
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    if limit == 0 {
        return Err(ObserverError::InvalidQuery("limit must be at least 1".to_owned()));
    }
    let logs = state.store.recent_logs(limit);
    Ok(Json(serde_json::json!({
        "count": logs.len(),
        "logs": logs,
    })))
}

/// Replace the player settings. Volume above 100 is clamped.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<UserSettings>,
) -> impl IntoResponse {
    Json(state.store.update_settings(settings))
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Report whether the tick timer is running.
pub async fn scheduler_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(SchedulerStatus::read(&state, false))
}

/// Start the tick timer. Starting a running timer changes nothing.
pub async fn start_scheduler(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.start_ticking();
    Json(SchedulerStatus::read(&state, changed))
}

/// Stop the tick timer.
pub async fn stop_scheduler(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.scheduler.stop();
    Json(SchedulerStatus::read(&state, changed))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID string, returning an [`ObserverError::InvalidUuid`] on failure.
fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
