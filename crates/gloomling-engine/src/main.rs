//! Gloomling engine binary.
//!
//! Wires the saved pet, the narrative collaborator, the tick timer, and the
//! HTTP API together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gloomling.yaml` (or `GLOOMLING_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Restore the saved pet and apply offline catch-up
//! 4. Build the narrative collaborator (LLM client or offline stub)
//! 5. Create the store, its dispatcher, and the scheduler
//! 6. Serve the API until shutdown, then save one last time

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use gloomling_core::{
    AudioCue, Dispatcher, GloomlingConfig, NarrativeSource, PersistOutcome, PetStore, Scheduler,
    StateSink, StubNarrative, TracingAudio, event_channel,
};
use gloomling_db::{FileStorage, PersistenceGateway, SnapshotStorage};
use gloomling_narrative::NarrativeClient;
use gloomling_observer::{AppState, ServerConfig, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineBinError;

/// Config file used when `GLOOMLING_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "gloomling.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration.
    let (config, config_path) = load_config()?;

    // 2. Logging.
    init_tracing(&config.logging.level, &config.logging.format)?;
    info!(
        path = %config_path.display(),
        tick_interval_ms = config.simulation.tick_interval_ms,
        narrative = config.narrative.enabled,
        "gloomling-engine starting"
    );

    // 3. Restore the saved pet.
    let store_config = config.store_config().map_err(EngineBinError::from)?;
    let storage: Arc<dyn SnapshotStorage> = Arc::new(FileStorage::new(
        config.persistence.directory.clone(),
        config.persistence.quota_bytes,
    ));
    let gateway = Arc::new(PersistenceGateway::new(
        storage,
        config.persistence.storage_key.clone(),
    ));
    let loaded = gateway.load(Utc::now(), store_config.log_capacity);
    info!(
        source = ?loaded.source,
        caught_up_minutes = loaded.catch_up.map_or(0, |c| c.minutes),
        directory = %config.persistence.directory.display(),
        "pet state loaded"
    );

    // 4. Narrative collaborator.
    let narrative: Arc<dyn NarrativeSource> = if config.narrative.enabled {
        let client = NarrativeClient::from_config(&config.narrative).map_err(EngineBinError::from)?;
        info!(
            backend = client.backend_name(),
            model = config.narrative.model,
            "narrative backend configured"
        );
        Arc::new(client)
    } else {
        info!("narrative backend disabled, using offline lines");
        Arc::new(StubNarrative::new())
    };

    // 5. Store, dispatcher, scheduler.
    let (events_tx, events_rx) = event_channel();
    let sink: Arc<dyn StateSink> = Arc::clone(&gateway) as Arc<dyn StateSink>;
    let store = Arc::new(
        PetStore::new(store_config, loaded.state, Arc::clone(&narrative), events_tx).with_sink(sink),
    );
    log_persist("startup", store.persist_now());

    let audio: Arc<dyn AudioCue> = Arc::new(TracingAudio);
    let dispatcher = Dispatcher::new(&store, narrative, audio).spawn(events_rx);

    let scheduler = Arc::new(Scheduler::new(store_config.clock));
    let app_state = AppState::new(Arc::clone(&store), Arc::clone(&scheduler));
    app_state.start_ticking();

    // 6. Serve until Ctrl-C.
    let server_config = ServerConfig {
        host: config.observer.host.clone(),
        port: config.observer.port,
    };
    let served = start_server(&server_config, app_state, shutdown_signal()).await;

    scheduler.stop();
    dispatcher.abort();
    log_persist("shutdown", store.persist_now());
    info!(
        fired = scheduler.fired(),
        failed = scheduler.failed(),
        "gloomling-engine shutdown complete"
    );

    served.map_err(EngineBinError::from)?;
    Ok(())
}

/// Resolve the config path and load it, falling back to defaults when the
/// file does not exist.
fn load_config() -> Result<(GloomlingConfig, PathBuf), EngineBinError> {
    let path = std::env::var("GLOOMLING_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = if path.exists() {
        GloomlingConfig::from_file(&path)?
    } else {
        GloomlingConfig::parse("")?
    };
    Ok((config, path))
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str, format: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| EngineBinError::Logging {
            message: format!("invalid level {level:?}: {e}"),
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if format.eq_ignore_ascii_case("json") {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("installing json subscriber")?;
    } else {
        builder
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("installing pretty subscriber")?;
    }
    Ok(())
}

/// Report the result of an out-of-band save. Failures were already logged
/// by the gateway.
fn log_persist(phase: &str, outcome: Option<PersistOutcome>) {
    match outcome {
        Some(PersistOutcome::Saved) => info!(phase, "snapshot saved"),
        Some(PersistOutcome::SavedAfterTrim { kept }) => {
            warn!(phase, kept, "snapshot saved after trimming the log");
        }
        Some(PersistOutcome::Failed) => warn!(phase, "snapshot not saved"),
        None => warn!(phase, "no persistence sink attached"),
    }
}

/// Resolves on `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, shutting down");
    }
    info!("shutdown requested");
}
