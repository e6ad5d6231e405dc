//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `gloomling.yaml`. Every field has a
//! default, so an empty file (or none at all) yields a working setup. A few
//! environment variables override the file for deployment:
//!
//! - `GLOOMLING_SAVE_DIR` overrides `persistence.directory`
//! - `GLOOMLING_LLM_API_KEY` overrides `narrative.api_key`
//! - `GLOOMLING_OBSERVER_PORT` overrides `observer.port`

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::clock::{ClockError, GameClock};
use crate::rules::DEFAULT_LOG_CAPACITY;
use crate::store::StoreConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The tick interval is unusable.
    #[error("invalid simulation cadence: {0}")]
    Cadence(#[from] ClockError),

    /// Some other value is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `gloomling.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GloomlingConfig {
    /// Cadence, log size, RNG seed.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Where and how snapshots are stored.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Narrative text backend.
    #[serde(default)]
    pub narrative: NarrativeConfig,

    /// HTTP API binding.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GloomlingConfig {
    /// Load, apply environment overrides, and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, and
    /// [`ConfigError::Cadence`] or [`ConfigError::Invalid`] if a value is
    /// out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse from a YAML string, apply environment overrides, and validate.
    ///
    /// # Errors
    ///
    /// As [`GloomlingConfig::from_file`], minus I/O.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply the `GLOOMLING_*` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GLOOMLING_SAVE_DIR") {
            self.persistence.directory = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GLOOMLING_LLM_API_KEY") {
            self.narrative.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("GLOOMLING_OBSERVER_PORT") {
            match val.parse() {
                Ok(port) => self.observer.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring unparseable GLOOMLING_OBSERVER_PORT"),
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cadence`] for a bad tick interval and
    /// [`ConfigError::Invalid`] for a zero log capacity or an unknown
    /// narrative backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        GameClock::new(self.simulation.tick_interval_ms)?;
        if self.simulation.log_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "simulation.log_capacity must be at least 1".to_owned(),
            });
        }
        if !matches!(self.narrative.backend.as_str(), "openai" | "anthropic") {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "narrative.backend must be openai or anthropic, got {}",
                    self.narrative.backend
                ),
            });
        }
        Ok(())
    }

    /// Store parameters derived from the simulation section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cadence`] for a bad tick interval.
    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        Ok(StoreConfig {
            clock: GameClock::new(self.simulation.tick_interval_ms)?,
            log_capacity: self.simulation.log_capacity,
            seed: self.simulation.seed,
        })
    }
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Real milliseconds per tick; a positive multiple of 1000.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Narrative log ring-buffer size.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,

    /// Fixed RNG seed for reproducible offering rolls.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            log_capacity: default_log_capacity(),
            seed: None,
        }
    }
}

/// Snapshot storage parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the snapshot file.
    #[serde(default = "default_save_dir")]
    pub directory: PathBuf,

    /// Storage key (file name) of the snapshot.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Optional byte limit on a single snapshot.
    #[serde(default)]
    pub quota_bytes: Option<u64>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            directory: default_save_dir(),
            storage_key: default_storage_key(),
            quota_bytes: None,
        }
    }
}

/// Narrative backend parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NarrativeConfig {
    /// When false, the offline stub is used.
    #[serde(default)]
    pub enabled: bool,

    /// `openai` or `anthropic`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base URL of the API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Usually supplied by `GLOOMLING_LLM_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-attempt timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Default sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default output token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: default_backend(),
            api_url: default_api_url(),
            model: default_model(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// HTTP API binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` or `pretty`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_save_dir() -> PathBuf {
    PathBuf::from("./save")
}

fn default_storage_key() -> String {
    "gloomling.snapshot".to_owned()
}

fn default_backend() -> String {
    "openai".to_owned()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_owned()
}

fn default_model() -> String {
    "gpt-4o-mini".to_owned()
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_temperature() -> f32 {
    0.9
}

const fn default_max_tokens() -> u32 {
    80
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config = GloomlingConfig::parse("").unwrap();
        assert_eq!(config.simulation.tick_interval_ms, 1000);
        assert_eq!(config.simulation.log_capacity, 200);
        assert_eq!(config.persistence.storage_key, "gloomling.snapshot");
        assert_eq!(config.narrative.timeout_ms, 10_000);
        assert!(!config.narrative.enabled);
    }

    #[test]
    fn partial_yaml_overrides_selected_fields() {
        let yaml = "
simulation:
  tick_interval_ms: 2000
  seed: 42
narrative:
  enabled: true
  backend: anthropic
logging:
  format: json
";
        let config = GloomlingConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, Some(42));
        assert_eq!(config.narrative.backend, "anthropic");
        assert_eq!(config.logging.format, "json");
        let store = config.store_config().unwrap();
        assert_eq!(store.clock.minutes_per_tick(), 2);
    }

    #[test]
    fn fractional_cadence_is_rejected() {
        let result = GloomlingConfig::parse("simulation:\n  tick_interval_ms: 1500\n");
        assert!(matches!(result, Err(ConfigError::Cadence(_))));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = GloomlingConfig::parse("narrative:\n  backend: telepathy\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result = GloomlingConfig::parse("simulation: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }
}
