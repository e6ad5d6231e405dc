//! Error types for the engine binary.
//!
//! [`EngineBinError`] covers startup only. Once the pet is running nothing
//! is fatal except the HTTP server failing.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineBinError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gloomling_core::ConfigError,
    },

    /// The narrative client could not be built.
    #[error("narrative error: {source}")]
    Narrative {
        /// The underlying narrative error.
        #[from]
        source: gloomling_narrative::NarrativeError,
    },

    /// The log filter directive is invalid.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },

    /// The HTTP server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: gloomling_observer::ServerError,
    },
}
