//! Error types for context operations

use thiserror::Error;

/// Errors during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save configuration")]
    Save(#[source] confy::ConfyError),

    #[error("unknown source '{name}'")]
    UnknownSource { name: String },
}

/// Errors from starting, stopping and addressing source workers
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("source '{name}' is already running")]
    AlreadyRunning { name: String },

    #[error("unknown source '{name}'")]
    UnknownSource { name: String },

    #[error("source '{name}' has no log path configured")]
    NoLogPath { name: String },
}
