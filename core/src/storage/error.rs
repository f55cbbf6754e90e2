//! Error types for state file persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading or writing the JSON state files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create data directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read state file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state for {path}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("state file {path} is not valid JSON")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
