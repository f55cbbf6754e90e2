//! Error types for log source access

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading the game log. All of them are recoverable: the
/// worker reports them and retries on a later poll.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("log source unavailable: {path}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to memory map file {path}")]
    MemoryMap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read file {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to seek in file {path}")]
    Seek {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReaderError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ReaderError::SourceUnavailable { path, .. }
            | ReaderError::MemoryMap { path, .. }
            | ReaderError::ReadFile { path, .. }
            | ReaderError::Seek { path, .. } => path,
        }
    }
}
