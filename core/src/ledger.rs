//! Durable read cursor into a log file.
//!
//! The cursor is stored apart from the statistics so either file can be
//! rebuilt without the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CursorFile {
    #[serde(default)]
    last_position: u64,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

/// Result of comparing the stored cursor against the current file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorCheck {
    /// File is at least as large as the cursor; continue from the offset.
    Resume(u64),
    /// File shrank below the cursor: it was truncated or replaced.
    Rotated,
}

#[derive(Debug, Clone)]
pub struct PositionLedger {
    offset: u64,
    updated_at: Option<DateTime<Utc>>,
    path: Option<PathBuf>,
}

impl PositionLedger {
    /// A cursor at offset 0 that is never persisted.
    pub fn ephemeral() -> Self {
        Self {
            offset: 0,
            updated_at: None,
            path: None,
        }
    }

    pub fn load(path: &Path) -> Self {
        let file: CursorFile = storage::load_or_default(Some(path));
        tracing::debug!(path = %path.display(), offset = file.last_position, "Loaded log position");
        Self {
            offset: file.last_position,
            updated_at: file.last_updated,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn validate(&self, observed_size: u64) -> CursorCheck {
        if observed_size < self.offset {
            CursorCheck::Rotated
        } else {
            CursorCheck::Resume(self.offset)
        }
    }

    /// Move the cursor and persist it, even when the offset did not change.
    pub fn advance(&mut self, new_offset: u64) {
        self.offset = new_offset;
        self.updated_at = Some(Utc::now());
        self.save();
    }

    pub fn reset(&mut self) {
        self.advance(0);
    }

    fn save(&self) {
        storage::persist(
            self.path.as_deref(),
            &CursorFile {
                last_position: self.offset,
                last_updated: self.updated_at,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinking_file_signals_rotation() {
        let mut ledger = PositionLedger::ephemeral();
        ledger.advance(1_000);
        assert_eq!(ledger.validate(1_000), CursorCheck::Resume(1_000));
        assert_eq!(ledger.validate(4_096), CursorCheck::Resume(1_000));
        assert_eq!(ledger.validate(999), CursorCheck::Rotated);
    }

    #[test]
    fn cursor_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log_position_live.json");

        let mut ledger = PositionLedger::load(&path);
        assert_eq!(ledger.offset(), 0);
        ledger.advance(512);
        assert!(ledger.updated_at().is_some());

        let reloaded = PositionLedger::load(&path);
        assert_eq!(reloaded.offset(), 512);
    }

    #[test]
    fn reset_returns_to_start() {
        let mut ledger = PositionLedger::ephemeral();
        ledger.advance(77);
        ledger.reset();
        assert_eq!(ledger.offset(), 0);
    }
}
