//! Shared configuration types for the Verse combat log tracker
//!
//! This crate contains serializable configuration types that are shared between
//! the tracking engine (vcl-core) and its hosts. Persistence lives in vcl-core
//! behind the `AppConfigExt` trait.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─────────────────────────────────────────────────────────────────────────────
// Game Sources
// ─────────────────────────────────────────────────────────────────────────────

/// Release channels that each write their own log file.
pub const DEFAULT_SOURCES: [&str; 4] = ["LIVE", "PTU", "EPTU", "TECH-PREVIEW"];

fn default_log_path(source: &str) -> String {
    format!(
        r"C:\Program Files\Roberts Space Industries\StarCitizen\{}\Game.log",
        source
    )
}

/// Per-source settings: where the log lives and who the tracked player is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub log_path: String,
    /// Filled in from the login header of the log
    #[serde(default)]
    pub player_name: String,
    /// Numeric actor id of the tracked player, kept as text exactly as logged
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub game_version: String,
}

impl SourceConfig {
    pub fn with_log_path(log_path: impl Into<String>) -> Self {
        Self {
            log_path: log_path.into(),
            ..Default::default()
        }
    }

    pub fn has_player(&self) -> bool {
        !self.player_id.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// App Config
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// Note: Persistence methods (load/save) are provided by vcl-core via the
/// `AppConfigExt` trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_current_source")]
    pub current_source: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_sources")]
    pub sources: BTreeMap<String, SourceConfig>,
}

fn default_current_source() -> String {
    DEFAULT_SOURCES[0].to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_sources() -> BTreeMap<String, SourceConfig> {
    DEFAULT_SOURCES
        .iter()
        .map(|s| (s.to_string(), SourceConfig::with_log_path(default_log_path(s))))
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            current_source: default_current_source(),
            language: default_language(),
            sources: default_sources(),
        }
    }
}

impl AppConfig {
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.get(name)
    }

    pub fn source_mut(&mut self, name: &str) -> Option<&mut SourceConfig> {
        self.sources.get_mut(name)
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    /// Switch the active source. Unknown names are ignored.
    pub fn set_current_source(&mut self, name: &str) -> bool {
        if self.sources.contains_key(name) {
            self.current_source = name.to_string();
            true
        } else {
            false
        }
    }

    /// Only "de" and "en" message catalogs exist.
    pub fn set_language(&mut self, language: &str) -> bool {
        if matches!(language, "de" | "en") {
            self.language = language.to_string();
            true
        } else {
            false
        }
    }
}
