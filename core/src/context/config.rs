//! Application configuration
//!
//! Re-exports the shared types from vcl-types and adds confy-backed
//! persistence plus per-source setters for AppConfig.

pub use vcl_types::{AppConfig, DEFAULT_SOURCES, SourceConfig};

use super::ConfigError;

const APP_NAME: &str = "vcl";
const CONFIG_NAME: &str = "config";

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for AppConfig persistence and per-source updates.
/// Setters only touch memory; call `save` to persist.
pub trait AppConfigExt: Sized {
    fn try_load() -> Result<Self, ConfigError>;
    /// Falls back to defaults when the file is unreadable.
    fn load() -> Self;
    fn save(&self) -> Result<(), ConfigError>;
    fn set_player_info(&mut self, source: &str, name: &str, id: &str) -> Result<(), ConfigError>;
    fn set_game_version(&mut self, source: &str, version: &str) -> Result<(), ConfigError>;
    fn set_log_path(&mut self, source: &str, path: &str) -> Result<(), ConfigError>;
    /// Copy identity fields learned from a log into `source`. Returns true if anything changed.
    fn apply_identity(&mut self, source: &str, identity: &SourceConfig) -> Result<bool, ConfigError>;
}

impl AppConfigExt for AppConfig {
    fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load configuration, using defaults");
            Self::default()
        })
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)
    }

    fn set_player_info(&mut self, source: &str, name: &str, id: &str) -> Result<(), ConfigError> {
        let entry = source_entry(self, source)?;
        entry.player_name = name.to_string();
        entry.player_id = id.to_string();
        Ok(())
    }

    fn set_game_version(&mut self, source: &str, version: &str) -> Result<(), ConfigError> {
        source_entry(self, source)?.game_version = version.to_string();
        Ok(())
    }

    fn set_log_path(&mut self, source: &str, path: &str) -> Result<(), ConfigError> {
        source_entry(self, source)?.log_path = path.to_string();
        Ok(())
    }

    fn apply_identity(&mut self, source: &str, identity: &SourceConfig) -> Result<bool, ConfigError> {
        let entry = source_entry(self, source)?;
        let before = entry.clone();
        entry.player_name.clone_from(&identity.player_name);
        entry.player_id.clone_from(&identity.player_id);
        entry.game_version.clone_from(&identity.game_version);
        Ok(*entry != before)
    }
}

fn source_entry<'a>(config: &'a mut AppConfig, source: &str) -> Result<&'a mut SourceConfig, ConfigError> {
    config
        .source_mut(source)
        .ok_or_else(|| ConfigError::UnknownSource {
            name: source.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_reject_unknown_sources() {
        let mut config = AppConfig::default();
        assert!(matches!(
            config.set_log_path("NOPE", "/tmp/Game.log"),
            Err(ConfigError::UnknownSource { .. })
        ));

        config.set_log_path("PTU", "/tmp/Game.log").unwrap();
        config.set_player_info("PTU", "Pilot_Me", "200146295001").unwrap();
        config.set_game_version("PTU", "4.3.2 (Build 10452200)").unwrap();

        let ptu = config.source("PTU").unwrap();
        assert_eq!(ptu.log_path, "/tmp/Game.log");
        assert!(ptu.has_player());
        assert_eq!(ptu.game_version, "4.3.2 (Build 10452200)");
    }

    #[test]
    fn apply_identity_reports_changes_and_keeps_log_path() {
        let mut config = AppConfig::default();
        let path = config.source("LIVE").unwrap().log_path.clone();
        let identity = SourceConfig {
            log_path: "ignored".into(),
            player_name: "Pilot_Me".into(),
            player_id: "200146295001".into(),
            game_version: String::new(),
        };

        assert!(config.apply_identity("LIVE", &identity).unwrap());
        assert!(!config.apply_identity("LIVE", &identity).unwrap());
        assert_eq!(config.source("LIVE").unwrap().log_path, path);
    }
}
