//! NPC detection by name patterns.
//!
//! A name is an NPC when it contains any configured pattern as a plain,
//! case-sensitive substring. The pattern set is mutable at runtime; callers
//! that change it must reclassify stored statistics afterwards (see
//! `StatsStore::reclassify`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage;

/// Seed patterns used when no pattern file exists or it is empty.
pub const DEFAULT_NPC_PATTERNS: &[&str] = &[
    "PU_Human_Enemy",
    "_NPC_",
    "yormandi_",
    "_Elite_",
    "_grunt_",
    "_sniper_",
    "_juggernaut_",
    "_cqc_",
    "Ninetails",
    "Dusters",
    "XenoThreat",
    "ASD_",
    "Kopion_",
    "StreamingSOC_",
    "vlk_juvenile_",
    "PU_Human-NineTails",
    "vlk_adult_",
    "_irradiated_",
    "_sentry_",
    "PU_Pilots",
    "-Human-Criminal-",
    "-Human-Civilian-",
    "MissionEntityStreamable_",
    "AIModule_",
    "_Unmanned_PU_PDC_",
    "-StormBreaker-",
    "PU_Human-",
    "-Populace-Engineer-",
    "NPC_Archetypes_",
];

/// Marker for planetary defence turrets, reported separately from other NPCs.
const PDC_MARKER: &str = "_PDC_";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PatternFile {
    #[serde(default)]
    patterns: Vec<String>,
}

/// How an actor name is presented in event messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Npc,
    Pdc,
}

#[derive(Debug, Clone)]
pub struct NpcClassifier {
    patterns: Vec<String>,
    path: Option<PathBuf>,
}

impl Default for NpcClassifier {
    fn default() -> Self {
        Self::with_patterns(DEFAULT_NPC_PATTERNS.iter().copied())
    }
}

impl NpcClassifier {
    /// In-memory classifier, never written to disk.
    pub fn with_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            path: None,
        }
    }

    /// Load patterns from `path`, seeding (and persisting) the defaults when
    /// the file is missing or holds no patterns.
    pub fn load(path: &Path) -> Self {
        let file: PatternFile = storage::load_or_default(Some(path));
        let mut classifier = Self {
            patterns: file.patterns,
            path: Some(path.to_path_buf()),
        };
        if classifier.patterns.is_empty() {
            classifier.patterns = DEFAULT_NPC_PATTERNS.iter().map(|p| p.to_string()).collect();
            classifier.save();
        }
        classifier
    }

    pub fn is_npc(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| name.contains(p.as_str()))
    }

    pub fn actor_kind(&self, name: &str) -> ActorKind {
        if !self.is_npc(name) {
            ActorKind::Player
        } else if name.contains(PDC_MARKER) {
            ActorKind::Pdc
        } else {
            ActorKind::Npc
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns false when the pattern is empty or already present.
    pub fn add_pattern(&mut self, pattern: &str) -> bool {
        if pattern.is_empty() || self.patterns.iter().any(|p| p == pattern) {
            return false;
        }
        self.patterns.push(pattern.to_string());
        self.save();
        true
    }

    pub fn remove_pattern(&mut self, pattern: &str) -> bool {
        let before = self.patterns.len();
        self.patterns.retain(|p| p != pattern);
        if self.patterns.len() == before {
            return false;
        }
        self.save();
        true
    }

    fn save(&self) {
        storage::persist(
            self.path.as_deref(),
            &PatternFile {
                patterns: self.patterns.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_is_case_sensitive_and_unanchored() {
        let npcs = NpcClassifier::with_patterns(["_NPC_"]);
        assert!(npcs.is_npc("PU_Human_NPC_Guard_42"));
        assert!(npcs.is_npc("_NPC_"));
        assert!(!npcs.is_npc("pu_human_npc_guard"));
        assert!(!npcs.is_npc("Ace123"));
    }

    #[test]
    fn defaults_flag_common_ai_names() {
        let npcs = NpcClassifier::default();
        assert!(npcs.is_npc("PU_Human_Enemy_GroundCombat_NPC_Faction_01"));
        assert!(npcs.is_npc("Kopion_Adult_123"));
        assert!(!npcs.is_npc("SomePilot"));
    }

    #[test]
    fn pdc_turrets_are_reported_separately() {
        let npcs = NpcClassifier::default();
        assert_eq!(npcs.actor_kind("Turret_Unmanned_PU_PDC_01"), ActorKind::Pdc);
        assert_eq!(npcs.actor_kind("PU_Pilots_Hostile"), ActorKind::Npc);
        assert_eq!(npcs.actor_kind("Ace123"), ActorKind::Player);
    }

    #[test]
    fn add_and_remove_report_changes() {
        let mut npcs = NpcClassifier::with_patterns(Vec::<String>::new());
        assert!(npcs.add_pattern("Bot_"));
        assert!(!npcs.add_pattern("Bot_"));
        assert!(!npcs.add_pattern(""));
        assert!(npcs.is_npc("Bot_7"));
        assert!(npcs.remove_pattern("Bot_"));
        assert!(!npcs.remove_pattern("Bot_"));
        assert!(!npcs.is_npc("Bot_7"));
    }

    #[test]
    fn load_seeds_defaults_and_persists_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("npc_db.json");

        let mut npcs = NpcClassifier::load(&path);
        assert_eq!(npcs.patterns().len(), DEFAULT_NPC_PATTERNS.len());
        assert!(path.exists());

        npcs.add_pattern("Custom_Bandit");
        let reloaded = NpcClassifier::load(&path);
        assert!(reloaded.is_npc("Custom_Bandit_3"));
    }
}
