//! Per-source record of the human players the tracked player fought.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::identity::NpcClassifier;
use crate::stats::round2;
use crate::storage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTally {
    pub total: u64,
    pub weapons: HashMap<String, u64>,
}

impl WeaponTally {
    fn add(&mut self, weapon: &str) {
        self.total += 1;
        *self.weapons.entry_ref(weapon).or_default() += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub kills_by_me: WeaponTally,
    #[serde(default)]
    pub deaths_by_them: WeaponTally,
    #[serde(default)]
    pub my_vehicles_destroyed_by_them: HashMap<String, u64>,
    pub first_encounter: DateTime<Utc>,
    pub last_encounter: DateTime<Utc>,
}

impl PlayerRecord {
    fn new(at: DateTime<Utc>) -> Self {
        Self {
            kills_by_me: WeaponTally::default(),
            deaths_by_them: WeaponTally::default(),
            my_vehicles_destroyed_by_them: HashMap::new(),
            first_encounter: at,
            last_encounter: at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub player_name: String,
    pub kills_by_me: u64,
    pub deaths_by_them: u64,
    pub kd_ratio: f64,
    pub total_my_vehicles_destroyed_by_them: u64,
    pub first_encounter: DateTime<Utc>,
    pub last_encounter: DateTime<Utc>,
}

impl PlayerSummary {
    pub fn encounters(&self) -> u64 {
        self.kills_by_me + self.deaths_by_them
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlayerFile {
    #[serde(default)]
    players: HashMap<String, PlayerRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerBook {
    players: HashMap<String, PlayerRecord>,
    path: Option<PathBuf>,
}

impl PlayerBook {
    pub fn ephemeral() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Self {
        let file: PlayerFile = storage::load_or_default(Some(path));
        Self {
            players: file.players,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.get(name)
    }

    pub fn add_kill_by_me(&mut self, name: &str, weapon: &str, at: DateTime<Utc>) {
        self.touch(name, at).kills_by_me.add(weapon);
        self.save();
    }

    pub fn add_death_by_them(&mut self, name: &str, weapon: &str, at: DateTime<Utc>) {
        self.touch(name, at).deaths_by_them.add(weapon);
        self.save();
    }

    pub fn add_vehicle_destroyed_by_them(&mut self, name: &str, vehicle: &str, at: DateTime<Utc>) {
        *self
            .touch(name, at)
            .my_vehicles_destroyed_by_them
            .entry_ref(vehicle)
            .or_default() += 1;
        self.save();
    }

    /// Kills and deaths against one player. K/D falls back to the kill count
    /// when that player never killed us.
    pub fn summary(&self, name: &str) -> Option<PlayerSummary> {
        let record = self.players.get(name)?;
        let kills = record.kills_by_me.total;
        let deaths = record.deaths_by_them.total;
        let kd_ratio = if deaths > 0 {
            round2(kills as f64 / deaths as f64)
        } else {
            kills as f64
        };
        Some(PlayerSummary {
            player_name: name.to_string(),
            kills_by_me: kills,
            deaths_by_them: deaths,
            kd_ratio,
            total_my_vehicles_destroyed_by_them: record.my_vehicles_destroyed_by_them.values().sum(),
            first_encounter: record.first_encounter,
            last_encounter: record.last_encounter,
        })
    }

    /// Players who killed us most.
    pub fn top_killers(&self, limit: usize) -> Vec<PlayerSummary> {
        self.ranked(|s| s.deaths_by_them, limit)
    }

    /// Players we killed most.
    pub fn top_victims(&self, limit: usize) -> Vec<PlayerSummary> {
        self.ranked(|s| s.kills_by_me, limit)
    }

    pub fn rivalries(&self, min_encounters: u64) -> Vec<PlayerSummary> {
        let mut rivals: Vec<PlayerSummary> = self
            .summaries()
            .into_iter()
            .filter(|s| s.encounters() >= min_encounters)
            .collect();
        sort_desc(&mut rivals, PlayerSummary::encounters);
        rivals
    }

    pub fn remove_player(&mut self, name: &str) -> bool {
        let removed = self.players.remove(name).is_some();
        if removed {
            self.save();
        }
        removed
    }

    /// Drop every name that classifies as an NPC. Returns how many were removed.
    pub fn remove_npcs(&mut self, npcs: &NpcClassifier) -> usize {
        let before = self.players.len();
        self.players.retain(|name, _| !npcs.is_npc(name));
        let removed = before - self.players.len();
        if removed > 0 {
            tracing::info!(removed, "Removed NPCs from player book");
            self.save();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.save();
    }

    fn touch(&mut self, name: &str, at: DateTime<Utc>) -> &mut PlayerRecord {
        let record = self
            .players
            .entry_ref(name)
            .or_insert_with(|| PlayerRecord::new(at));
        record.last_encounter = record.last_encounter.max(at);
        record
    }

    fn summaries(&self) -> Vec<PlayerSummary> {
        self.players
            .keys()
            .filter_map(|name| self.summary(name))
            .collect()
    }

    fn ranked(&self, key: impl Fn(&PlayerSummary) -> u64, limit: usize) -> Vec<PlayerSummary> {
        let mut summaries = self.summaries();
        sort_desc(&mut summaries, key);
        summaries.truncate(limit);
        summaries
    }

    fn save(&self) {
        #[derive(Serialize)]
        struct PlayerFileRef<'a> {
            last_updated: DateTime<Utc>,
            players: &'a HashMap<String, PlayerRecord>,
        }

        storage::persist(
            self.path.as_deref(),
            &PlayerFileRef {
                last_updated: Utc::now(),
                players: &self.players,
            },
        );
    }
}

/// Highest first; ties broken by name so output is stable.
fn sort_desc(summaries: &mut [PlayerSummary], key: impl Fn(&PlayerSummary) -> u64) {
    summaries.sort_by(|a, b| {
        key(b)
            .cmp(&key(a))
            .then_with(|| a.player_name.cmp(&b.player_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 18, minute, 0).unwrap()
    }

    fn book() -> PlayerBook {
        let mut book = PlayerBook::ephemeral();
        book.add_kill_by_me("Ace", "rifle", at(1));
        book.add_kill_by_me("Ace", "rifle", at(2));
        book.add_death_by_them("Ace", "pistol", at(3));
        book.add_death_by_them("Bob", "railgun", at(4));
        book.add_death_by_them("Bob", "railgun", at(5));
        book.add_vehicle_destroyed_by_them("Bob", "ANVL_Arrow", at(6));
        book.add_kill_by_me("Cid", "knife", at(7));
        book
    }

    #[test]
    fn summary_reports_kd_and_encounter_window() {
        let book = book();
        let ace = book.summary("Ace").unwrap();
        assert_eq!(ace.kills_by_me, 2);
        assert_eq!(ace.deaths_by_them, 1);
        assert_eq!(ace.kd_ratio, 2.0);
        assert_eq!(ace.first_encounter, at(1));
        assert_eq!(ace.last_encounter, at(3));

        // no deaths: kd is the kill count
        assert_eq!(book.summary("Cid").unwrap().kd_ratio, 1.0);
        assert_eq!(book.summary("Bob").unwrap().total_my_vehicles_destroyed_by_them, 1);
        assert!(book.summary("Nobody").is_none());
    }

    #[test]
    fn rankings_sort_descending() {
        let book = book();
        let killers: Vec<_> = book.top_killers(2).into_iter().map(|s| s.player_name).collect();
        assert_eq!(killers, vec!["Bob", "Ace"]);

        let victims: Vec<_> = book.top_victims(1).into_iter().map(|s| s.player_name).collect();
        assert_eq!(victims, vec!["Ace"]);

        let rivals: Vec<_> = book.rivalries(2).into_iter().map(|s| s.player_name).collect();
        assert_eq!(rivals, vec!["Ace", "Bob"]);
    }

    #[test]
    fn npc_cleanup_and_removal() {
        let mut book = book();
        let npcs = NpcClassifier::with_patterns(["Bo"]);
        assert_eq!(book.remove_npcs(&npcs), 1);
        assert!(book.get("Bob").is_none());
        assert!(book.remove_player("Cid"));
        assert!(!book.remove_player("Cid"));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn book_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players_db_live.json");
        let mut book = PlayerBook::load(&path);
        book.add_death_by_them("Ace", "pistol", at(1));

        let reloaded = PlayerBook::load(&path);
        assert_eq!(reloaded.get("Ace"), book.get("Ace"));
    }
}
