use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::identity::NpcClassifier;

/// Counters for one scope (session or lifetime). Keys are internal ids;
/// display names are resolved only when presenting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopedStats {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    pub pve_kills: u64,
    pub pvp_kills: u64,
    pub deaths: u64,
    pub weapon_kills: HashMap<String, u64>,
    /// Victim name -> weapons used, one entry per kill.
    pub pvp_victims: HashMap<String, Vec<String>>,
    pub death_weapons: HashMap<String, u64>,
    pub death_by_players: HashMap<String, u64>,
    pub vehicle_kills: HashMap<String, u64>,
    pub vehicle_losses_by_player: HashMap<String, HashMap<String, u64>>,
}

/// What a reclassification pass changed in one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reclassified {
    pub kills_moved: u64,
    pub attributions_dropped: usize,
}

impl Reclassified {
    pub fn is_empty(&self) -> bool {
        self.kills_moved == 0 && self.attributions_dropped == 0
    }
}

impl std::ops::AddAssign for Reclassified {
    fn add_assign(&mut self, rhs: Self) {
        self.kills_moved += rhs.kills_moved;
        self.attributions_dropped += rhs.attributions_dropped;
    }
}

impl ScopedStats {
    pub fn total_kills(&self) -> u64 {
        self.pve_kills + self.pvp_kills
    }

    pub fn pvp_deaths(&self) -> u64 {
        self.death_by_players.values().sum()
    }

    /// Kills per death rounded to two decimals; 0.0 without deaths.
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            return 0.0;
        }
        round2(self.total_kills() as f64 / self.deaths as f64)
    }

    pub(crate) fn add_kill(&mut self, is_pvp: bool, weapon: &str, victim: Option<&str>) {
        if is_pvp {
            self.pvp_kills += 1;
            if let Some(victim) = victim {
                self.pvp_victims
                    .entry_ref(victim)
                    .or_default()
                    .push(weapon.to_string());
            }
        } else {
            self.pve_kills += 1;
        }
        *self.weapon_kills.entry_ref(weapon).or_default() += 1;
    }

    pub(crate) fn add_death(&mut self, weapon: &str, killer: Option<&str>) {
        self.deaths += 1;
        *self.death_weapons.entry_ref(weapon).or_default() += 1;
        if let Some(killer) = killer {
            *self.death_by_players.entry_ref(killer).or_default() += 1;
        }
    }

    pub(crate) fn add_vehicle_kill(&mut self, vehicle: &str) {
        *self.vehicle_kills.entry_ref(vehicle).or_default() += 1;
    }

    pub(crate) fn add_vehicle_loss(&mut self, vehicle: &str, destroyer: &str) {
        *self
            .vehicle_losses_by_player
            .entry_ref(destroyer)
            .or_default()
            .entry_ref(vehicle)
            .or_default() += 1;
    }

    /// Remove everything `other` contributed, clamping at zero and dropping
    /// keys that reach zero. Victim weapon lists are treated as multisets.
    pub(crate) fn subtract(&mut self, other: &ScopedStats) {
        self.pve_kills = self.pve_kills.saturating_sub(other.pve_kills);
        self.pvp_kills = self.pvp_kills.saturating_sub(other.pvp_kills);
        self.deaths = self.deaths.saturating_sub(other.deaths);

        subtract_counts(&mut self.weapon_kills, &other.weapon_kills);
        subtract_counts(&mut self.death_weapons, &other.death_weapons);
        subtract_counts(&mut self.death_by_players, &other.death_by_players);
        subtract_counts(&mut self.vehicle_kills, &other.vehicle_kills);

        for (destroyer, vehicles) in &other.vehicle_losses_by_player {
            if let Some(mine) = self.vehicle_losses_by_player.get_mut(destroyer) {
                subtract_counts(mine, vehicles);
                if mine.is_empty() {
                    self.vehicle_losses_by_player.remove(destroyer);
                }
            }
        }

        for (victim, weapons) in &other.pvp_victims {
            if let Some(mine) = self.pvp_victims.get_mut(victim) {
                for weapon in weapons {
                    if let Some(pos) = mine.iter().position(|w| w == weapon) {
                        mine.remove(pos);
                    }
                }
                if mine.is_empty() {
                    self.pvp_victims.remove(victim);
                }
            }
        }
    }

    /// Drop names that now classify as NPCs. Their PvP kills move to PvE;
    /// killer and destroyer attributions are dropped without a counterpart.
    pub(crate) fn reclassify(&mut self, npcs: &NpcClassifier) -> Reclassified {
        let mut result = Reclassified::default();

        let npc_victims: Vec<String> = self
            .pvp_victims
            .keys()
            .filter(|name| npcs.is_npc(name))
            .cloned()
            .collect();
        for name in npc_victims {
            if let Some(weapons) = self.pvp_victims.remove(&name) {
                let moved = weapons.len() as u64;
                self.pvp_kills = self.pvp_kills.saturating_sub(moved);
                self.pve_kills += moved;
                result.kills_moved += moved;
            }
        }

        let before = self.death_by_players.len() + self.vehicle_losses_by_player.len();
        self.death_by_players.retain(|name, _| !npcs.is_npc(name));
        self.vehicle_losses_by_player
            .retain(|name, _| !npcs.is_npc(name));
        result.attributions_dropped =
            before - self.death_by_players.len() - self.vehicle_losses_by_player.len();

        result
    }
}

fn subtract_counts(target: &mut HashMap<String, u64>, other: &HashMap<String, u64>) {
    for (key, count) in other {
        if let Some(value) = target.get_mut(key) {
            *value = value.saturating_sub(*count);
            if *value == 0 {
                target.remove(key);
            }
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kd_ratio_rounds_and_handles_zero_deaths() {
        let mut stats = ScopedStats::default();
        stats.add_kill(false, "w", None);
        assert_eq!(stats.kd_ratio(), 0.0);

        stats.add_kill(true, "w", Some("Ace"));
        stats.add_death("w", None);
        stats.add_death("w", None);
        stats.add_death("w", None);
        assert_eq!(stats.kd_ratio(), 0.67);
    }

    #[test]
    fn victim_weapons_keep_multiplicity() {
        let mut stats = ScopedStats::default();
        stats.add_kill(true, "rifle", Some("Ace"));
        stats.add_kill(true, "rifle", Some("Ace"));
        stats.add_kill(true, "pistol", Some("Ace"));
        assert_eq!(stats.pvp_victims["Ace"], vec!["rifle", "rifle", "pistol"]);
        assert_eq!(stats.weapon_kills["rifle"], 2);
    }

    #[test]
    fn subtract_clamps_and_drops_zeroed_keys() {
        let mut lifetime = ScopedStats::default();
        lifetime.add_kill(true, "rifle", Some("Ace"));
        lifetime.add_vehicle_loss("ANVL_Arrow", "Ace");

        let mut session = lifetime.clone();
        session.add_kill(true, "rifle", Some("Ace"));
        session.add_vehicle_loss("ANVL_Arrow", "Ace");

        lifetime.subtract(&session);
        assert_eq!(lifetime, ScopedStats::default());
    }
}
