use chrono::{DateTime, Utc};

use super::Tracker;
use crate::combat_log::KillLine;
use crate::identity::NpcClassifier;
use crate::names::WeaponNames;
use crate::signal::TrackerSignal;
use crate::timeline::{EventKind, EventRecord};

/// Exosuits die through the personnel kill line but count as vehicles.
const EXOSKELETON_PREFIX: &str = "ARGO_ATLS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KillOutcome {
    Suicide,
    ExoskeletonKill,
    PveKill,
    PvpKill,
    EnvironmentalDeath,
    DeathByNpc,
    DeathByPlayer,
    /// Neither side is the tracked player.
    Unrelated,
}

pub(crate) fn classify_kill(kill: &KillLine, player_id: &str, npcs: &NpcClassifier) -> KillOutcome {
    let victim_is_self = kill.victim_id == player_id;
    let killer_is_self = kill.killer_id == player_id;

    match (victim_is_self, killer_is_self) {
        (true, true) => KillOutcome::Suicide,
        (false, true) if kill.victim.starts_with(EXOSKELETON_PREFIX) => KillOutcome::ExoskeletonKill,
        (false, true) if npcs.is_npc(&kill.victim) => KillOutcome::PveKill,
        (false, true) => KillOutcome::PvpKill,
        (true, false) if is_environmental(kill) => KillOutcome::EnvironmentalDeath,
        (true, false) if npcs.is_npc(&kill.killer) => KillOutcome::DeathByNpc,
        (true, false) => KillOutcome::DeathByPlayer,
        (false, false) => KillOutcome::Unrelated,
    }
}

/// All four literals must match; anything short of that is a normal death.
fn is_environmental(kill: &KillLine) -> bool {
    kill.killer.eq_ignore_ascii_case("unknown")
        && kill.killer_id == "0"
        && kill.weapon_class.eq_ignore_ascii_case("unknown")
        && kill.damage_type.eq_ignore_ascii_case("hazard")
}

/// Weapon id counted for a kill line. An `unknown` class falls back to the
/// full weapon name, then the damage type.
pub(crate) fn resolve_weapon(kill: &KillLine, weapons: &WeaponNames) -> String {
    if !kill.weapon_class.eq_ignore_ascii_case("unknown") {
        return kill.weapon_class.clone();
    }
    let full = kill.weapon_full.as_str();
    if !full.is_empty() && !full.eq_ignore_ascii_case("unknown") && full != "0" {
        weapons.normalize(full)
    } else if !kill.damage_type.is_empty() {
        kill.damage_type.clone()
    } else {
        "unknown".to_string()
    }
}

impl Tracker {
    pub(super) fn handle_kill(&mut self, kill: &KillLine, at: DateTime<Utc>) {
        let Some(player_id) = self.player_id() else {
            return;
        };

        let (weapon, weapon_display) = {
            let weapons = self.lookups.weapons();
            let weapon = resolve_weapon(kill, &weapons);
            if weapons.is_blacklisted(&weapon) {
                tracing::trace!(weapon = %weapon, "Ignoring kill with blacklisted weapon");
                return;
            }
            let display = weapons.display_name(&weapon);
            (weapon, display)
        };
        let outcome = classify_kill(kill, player_id, &self.lookups.npcs());

        let event = match outcome {
            KillOutcome::Unrelated => return,
            KillOutcome::Suicide => {
                self.stats.record_death(&weapon, None);
                EventRecord::new(EventKind::Death, format!("Suicide with {weapon_display}"), at)
                    .key("events.suicide")
                    .param("weapon", &weapon_display)
            }
            KillOutcome::ExoskeletonKill => {
                let (parent, display) = {
                    let mut vehicles = self.lookups.vehicles_mut();
                    let internal = vehicles.normalize(&kill.victim);
                    let parent = vehicles.discover_parent(&internal);
                    (parent, vehicles.display_name(&internal))
                };
                self.stats.record_vehicle_kill(&parent);
                EventRecord::new(EventKind::Vehicle, format!("{display} destroyed"), at)
                    .key("events.vehicle_destroyed")
                    .param("vehicle", &display)
            }
            KillOutcome::PveKill => {
                self.stats.record_kill(false, &weapon, None);
                EventRecord::new(EventKind::PveKill, format!("PvE kill with {weapon_display}"), at)
                    .key("events.pve_kill")
                    .param("weapon", &weapon_display)
            }
            KillOutcome::PvpKill => {
                self.stats.record_kill(true, &weapon, Some(&kill.victim));
                self.players.add_kill_by_me(&kill.victim, &weapon, at);
                EventRecord::new(
                    EventKind::PvpKill,
                    format!("{} with {weapon_display}", kill.victim),
                    at,
                )
                .key("events.pvp_kill")
                .param("victim", &kill.victim)
                .param("weapon", &weapon_display)
            }
            KillOutcome::EnvironmentalDeath => {
                self.stats.record_death(&weapon, None);
                EventRecord::new(
                    EventKind::Death,
                    format!("Killed by the environment ({weapon_display})"),
                    at,
                )
                .key("events.death_environmental")
                .param("weapon", &weapon_display)
            }
            KillOutcome::DeathByNpc => {
                self.stats.record_death(&weapon, None);
                EventRecord::new(EventKind::Death, format!("Killed by NPC with {weapon_display}"), at)
                    .key("events.death_by_npc")
                    .param("weapon", &weapon_display)
            }
            KillOutcome::DeathByPlayer => {
                self.stats.record_death(&weapon, Some(&kill.killer));
                self.players.add_death_by_them(&kill.killer, &weapon, at);
                EventRecord::new(
                    EventKind::Death,
                    format!("Killed by {} with {weapon_display}", kill.killer),
                    at,
                )
                .key("events.death_by_player")
                .param("killer", &kill.killer)
                .param("weapon", &weapon_display)
            }
        };

        tracing::debug!(source = %self.source, outcome = ?outcome, weapon = %weapon, "Kill line");
        self.record(event);
        self.emit(TrackerSignal::StatsUpdated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::NamesTable;
    use std::sync::Arc;

    const ME: &str = "100";

    fn kill(victim: (&str, &str), killer: (&str, &str), class: &str, damage: &str) -> KillLine {
        KillLine {
            victim: victim.0.into(),
            victim_id: victim.1.into(),
            killer: killer.0.into(),
            killer_id: killer.1.into(),
            weapon_full: "behr_rifle_ballistic_01_7299497977400".into(),
            weapon_class: class.into(),
            damage_type: damage.into(),
        }
    }

    fn npcs() -> NpcClassifier {
        NpcClassifier::with_patterns(["_NPC_"])
    }

    #[test]
    fn decision_table_covers_every_branch() {
        let npcs = npcs();
        let cases = [
            (kill(("Me", ME), ("Me", ME), "rifle", "Bullet"), KillOutcome::Suicide),
            (kill(("ARGO_ATLS_123", "7"), ("Me", ME), "rifle", "Bullet"), KillOutcome::ExoskeletonKill),
            (kill(("PU_NPC_Guard", "7"), ("Me", ME), "rifle", "Bullet"), KillOutcome::PveKill),
            (kill(("Ace123", "7"), ("Me", ME), "rifle", "Bullet"), KillOutcome::PvpKill),
            (kill(("Me", ME), ("unknown", "0"), "unknown", "Hazard"), KillOutcome::EnvironmentalDeath),
            (kill(("Me", ME), ("PU_NPC_Guard", "7"), "rifle", "Bullet"), KillOutcome::DeathByNpc),
            (kill(("Me", ME), ("Ace123", "7"), "rifle", "Bullet"), KillOutcome::DeathByPlayer),
            (kill(("Ace123", "7"), ("Bob", "8"), "rifle", "Bullet"), KillOutcome::Unrelated),
        ];
        for (line, expected) in cases {
            assert_eq!(classify_kill(&line, ME, &npcs), expected, "{line:?}");
        }
    }

    #[test]
    fn partial_environment_match_falls_through() {
        // killer id is not "0": a player named "unknown" killed us
        let line = kill(("Me", ME), ("unknown", "55"), "unknown", "hazard");
        assert_eq!(classify_kill(&line, ME, &npcs()), KillOutcome::DeathByPlayer);

        let line = kill(("Me", ME), ("unknown", "0"), "unknown", "Collision");
        assert_eq!(classify_kill(&line, ME, &npcs()), KillOutcome::DeathByPlayer);
    }

    #[test]
    fn weapon_resolution_fallbacks() {
        let weapons = WeaponNames::new(Arc::new(NamesTable::default()));

        let line = kill(("a", "1"), ("b", "2"), "klwe_pistol_energy_01", "Bullet");
        assert_eq!(resolve_weapon(&line, &weapons), "klwe_pistol_energy_01");

        let line = kill(("a", "1"), ("b", "2"), "unknown", "Explosion");
        assert_eq!(resolve_weapon(&line, &weapons), "behr_rifle_ballistic_01");

        let mut line = kill(("a", "1"), ("b", "2"), "Unknown", "VehicleDestruction");
        line.weapon_full = "unknown".into();
        assert_eq!(resolve_weapon(&line, &weapons), "VehicleDestruction");

        line.damage_type.clear();
        assert_eq!(resolve_weapon(&line, &weapons), "unknown");
    }
}
