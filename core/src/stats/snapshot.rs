use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;

use super::ScopedStats;
use crate::names::VehicleParents;

/// One scope formatted for presentation: derived totals added, vehicle maps
/// folded onto their aggregation parents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopeSummary {
    pub session_id: String,
    pub pve_kills: u64,
    pub pvp_kills: u64,
    pub total_kills: u64,
    pub deaths: u64,
    pub pvp_deaths: u64,
    pub kd_ratio: f64,
    pub weapon_kills: HashMap<String, u64>,
    pub pvp_victims: HashMap<String, Vec<String>>,
    pub death_weapons: HashMap<String, u64>,
    pub death_by_players: HashMap<String, u64>,
    pub vehicle_kills: HashMap<String, u64>,
    pub vehicle_losses_by_player: HashMap<String, HashMap<String, u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub session: ScopeSummary,
    pub lifetime: ScopeSummary,
    pub session_start: DateTime<Utc>,
    pub session_id: String,
}

impl ScopeSummary {
    pub fn from_scope(stats: &ScopedStats, parents: &impl VehicleParents) -> Self {
        Self {
            session_id: stats.session_id.clone(),
            pve_kills: stats.pve_kills,
            pvp_kills: stats.pvp_kills,
            total_kills: stats.total_kills(),
            deaths: stats.deaths,
            pvp_deaths: stats.pvp_deaths(),
            kd_ratio: stats.kd_ratio(),
            weapon_kills: stats.weapon_kills.clone(),
            pvp_victims: stats.pvp_victims.clone(),
            death_weapons: stats.death_weapons.clone(),
            death_by_players: stats.death_by_players.clone(),
            vehicle_kills: aggregate_by_parent(&stats.vehicle_kills, parents),
            vehicle_losses_by_player: stats
                .vehicle_losses_by_player
                .iter()
                .map(|(player, vehicles)| (player.clone(), aggregate_by_parent(vehicles, parents)))
                .collect(),
        }
    }
}

fn aggregate_by_parent(
    counts: &HashMap<String, u64>,
    parents: &impl VehicleParents,
) -> HashMap<String, u64> {
    let mut aggregated: HashMap<String, u64> = HashMap::with_capacity(counts.len());
    for (vehicle, count) in counts {
        *aggregated.entry(parents.parent_of(vehicle)).or_default() += count;
    }
    aggregated
}
