//! Session and lifetime counters.
//!
//! Every mutation lands in both scopes at once and the store is flushed after
//! each call. Discarding a session subtracts exactly what it added.

mod scoped;
mod snapshot;

#[cfg(test)]
mod tests;

pub use scoped::{Reclassified, ScopedStats};
pub(crate) use scoped::round2;
pub use snapshot::{ScopeSummary, StatsSnapshot};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::identity::NpcClassifier;
use crate::names::VehicleParents;
use crate::storage;

#[derive(Debug, Deserialize)]
struct StatsFile {
    #[serde(default)]
    session_start: Option<DateTime<Utc>>,
    #[serde(default)]
    session: ScopedStats,
    #[serde(default, rename = "total")]
    lifetime: ScopedStats,
}

#[derive(Serialize)]
struct StatsFileRef<'a> {
    last_updated: DateTime<Utc>,
    session_start: DateTime<Utc>,
    session: &'a ScopedStats,
    #[serde(rename = "total")]
    lifetime: &'a ScopedStats,
}

#[derive(Debug, Clone)]
pub struct StatsStore {
    session: ScopedStats,
    lifetime: ScopedStats,
    session_start: DateTime<Utc>,
    path: Option<PathBuf>,
}

impl Default for StatsStore {
    fn default() -> Self {
        Self::ephemeral()
    }
}

impl StatsStore {
    /// Empty store that is never written to disk.
    pub fn ephemeral() -> Self {
        Self {
            session: ScopedStats::default(),
            lifetime: ScopedStats::default(),
            session_start: Utc::now(),
            path: None,
        }
    }

    pub fn load(path: &Path) -> Self {
        let mut store = Self {
            path: Some(path.to_path_buf()),
            ..Self::ephemeral()
        };
        match storage::read_json::<StatsFile>(path) {
            Ok(Some(file)) => {
                store.session = file.session;
                store.lifetime = file.lifetime;
                if let Some(start) = file.session_start {
                    store.session_start = start;
                }
                tracing::debug!(
                    path = %path.display(),
                    lifetime_kills = store.lifetime.total_kills(),
                    "Loaded stats"
                );
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to load stats, starting empty"),
        }
        store
    }

    pub fn session(&self) -> &ScopedStats {
        &self.session
    }

    pub fn lifetime(&self) -> &ScopedStats {
        &self.lifetime
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    pub fn session_id(&self) -> &str {
        &self.session.session_id
    }

    pub fn set_session_id(&mut self, id: &str) {
        self.session.session_id = id.to_string();
        self.save();
    }

    pub fn record_kill(&mut self, is_pvp: bool, weapon: &str, victim: Option<&str>) {
        for scope in [&mut self.session, &mut self.lifetime] {
            scope.add_kill(is_pvp, weapon, victim);
        }
        self.save();
    }

    pub fn record_death(&mut self, weapon: &str, killer: Option<&str>) {
        for scope in [&mut self.session, &mut self.lifetime] {
            scope.add_death(weapon, killer);
        }
        self.save();
    }

    pub fn record_vehicle_kill(&mut self, vehicle: &str) {
        for scope in [&mut self.session, &mut self.lifetime] {
            scope.add_vehicle_kill(vehicle);
        }
        self.save();
    }

    pub fn record_vehicle_loss(&mut self, vehicle: &str, destroyer: &str) {
        for scope in [&mut self.session, &mut self.lifetime] {
            scope.add_vehicle_loss(vehicle, destroyer);
        }
        self.save();
    }

    /// Start a fresh session. With `discard`, everything the old session
    /// added is also taken back out of the lifetime totals.
    pub fn reset_session(&mut self, discard: bool) {
        let old = std::mem::take(&mut self.session);
        if discard {
            self.lifetime.subtract(&old);
        }
        self.session_start = Utc::now();
        tracing::info!(discard, kills = old.total_kills(), deaths = old.deaths, "Session reset");
        self.save();
    }

    /// Re-evaluate stored names against the current patterns in both scopes.
    pub fn reclassify(&mut self, npcs: &NpcClassifier) -> Reclassified {
        let mut result = self.session.reclassify(npcs);
        result += self.lifetime.reclassify(npcs);
        if !result.is_empty() {
            tracing::info!(
                kills_moved = result.kills_moved,
                attributions_dropped = result.attributions_dropped,
                "Reclassified stats"
            );
        }
        self.save();
        result
    }

    pub fn snapshot(&self, parents: &impl VehicleParents) -> StatsSnapshot {
        StatsSnapshot {
            session: ScopeSummary::from_scope(&self.session, parents),
            lifetime: ScopeSummary::from_scope(&self.lifetime, parents),
            session_start: self.session_start,
            session_id: self.session.session_id.clone(),
        }
    }

    /// Weapon ids seen in lifetime kills or deaths.
    pub fn used_weapons(&self) -> Vec<&str> {
        let mut used: Vec<&str> = self
            .lifetime
            .weapon_kills
            .keys()
            .chain(self.lifetime.death_weapons.keys())
            .map(String::as_str)
            .collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    /// Vehicle ids seen in lifetime vehicle kills or losses.
    pub fn used_vehicles(&self) -> Vec<&str> {
        let mut used: Vec<&str> = self
            .lifetime
            .vehicle_kills
            .keys()
            .chain(
                self.lifetime
                    .vehicle_losses_by_player
                    .values()
                    .flat_map(|vehicles| vehicles.keys()),
            )
            .map(String::as_str)
            .collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    fn save(&self) {
        storage::persist(
            self.path.as_deref(),
            &StatsFileRef {
                last_updated: Utc::now(),
                session_start: self.session_start,
                session: &self.session,
                lifetime: &self.lifetime,
            },
        );
    }
}
