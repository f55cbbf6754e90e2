use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::NpcClassifier;
use crate::names::{NamesTable, VehicleNames, WeaponNames};

pub const NAMES_TABLE_FILE: &str = "internalNames.ini";
pub const NPC_FILE: &str = "npc_db.json";
pub const WEAPONS_FILE: &str = "weapons_db.json";
pub const VEHICLES_FILE: &str = "vehicles_db.json";

/// Lookup tables shared by every tracked source. Built once at startup and
/// handed to each tracker.
///
/// Guards are never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    npcs: Arc<RwLock<NpcClassifier>>,
    weapons: Arc<RwLock<WeaponNames>>,
    vehicles: Arc<RwLock<VehicleNames>>,
}

impl Lookups {
    pub fn load(data_dir: &Path) -> Self {
        let table = Arc::new(NamesTable::load(&data_dir.join(NAMES_TABLE_FILE)));
        Self::new(
            NpcClassifier::load(&data_dir.join(NPC_FILE)),
            WeaponNames::load(&data_dir.join(WEAPONS_FILE), table.clone()),
            VehicleNames::load(&data_dir.join(VEHICLES_FILE), table),
        )
    }

    pub fn new(npcs: NpcClassifier, weapons: WeaponNames, vehicles: VehicleNames) -> Self {
        Self {
            npcs: Arc::new(RwLock::new(npcs)),
            weapons: Arc::new(RwLock::new(weapons)),
            vehicles: Arc::new(RwLock::new(vehicles)),
        }
    }

    pub fn npcs(&self) -> RwLockReadGuard<'_, NpcClassifier> {
        self.npcs.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn npcs_mut(&self) -> RwLockWriteGuard<'_, NpcClassifier> {
        self.npcs.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn weapons(&self) -> RwLockReadGuard<'_, WeaponNames> {
        self.weapons.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn weapons_mut(&self) -> RwLockWriteGuard<'_, WeaponNames> {
        self.weapons.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn vehicles(&self) -> RwLockReadGuard<'_, VehicleNames> {
        self.vehicles.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn vehicles_mut(&self) -> RwLockWriteGuard<'_, VehicleNames> {
        self.vehicles.write().unwrap_or_else(|e| e.into_inner())
    }
}
