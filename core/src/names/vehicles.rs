use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{NamesTable, strip_vehicle_instance_id};
use crate::storage;

/// Variant suffixes that usually sit on top of a base hull. Only the first
/// matching suffix is tried before falling back to the underscore search.
const EVENT_SUFFIXES: &[&str] = &[
    "_PU_AI_NT",
    "_PU_AI_CRIM",
    "_PU_AI",
    "_NT",
    "_NonLethal",
    "_QIG",
    "_Event",
    "_Temp",
    "_Stealth",
];

/// Placeholder names the game uses before an entity is resolved.
const PASSTHROUGH_PREFIXES: &[&str] = &["Default_", "Unknown_"];

/// Maps a vehicle to the name its statistics are aggregated under.
pub trait VehicleParents {
    fn parent_of(&self, vehicle: &str) -> String;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VehicleFile {
    #[serde(default)]
    custom_names: HashMap<String, String>,
    #[serde(default)]
    parent_vehicles: HashMap<String, String>,
}

/// A base hull found in the names table for a variant.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BaseMatch {
    internal: String,
    display: String,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleNames {
    custom_names: HashMap<String, String>,
    parent_vehicles: HashMap<String, String>,
    table: Arc<NamesTable>,
    path: Option<PathBuf>,
}

impl VehicleNames {
    pub fn new(table: Arc<NamesTable>) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    pub fn load(path: &Path, table: Arc<NamesTable>) -> Self {
        let file: VehicleFile = storage::load_or_default(Some(path));
        Self {
            custom_names: file.custom_names,
            parent_vehicles: file.parent_vehicles,
            table,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn normalize(&self, full_name: &str) -> String {
        strip_vehicle_instance_id(full_name).to_string()
    }

    /// Custom name, then exact table entry, then the base hull's name, then
    /// the first three underscore-separated parts.
    pub fn display_name(&self, internal: &str) -> String {
        let normalized = strip_vehicle_instance_id(internal);
        if is_passthrough(normalized) {
            return normalized.to_string();
        }
        if let Some(custom) = self.custom_names.get(normalized) {
            return custom.clone();
        }
        if let Some(name) = self.table.vehicle_name(normalized) {
            return name.to_string();
        }
        match self.find_base(normalized) {
            Some(base) => base.display,
            None => generated_name(normalized),
        }
    }

    /// Resolve the aggregation parent and remember it when a base hull was
    /// found, so later lookups don't search again.
    pub fn discover_parent(&mut self, internal: &str) -> String {
        let normalized = strip_vehicle_instance_id(internal).to_string();
        if let Some(parent) = self.parent_vehicles.get(&normalized) {
            return parent.clone();
        }
        if is_passthrough(&normalized) || self.table.vehicle_name(&normalized).is_some() {
            return normalized;
        }
        match self.find_base(&normalized) {
            Some(base) => {
                tracing::debug!(vehicle = %normalized, parent = %base.internal, "Discovered vehicle parent");
                self.custom_names.insert(normalized.clone(), base.display);
                self.parent_vehicles
                    .insert(normalized, base.internal.clone());
                self.save();
                base.internal
            }
            None => normalized,
        }
    }

    pub fn set_custom_name(&mut self, internal: &str, display: &str) {
        let normalized = self.normalize(internal);
        self.custom_names.insert(normalized, display.to_string());
        self.save();
    }

    /// An empty `parent` pins the vehicle to itself.
    pub fn set_parent_vehicle(&mut self, internal: &str, parent: &str) -> String {
        let normalized = self.normalize(internal);
        let parent = parent.trim();
        let parent = if parent.is_empty() {
            normalized.clone()
        } else {
            self.normalize(parent)
        };
        tracing::info!(vehicle = %normalized, parent = %parent, "Set vehicle parent");
        self.parent_vehicles.insert(normalized, parent.clone());
        self.save();
        parent
    }

    pub fn all_vehicles<'a>(&self, used: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
        let mut all: BTreeMap<String, String> = self
            .table
            .vehicle_names()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        all.extend(self.custom_names.iter().map(|(k, v)| (k.clone(), v.clone())));
        for internal in used {
            let normalized = strip_vehicle_instance_id(internal);
            all.entry(normalized.to_string())
                .or_insert_with(|| generated_name(normalized));
        }
        all
    }

    fn find_base(&self, normalized: &str) -> Option<BaseMatch> {
        if let Some(suffix) = EVENT_SUFFIXES.iter().find(|s| normalized.ends_with(*s)) {
            let candidate = &normalized[..normalized.len() - suffix.len()];
            if let Some(display) = self.table.vehicle_name(candidate) {
                return Some(BaseMatch {
                    internal: candidate.to_string(),
                    display: display.to_string(),
                });
            }
        }

        let parts: Vec<&str> = normalized.split('_').collect();
        if parts.len() <= 2 {
            return None;
        }
        (2..parts.len()).rev().find_map(|i| {
            let shortened = parts[..i].join("_");
            let display = self.table.vehicle_name(&shortened)?.to_string();
            Some(BaseMatch {
                internal: shortened,
                display,
            })
        })
    }

    fn save(&self) {
        if self.custom_names.is_empty() && self.parent_vehicles.is_empty() {
            return;
        }
        storage::persist(
            self.path.as_deref(),
            &VehicleFile {
                custom_names: self.custom_names.clone(),
                parent_vehicles: self.parent_vehicles.clone(),
            },
        );
    }
}

impl VehicleParents for VehicleNames {
    /// Stored parent, else the base hull if one exists, else the vehicle itself.
    fn parent_of(&self, vehicle: &str) -> String {
        let normalized = strip_vehicle_instance_id(vehicle);
        if let Some(parent) = self.parent_vehicles.get(normalized) {
            return parent.clone();
        }
        if is_passthrough(normalized) || self.table.vehicle_name(normalized).is_some() {
            return normalized.to_string();
        }
        self.find_base(normalized)
            .map(|base| base.internal)
            .unwrap_or_else(|| normalized.to_string())
    }
}

fn is_passthrough(name: &str) -> bool {
    PASSTHROUGH_PREFIXES.iter().any(|p| name.starts_with(p))
}

fn generated_name(normalized: &str) -> String {
    normalized.split('_').take(3).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INI: &str = "\
vehicle_NameDRAK_Cutlass_Black=Drake Cutlass Black
vehicle_NameANVL_Arrow=Anvil Arrow
vehicle_NameMISC_Prospector=MISC Prospector
";

    fn vehicles() -> VehicleNames {
        VehicleNames::new(Arc::new(NamesTable::parse(INI)))
    }

    #[test]
    fn event_suffix_resolves_to_base_hull() {
        let vehicles = vehicles();
        assert_eq!(vehicles.display_name("ANVL_Arrow_PU_AI_CRIM_1234567890123"), "Anvil Arrow");
        assert_eq!(vehicles.parent_of("ANVL_Arrow_PU_AI_CRIM"), "ANVL_Arrow");
    }

    #[test]
    fn backward_search_handles_stacked_suffixes() {
        let vehicles = vehicles();
        assert_eq!(
            vehicles.display_name("DRAK_Cutlass_Black_PU_AI_CRIM_QIG_7232617732776"),
            "Drake Cutlass Black"
        );
        assert_eq!(vehicles.parent_of("MISC_Prospector_Mining_X"), "MISC_Prospector");
    }

    #[test]
    fn unknown_vehicles_fall_back_to_first_three_parts() {
        let vehicles = vehicles();
        assert_eq!(vehicles.display_name("RSI_Aurora_MR_Wrecked"), "RSI Aurora MR");
        assert_eq!(vehicles.parent_of("RSI_Aurora_MR_Wrecked"), "RSI_Aurora_MR_Wrecked");
        assert_eq!(vehicles.display_name("Default_9876"), "Default_9876");
    }

    #[test]
    fn display_name_does_not_record_parents() {
        let mut vehicles = vehicles();
        vehicles.display_name("ANVL_Arrow_QIG");
        assert!(vehicles.parent_vehicles.is_empty());

        assert_eq!(vehicles.discover_parent("ANVL_Arrow_QIG"), "ANVL_Arrow");
        assert_eq!(
            vehicles.parent_vehicles.get("ANVL_Arrow_QIG").map(String::as_str),
            Some("ANVL_Arrow")
        );
        assert_eq!(
            vehicles.custom_names.get("ANVL_Arrow_QIG").map(String::as_str),
            Some("Anvil Arrow")
        );
    }

    #[test]
    fn manual_parent_overrides_and_empty_means_self() {
        let mut vehicles = vehicles();
        vehicles.set_parent_vehicle("ANVL_Arrow_QIG", "");
        assert_eq!(vehicles.parent_of("ANVL_Arrow_QIG"), "ANVL_Arrow_QIG");

        vehicles.set_parent_vehicle("RSI_Aurora_MR_1234567890123", "ANVL_Arrow");
        assert_eq!(vehicles.parent_of("RSI_Aurora_MR"), "ANVL_Arrow");
    }

    #[test]
    fn discovered_parents_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vehicles_db.json");
        let table = Arc::new(NamesTable::parse(INI));

        let mut vehicles = VehicleNames::load(&path, table);
        vehicles.discover_parent("DRAK_Cutlass_Black_NT");

        let reloaded = VehicleNames::load(&path, Arc::default());
        assert_eq!(reloaded.parent_of("DRAK_Cutlass_Black_NT"), "DRAK_Cutlass_Black");
        assert_eq!(reloaded.display_name("DRAK_Cutlass_Black_NT"), "Drake Cutlass Black");
    }
}
