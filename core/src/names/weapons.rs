use hashbrown::HashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use super::{NamesTable, strip_weapon_instance_id};
use crate::storage;

static NUMBER_RUN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"_\d+").ok());
static STORE_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"_(store|chromic|imp)\d+").ok());

const FILLER_TOKENS: &[&str] = &["none", "01", "02", "03", "store", "chromic", "imp"];

#[derive(Debug, Default, Serialize, Deserialize)]
struct WeaponFile {
    #[serde(default)]
    custom_names: HashMap<String, String>,
    #[serde(default)]
    blacklist: Vec<String>,
}

/// Weapon display names (custom > table > generated) and the kill blacklist.
#[derive(Debug, Clone, Default)]
pub struct WeaponNames {
    custom_names: HashMap<String, String>,
    blacklist: Vec<String>,
    table: Arc<NamesTable>,
    path: Option<PathBuf>,
}

impl WeaponNames {
    pub fn new(table: Arc<NamesTable>) -> Self {
        Self {
            table,
            ..Default::default()
        }
    }

    pub fn load(path: &Path, table: Arc<NamesTable>) -> Self {
        let file: WeaponFile = storage::load_or_default(Some(path));
        Self {
            custom_names: file.custom_names,
            blacklist: file.blacklist,
            table,
            path: Some(path.to_path_buf()),
        }
    }

    pub fn normalize(&self, weapon_full: &str) -> String {
        strip_weapon_instance_id(weapon_full).to_string()
    }

    pub fn display_name(&self, internal: &str) -> String {
        if let Some(custom) = self.custom_names.get(internal) {
            return custom.clone();
        }
        if let Some(name) = self.table.weapon_name(internal) {
            return name.to_string();
        }
        generated_name(internal)
    }

    pub fn set_custom_name(&mut self, internal: &str, display: &str) {
        self.custom_names
            .insert(internal.to_string(), display.to_string());
        self.save();
    }

    pub fn remove_custom_name(&mut self, internal: &str) -> bool {
        let removed = self.custom_names.remove(internal).is_some();
        if removed {
            self.save();
        }
        removed
    }

    pub fn is_blacklisted(&self, internal: &str) -> bool {
        self.blacklist.iter().any(|w| w == internal)
    }

    pub fn blacklist(&self) -> &[String] {
        &self.blacklist
    }

    pub fn add_to_blacklist(&mut self, internal: &str) -> bool {
        if self.is_blacklisted(internal) {
            return false;
        }
        self.blacklist.push(internal.to_string());
        self.save();
        true
    }

    pub fn remove_from_blacklist(&mut self, internal: &str) -> bool {
        let before = self.blacklist.len();
        self.blacklist.retain(|w| w != internal);
        let removed = self.blacklist.len() != before;
        if removed {
            self.save();
        }
        removed
    }

    /// Every known weapon with its display name: table entries, custom names,
    /// and generated names for `used` ids that appear nowhere else.
    pub fn all_weapons<'a>(&self, used: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
        let mut all: BTreeMap<String, String> = self
            .table
            .weapon_names()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        all.extend(self.custom_names.iter().map(|(k, v)| (k.clone(), v.clone())));
        for internal in used {
            all.entry(internal.to_string())
                .or_insert_with(|| generated_name(internal));
        }
        all
    }

    fn save(&self) {
        storage::persist(
            self.path.as_deref(),
            &WeaponFile {
                custom_names: self.custom_names.clone(),
                blacklist: self.blacklist.clone(),
            },
        );
    }
}

fn generated_name(internal: &str) -> String {
    let mut name = internal.to_string();
    if let Some(re) = NUMBER_RUN.as_ref() {
        name = re.replace_all(&name, "").into_owned();
    }
    if let Some(re) = STORE_TAG.as_ref() {
        name = re.replace_all(&name, "").into_owned();
    }

    let words: Vec<String> = name
        .split('_')
        .filter(|part| !part.is_empty())
        .filter(|part| !FILLER_TOKENS.contains(part))
        .filter(|part| !part.bytes().all(|b| b.is_ascii_digit()))
        .map(capitalize)
        .collect();

    if words.is_empty() {
        internal.to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapons() -> WeaponNames {
        let table = NamesTable::parse("item_Namebehr_rifle_ballistic_01=P4-AR Rifle");
        WeaponNames::new(Arc::new(table))
    }

    #[test]
    fn custom_name_beats_table_beats_generated() {
        let mut weapons = weapons();
        assert_eq!(weapons.display_name("behr_rifle_ballistic_01"), "P4-AR Rifle");
        assert_eq!(weapons.display_name("klwe_pistol_energy_01"), "Klwe Pistol Energy");

        weapons.set_custom_name("behr_rifle_ballistic_01", "My Rifle");
        assert_eq!(weapons.display_name("behr_rifle_ballistic_01"), "My Rifle");
    }

    #[test]
    fn generated_names_drop_store_tags_and_filler() {
        assert_eq!(generated_name("none_lmg_ballistic_01_store01"), "Lmg Ballistic");
        assert_eq!(generated_name("VehicleDestruction"), "Vehicledestruction");
        assert_eq!(generated_name("01_02"), "01_02");
    }

    #[test]
    fn blacklist_membership_is_exact() {
        let mut weapons = weapons();
        assert!(weapons.add_to_blacklist("Crash"));
        assert!(!weapons.add_to_blacklist("Crash"));
        assert!(weapons.is_blacklisted("Crash"));
        assert!(!weapons.is_blacklisted("crash"));
        assert!(weapons.remove_from_blacklist("Crash"));
        assert!(weapons.blacklist().is_empty());
    }

    #[test]
    fn listing_includes_used_weapons() {
        let weapons = weapons();
        let all = weapons.all_weapons(["klwe_pistol_energy_01"]);
        assert_eq!(all.get("behr_rifle_ballistic_01").map(String::as_str), Some("P4-AR Rifle"));
        assert_eq!(all.get("klwe_pistol_energy_01").map(String::as_str), Some("Klwe Pistol Energy"));
    }

    #[test]
    fn blacklist_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weapons_db.json");
        let mut weapons = WeaponNames::load(&path, Arc::default());
        weapons.add_to_blacklist("Suicide");

        let reloaded = WeaponNames::load(&path, Arc::default());
        assert!(reloaded.is_blacklisted("Suicide"));
    }
}
