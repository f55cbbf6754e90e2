use hashbrown::HashMap;
use std::fs;
use std::path::Path;

use super::strip_weapon_instance_id;

const WEAPON_KEY_PREFIX: &str = "item_Name";
const VEHICLE_KEY_PREFIX: &str = "vehicle_Name";

/// Fallback display names read from an `internalNames.ini` style file.
///
/// Lines are `key=value`; keys are `item_Name<weapon>` or `vehicle_Name<vehicle>`.
/// Lines starting with `#` are comments.
#[derive(Debug, Clone, Default)]
pub struct NamesTable {
    names: HashMap<String, String>,
}

impl NamesTable {
    /// Load the table. A missing or unreadable file yields an empty table.
    pub fn load(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => {
                let (text, _, _) = encoding_rs::UTF_8.decode(&bytes);
                let table = Self::parse(&text);
                tracing::info!(path = %path.display(), count = table.len(), "Loaded name table");
                table
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Name table not found, using generated names");
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with('#'))
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn weapon_name(&self, internal: &str) -> Option<&str> {
        let key = format!("{}{}", WEAPON_KEY_PREFIX, strip_weapon_instance_id(internal));
        self.names.get(&key).map(String::as_str)
    }

    /// Exact matches only; suffix and prefix searches live in `VehicleNames`.
    pub fn vehicle_name(&self, internal: &str) -> Option<&str> {
        let key = format!("{}{}", VEHICLE_KEY_PREFIX, internal);
        self.names.get(&key).map(String::as_str)
    }

    pub fn weapon_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.with_prefix(WEAPON_KEY_PREFIX)
    }

    pub fn vehicle_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.with_prefix(VEHICLE_KEY_PREFIX)
    }

    fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.names
            .iter()
            .filter_map(move |(k, v)| Some((k.strip_prefix(prefix)?, v.as_str())))
    }
}
