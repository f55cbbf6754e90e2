//! JSON state files.
//!
//! Every persisted structure (stats, cursor, player book, lookup tables) is a
//! pretty-printed JSON document. Writes go to a sibling `.tmp` file first and
//! are renamed into place so a crash mid-write never leaves a torn file.

mod error;

pub use error::StorageError;

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the data directory (used by tests and portable installs).
pub const DATA_DIR_ENV: &str = "VCL_DATA_DIR";

/// Get the data directory, creating it if it doesn't exist.
/// Defaults to `~/.local/share/vcl/` (or the platform equivalent).
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vcl"),
    };

    fs::create_dir_all(&base).map_err(|source| StorageError::CreateDir {
        path: base.clone(),
        source,
    })?;
    Ok(base)
}

/// File name of a per-source state file, e.g. `stats_live.json`.
pub fn source_file(prefix: &str, source: &str) -> String {
    format!("{}_{}.json", prefix, source.to_lowercase())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a JSON document. A missing file is `Ok(None)`, not an error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StorageError::Deserialize {
            path: path.to_path_buf(),
            source,
        })
}

/// Persist and log on failure. In-memory state stays authoritative; the next
/// successful write restores durability.
pub(crate) fn persist<T: Serialize>(path: Option<&Path>, value: &T) {
    let Some(path) = path else { return };
    if let Err(e) = write_json(path, value) {
        tracing::warn!(error = %e, path = %path.display(), "Failed to persist state");
    }
}

/// Load a JSON document, falling back to `T::default()` when it is missing or unreadable.
pub(crate) fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> T {
    let Some(path) = path else {
        return T::default();
    };
    match read_json(path) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Failed to load state, starting empty");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Sample {
        value: u32,
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let result: Option<Sample> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sample.json");
        write_json(&path, &Sample { value: 7 }).unwrap();

        let loaded: Sample = load_or_default(Some(&path));
        assert_eq!(loaded, Sample { value: 7 });
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            read_json::<Sample>(&path),
            Err(StorageError::Deserialize { .. })
        ));
        let loaded: Sample = load_or_default(Some(&path));
        assert_eq!(loaded, Sample::default());
    }

    #[test]
    fn source_file_names_are_lowercase() {
        assert_eq!(source_file("stats", "TECH-PREVIEW"), "stats_tech-preview.json");
    }
}
