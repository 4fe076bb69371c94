//! Raw snapshot storage (the Bronze layer).

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

/// A directory of raw provider payloads, one JSON file per fetch.
#[derive(Debug, Clone)]
pub struct BronzeStore {
    root: PathBuf,
}

impl BronzeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File name for a snapshot of `location_id` taken at `at`.
    pub fn file_name(location_id: &str, at: DateTime<Utc>) -> String {
        format!("weather_{}_{}.json", location_id, at.format("%Y%m%d_%H%M%S"))
    }

    /// Write `payload` as pretty JSON, creating the directory if needed.
    pub fn save(&self, location_id: &str, payload: &Value, at: DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).with_context(|| {
            format!("Failed to create bronze directory: {}", self.root.display())
        })?;

        let path = self.root.join(Self::file_name(location_id, at));
        let json = serde_json::to_string_pretty(payload)
            .context("Failed to serialize raw observation")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write bronze file: {}", path.display()))?;

        info!("Saved data to {}", path.display());
        Ok(path)
    }

    /// All regular files in the store, sorted by name. A store that does not
    /// exist yet is simply empty.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).with_context(|| {
            format!("Failed to read bronze directory: {}", self.root.display())
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("Failed to read entry in {}", self.root.display())
            })?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                files.push(entry.path());
            }
        }

        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_020_000, 0).unwrap()
    }

    #[test]
    fn file_name_embeds_location_and_timestamp() {
        assert_eq!(
            BronzeStore::file_name("tel_aviv_il", at()),
            "weather_tel_aviv_il_20231115_034640.json"
        );
    }

    #[test]
    fn save_creates_directory_and_round_trips_payload() {
        let dir = TempDir::new().unwrap();
        let store = BronzeStore::new(dir.path().join("bronze"));
        let payload = json!({"name": "TelAviv", "main": {"temp": 300.0}});

        let path = store.save("tel_aviv_il", &payload, at()).unwrap();

        let stored: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(stored, payload);
    }

    #[test]
    fn list_is_sorted_and_skips_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = BronzeStore::new(dir.path()).list().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = BronzeStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }
}
