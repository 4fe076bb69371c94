use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{model::Location, provider::RetryPolicy, provider::openweather::DEFAULT_BASE_URL};

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Placeholder shipped in sample configs; treated as "no key".
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// OpenWeather endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// `metric`, `imperial` or `standard`.
    pub units: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            units: "metric".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bronze_path: PathBuf,
    pub silver_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bronze_path: PathBuf::from("data/bronze"),
            silver_path: PathBuf::from("data/silver"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// api_key = "..."
///
/// [[locations]]
/// city = "Tel Aviv"
/// country = "IL"
///
/// [storage]
/// bronze_path = "data/bronze"
/// silver_path = "data/silver"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub locations: Vec<Location>,
    pub storage: StorageConfig,
    pub ingestion: IngestionConfig,
}

impl Config {
    /// Load config from the platform config directory, or defaults on first run.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load config from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-pipeline", "weather-pipeline")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Pick up `OPENWEATHER_API_KEY` from the process environment or a
    /// `.env` file in the working directory.
    pub fn apply_env(&mut self) {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        self.override_api_key(std::env::var(API_KEY_ENV).ok());
    }

    /// A non-empty override replaces whatever the file said.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api.api_key = Some(api_key);
    }

    /// The API key, unless it is missing, blank or the sample placeholder.
    pub fn api_key(&self) -> Option<&str> {
        self.api
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != API_KEY_PLACEHOLDER)
    }

    /// Add a location unless an identical one is already configured.
    pub fn add_location(&mut self, location: Location) -> bool {
        if self.locations.contains(&location) {
            return false;
        }
        self.locations.push(location);
        true
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.ingestion.retry_attempts,
            delay: Duration::from_secs(self.ingestion.retry_delay_secs),
        }
    }
}
