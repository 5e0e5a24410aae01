use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable consulted when `catalog.api_key` is empty.
pub const API_KEY_ENV: &str = "TMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub scan: ScanConfig,
    pub catalog: CatalogConfig,
    pub rights: RightsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub base_url: String,
    pub adapter: AdapterKind,
    pub listing_pages: u32,
    #[serde(default)]
    pub max_items: Option<usize>,
}

/// Which site adapter drives listing discovery and episode enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    Listing,
    SeriesIndex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub request_timeout_secs: u64,
    pub page_delay_ms: u64,
    pub item_delay_ms: u64,
    pub max_episodes: usize,
    pub max_pages_per_item: usize,
    pub redirect_timeout_secs: u64,
    pub redirect_settle_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RightsConfig {
    pub company_ids: Vec<u64>,
    pub network_ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: Option<PathBuf>,
}

impl ScanConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }

    pub fn redirect_timeout(&self) -> Duration {
        Duration::from_secs(self.redirect_timeout_secs)
    }

    pub fn redirect_settle(&self) -> Duration {
        Duration::from_millis(self.redirect_settle_ms)
    }
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, ScanError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::from_toml_str("")
        }
    }

    /// Load a specific config file, merged over built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self, ScanError> {
        let user_str =
            std::fs::read_to_string(path).map_err(|e| ScanError::Config(e.to_string()))?;
        Self::from_toml_str(&user_str)
    }

    /// Parse a (possibly partial) TOML document and merge it over the defaults.
    pub fn from_toml_str(user_str: &str) -> Result<Self, ScanError> {
        let mut merged: toml::Table =
            toml::from_str(DEFAULT_CONFIG).map_err(|e| ScanError::Config(e.to_string()))?;
        let user: toml::Table =
            toml::from_str(user_str).map_err(|e| ScanError::Config(e.to_string()))?;
        merge_tables(&mut merged, user);

        let config: AppConfig = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| ScanError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ScanError> {
        url::Url::parse(&self.site.base_url)
            .map_err(|e| ScanError::Config(format!("site.base_url: {e}")))?;
        if self.scan.max_pages_per_item == 0 {
            return Err(ScanError::Config("scan.max_pages_per_item must be > 0".into()));
        }
        Ok(())
    }

    /// The catalog API key, falling back to the environment.
    pub fn api_key(&self) -> Option<String> {
        if !self.catalog.api_key.is_empty() {
            return Some(self.catalog.api_key.clone());
        }
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }

    /// Identifier of the scanned website stored with each persisted link.
    pub fn website(&self) -> String {
        url::Url::parse(&self.site.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.site.base_url.clone())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the database file: configured path or the platform data dir.
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.db_path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|d| d.data_dir().join("claimscout.db"))
            .unwrap_or_else(|| PathBuf::from("claimscout.db"))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path(&self) -> Result<PathBuf, ScanError> {
        let path = self.db_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "claimscout")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` onto `base`. Nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
