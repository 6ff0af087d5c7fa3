use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub store: StoreConfig,

    pub catalog: CatalogConfig,

    pub library: LibraryConfig,

    pub aligner: AlignerConfig,

    pub transfers: TransferConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertMode {
    /// The stored document is replaced wholesale by the new one.
    #[default]
    Replace,
    /// Episodes missing from the new document are carried over from the stored one.
    Merge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: String,

    pub max_connections: u32,

    pub min_connections: u32,

    pub upsert_mode: UpsertMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/moonarr.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            upsert_mode: UpsertMode::Replace,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub csv_path: String,

    pub api_base_url: String,

    /// Hosting API key. `FILEMOON_API_KEY` in the environment takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub page_size: u32,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            csv_path: constants::catalog::DEFAULT_CSV_PATH.to_string(),
            api_base_url: constants::hosting::API_BASE_URL.to_string(),
            api_key: None,
            page_size: constants::catalog::PAGE_SIZE,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub downloads_path: String,

    pub subtitle_extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            downloads_path: "downloads".to_string(),
            subtitle_extensions: constants::SUBTITLE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionalFallback {
    /// Enabled for anime shows, whose catalog entries carry no season/episode tags.
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub positional_fallback: PositionalFallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub max_concurrent: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_concurrent: constants::transfers::DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = paths
            .iter()
            .find(|path| path.exists())
            .map_or_else(
                || {
                    info!("No config file found, using defaults");
                    Ok(Self::default())
                },
                |path| {
                    info!("Loading config from: {}", path.display());
                    Self::load_from_path(path)
                },
            )?;

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Values from the process environment (and a `.env` file, if present) win over the file.
    pub fn apply_env_overrides(&mut self) {
        let _ = dotenvy::dotenv();

        if let Ok(key) = std::env::var("FILEMOON_API_KEY")
            && !key.trim().is_empty()
        {
            self.catalog.api_key = Some(key.trim().to_string());
        }

        if let Ok(db) = std::env::var("MOONARR_DATABASE")
            && !db.trim().is_empty()
        {
            self.store.database_path = db.trim().to_string();
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("moonarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".moonarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.transfers.max_concurrent == 0 {
            anyhow::bail!("transfers.max_concurrent must be > 0");
        }

        if self.catalog.csv_path.trim().is_empty() {
            anyhow::bail!("catalog.csv_path cannot be empty");
        }

        if self.catalog.page_size == 0 {
            anyhow::bail!("catalog.page_size must be > 0");
        }

        if self.store.min_connections > self.store.max_connections {
            anyhow::bail!("store.min_connections cannot exceed store.max_connections");
        }

        Ok(())
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.catalog.api_key.as_deref().filter(|k| !k.is_empty())
    }
}
