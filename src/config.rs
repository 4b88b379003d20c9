//! Configuration module for the routing and similarity engine.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.vecroute/settings.toml`, searched upward)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `VR_` and use double underscores
//! to separate nested levels:
//! - `VR_STORE__DIMENSION=384` sets `store.dimension`
//! - `VR_CLASSIFIER__THRESHOLD=0.7` sets `classifier.threshold`
//! - `VR_LOGGING__LEVEL=debug` sets `logging.level`

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::routing::{ClassifierConfig, DispatchConfig};
use crate::vector::{Dimension, StoreOptions, UpsertMode, VectorError};

/// Name of the per-workspace configuration directory.
pub const CONFIG_DIR: &str = ".vecroute";

/// File name of the settings file inside `CONFIG_DIR`.
pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .vecroute is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Vector store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Route classification settings
    #[serde(default)]
    pub classifier: ClassifierSettings,

    /// Intent → pipeline table
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Store directory, relative to the workspace root unless absolute
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Embedding dimension produced by the encoder
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// How repeated keys are treated
    #[serde(default)]
    pub upsert_mode: UpsertMode,

    /// Default timeout for store operations, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Default number of matches returned by queries
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Sync data to disk before acknowledging writes
    #[serde(default = "default_true")]
    pub sync_writes: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClassifierSettings {
    /// Threshold and fallback route, read from the same `[classifier]` table
    #[serde(flatten)]
    pub policy: ClassifierConfig,

    /// Pre-encoded route corpus (JSON)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set (e.g. "warn", "vecroute=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_version() -> u32 {
    1
}
fn default_store_path() -> PathBuf {
    PathBuf::from(".vecroute/store")
}
fn default_dimension() -> usize {
    1536
}
fn default_timeout_ms() -> u64 {
    5_000
}
fn default_top_k() -> usize {
    5
}
fn default_true() -> bool {
    true
}
fn default_corpus_path() -> PathBuf {
    PathBuf::from(".vecroute/corpus.json")
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            store: StoreConfig::default(),
            classifier: ClassifierSettings::default(),
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            dimension: default_dimension(),
            upsert_mode: UpsertMode::default(),
            timeout_ms: default_timeout_ms(),
            default_top_k: default_top_k(),
            sync_writes: default_true(),
        }
    }
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            policy: ClassifierConfig::default(),
            corpus_path: default_corpus_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Options for `VectorStore::open`. Fails on a zero dimension.
    pub fn options(&self) -> Result<StoreOptions, VectorError> {
        Ok(StoreOptions::new(Dimension::new(self.dimension)?)
            .with_mode(self.upsert_mode)
            .with_timeout(self.timeout())
            .with_sync_writes(self.sync_writes))
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(SETTINGS_FILE));

        Self::figment(config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores stay.
            .merge(Env::prefixed("VR_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for a .vecroute directory
    /// from the current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Get the workspace root directory (where .vecroute is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Store directory resolved against the workspace root.
    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store.path)
    }

    /// Corpus file resolved against the workspace root.
    pub fn corpus_path(&self) -> PathBuf {
        self.resolve(&self.classifier.corpus_path)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Create a default settings file under `root/.vecroute`
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let body = toml::to_string_pretty(&Settings::default())?;
        let template = format!(
            "# vecroute configuration\n\
             #\n\
             # Every value can be overridden with VR_<SECTION>__<KEY>, e.g.\n\
             # VR_STORE__DIMENSION=384 or VR_CLASSIFIER__THRESHOLD=0.7\n\
             #\n\
             # store.dimension must match the encoder. Changing it requires a new store.path.\n\
             # store.upsert_mode is \"append\" (every row ranks) or \"replace\" (latest row per key).\n\n\
             {body}"
        );
        std::fs::write(&config_path, template)?;

        Ok(config_path)
    }
}
