//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a single TOML file shared by the bot and
//! the tools. Every section is optional; missing values fall back to built-in
//! defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--config`, `--root-folder`)
//! 2. Environment variables (`SGF_CONFIG`, `SGF_ROOT_FOLDER`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::catalog::NullBoundPolicy;
use crate::elements::ElementSet;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the TOML config file
pub const CONFIG_ENV_VAR: &str = "SGF_CONFIG";

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "SGF_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the catalog database and activity logs
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub activity: ActivityConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Catalog storage and interpretation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// SQLite database file, relative to the root folder unless absolute
    #[serde(default = "default_database_file")]
    pub database_file: PathBuf,

    /// Elements whose `_min`/`_max` columns an import must supply
    ///
    /// When absent, the import infers the element set from the header.
    #[serde(default)]
    pub tracked_elements: Option<Vec<String>>,

    #[serde(default)]
    pub null_bound_policy: NullBoundPolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
            tracked_elements: None,
            null_bound_policy: NullBoundPolicy::default(),
        }
    }
}

impl CatalogConfig {
    /// Configured required element set, if any
    pub fn required_elements(&self) -> Result<Option<ElementSet>> {
        self.tracked_elements
            .as_ref()
            .map(|symbols| {
                ElementSet::new(symbols.iter().cloned())
                    .map_err(|e| Error::Config(format!("catalog.tracked_elements: {}", e)))
            })
            .transpose()
    }
}

/// Composition input mode offered to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// All elements shown at once, edited in any order (pre-filled with 0.0)
    #[default]
    Grid,
    /// One element at a time, each value confirmed before moving on
    Guided,
}

/// Bot service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Mode used by `/find`
    #[serde(default)]
    pub input_mode: InputMode,

    /// Minimum delay between two broadcast sends
    #[serde(default = "default_broadcast_pacing_ms")]
    pub broadcast_pacing_ms: u64,

    /// Outbound message webhook of the chat transport
    #[serde(default)]
    pub outbound_url: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            input_mode: InputMode::default(),
            broadcast_pacing_ms: default_broadcast_pacing_ms(),
            outbound_url: None,
        }
    }
}

/// Activity log location and aggregation threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Directory of activity log files, relative to the root folder unless absolute
    #[serde(default = "default_activity_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Searches needed for a user to count as active
    #[serde(default = "default_min_uses")]
    pub min_uses: usize,

    #[serde(default = "default_export_file")]
    pub export_file: PathBuf,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            log_dir: default_activity_dir(),
            file_prefix: default_file_prefix(),
            min_uses: default_min_uses(),
            export_file: default_export_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_database_file() -> PathBuf {
    PathBuf::from("steel_database.db")
}

fn default_port() -> u16 {
    5790
}

fn default_broadcast_pacing_ms() -> u64 {
    100
}

fn default_activity_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_file_prefix() -> String {
    "steel_bot_".to_string()
}

fn default_min_uses() -> usize {
    5
}

fn default_export_file() -> PathBuf {
    PathBuf::from("active_users.json")
}

impl TomlConfig {
    /// Load configuration with graceful degradation
    ///
    /// File location priority: `explicit` → `SGF_CONFIG` → OS config dir
    /// (`<config_dir>/sgf/config.toml`). A missing file yields defaults with a
    /// warning; an unreadable or malformed file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::var(CONFIG_ENV_VAR)
                .ok()
                .map(PathBuf::from)
                .or_else(default_config_path),
        };

        match path {
            Some(path) if path.exists() => {
                let config = Self::from_file(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Some(path) => {
                warn!(
                    "Config file not found at {}, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config file location available, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Resolve the root folder
    ///
    /// Priority: `cli_arg` → `SGF_ROOT_FOLDER` → TOML `root_folder` → OS default.
    pub fn resolve_root_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.root_folder {
            return path.clone();
        }

        default_root_folder()
    }

    /// Catalog database path under `root_folder`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.catalog.database_file)
    }

    /// Activity log directory under `root_folder`
    pub fn activity_dir(&self, root_folder: &Path) -> PathBuf {
        root_folder.join(&self.activity.log_dir)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sgf").join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sgf"))
        .unwrap_or_else(|| PathBuf::from("./sgf_data"))
}
