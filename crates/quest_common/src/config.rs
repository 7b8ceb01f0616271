//! Questline Configuration v0.1.0
//!
//! Configuration lives in `$QL_CONFIG`, else `~/.config/questline/config.toml`.
//! A missing file yields defaults.
//!
//! Database location: `$QL_DB_PATH` > `storage.db_path` > `~/.questline.db`

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides the config file location
pub const CONFIG_ENV: &str = "QL_CONFIG";
/// Overrides the database location
pub const DB_PATH_ENV: &str = "QL_DB_PATH";

const CONFIG_DIR: &str = "questline";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_DB_FILE: &str = ".questline.db";

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Explicit database file; unset means `~/.questline.db`
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// tracing filter directive (RUST_LOG wins when set)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl QuestConfig {
    /// Load from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path`. A missing file is not an error; a malformed one is.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Database path: `$QL_DB_PATH`, then `storage.db_path`, then `~/.questline.db`
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        let env_path = std::env::var(DB_PATH_ENV).ok();
        self.resolve_db_path_with(env_path.as_deref())
    }

    fn resolve_db_path_with(&self, env_path: Option<&str>) -> Result<PathBuf> {
        if let Some(path) = env_path.map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = &self.storage.db_path {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_DB_FILE))
            .ok_or_else(|| EngineError::Config("cannot determine home directory".to_string()))
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}
