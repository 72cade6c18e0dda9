/*
 * Application configuration: window geometry, how long the "Saved!" notification
 * stays visible, the undo history cap, and the folder the last document was opened
 * from. Settings are stored as JSON in the per-user configuration directory.
 *
 * Access goes through `ConfigManagerOperations` so the presenter can be tested with
 * an in-memory mock. `CoreConfigManager` is the file-backed implementation; a
 * missing file yields the defaults, and unknown or missing fields fall back to their
 * default values.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration format error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            ConfigError::NoProjectDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window_width: i32,
    pub window_height: i32,
    pub min_window_width: i32,
    pub min_window_height: i32,
    pub saved_notification_timeout_ms: u64,
    pub history_limit: Option<usize>,
    pub last_document_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            window_width: 800,
            window_height: 600,
            min_window_width: 500,
            min_window_height: 500,
            saved_notification_timeout_ms: 5000,
            history_limit: None,
            last_document_dir: None,
        }
    }
}

impl AppConfig {
    pub fn saved_notification_timeout(&self) -> Duration {
        Duration::from_millis(self.saved_notification_timeout_ms)
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, app_name: &str) -> Result<AppConfig>;
    fn save_config(&self, app_name: &str, config: &AppConfig) -> Result<()>;
}

pub struct CoreConfigManager {
    config_dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {
            config_dir_override: None,
        }
    }

    // Stores the configuration in `dir` instead of the per-user directory.
    pub fn with_config_dir(dir: impl Into<PathBuf>) -> Self {
        CoreConfigManager {
            config_dir_override: Some(dir.into()),
        }
    }

    fn config_file_path(&self, app_name: &str) -> Result<PathBuf> {
        let dir = match &self.config_dir_override {
            Some(dir) => dir.clone(),
            None => path_utils::app_config_dir(app_name).ok_or(ConfigError::NoProjectDirectory)?,
        };
        Ok(dir.join(CONFIG_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_config(&self, app_name: &str) -> Result<AppConfig> {
        let file_path = self.config_file_path(app_name)?;
        if !file_path.exists() {
            log::debug!("CoreConfigManager: No config at {file_path:?}, using defaults.");
            return Ok(AppConfig::default());
        }
        let text = fs::read_to_string(&file_path)?;
        if text.trim().is_empty() {
            log::debug!("CoreConfigManager: Config file {file_path:?} is empty, using defaults.");
            return Ok(AppConfig::default());
        }
        let config: AppConfig = serde_json::from_str(&text)?;
        log::debug!("CoreConfigManager: Loaded config from {file_path:?}.");
        Ok(config)
    }

    fn save_config(&self, app_name: &str, config: &AppConfig) -> Result<()> {
        let file_path = self.config_file_path(app_name)?;
        write_json_atomically(&file_path, config)?;
        log::debug!("CoreConfigManager: Saved config to {file_path:?}.");
        Ok(())
    }
}

// Writes to a sibling temp file first so a crash never leaves a truncated config.
fn write_json_atomically(file_path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = file_path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, file_path)?;
    Ok(())
}
