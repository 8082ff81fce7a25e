//! Configuration file
//!
//! ```toml
//! tool_prefix = "mega-"
//! excludes = ["*.tmp", "**/.cache"]
//! collapse = "pre-order"
//! command_timeout_secs = 600
//! log_file = "/var/log/mega-sync.log"
//! log_format = "text"
//! ```
//!
//! Every key is optional. Command-line flags win over file values, except
//! `excludes`, which are combined.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::delete::CollapseMode;
use crate::error::{Result, SyncError};
use crate::logger::LogFormat;
use crate::remote::DEFAULT_TOOL_PREFIX;

pub const CONFIG_ENV: &str = "MEGA_SYNC_CONFIG";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub tool_prefix: String,
    pub excludes: Vec<String>,
    pub collapse: CollapseMode,
    pub command_timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool_prefix: DEFAULT_TOOL_PREFIX.to_string(),
            excludes: Vec::new(),
            collapse: CollapseMode::default(),
            command_timeout_secs: None,
            log_file: None,
            log_format: LogFormat::default(),
        }
    }
}

pub fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("mega-sync"));
        }
    }
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return Some(PathBuf::from(appdata).join("mega-sync"));
        }
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config").join("mega-sync"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

impl Config {
    pub fn from_toml(path: &Path, data: &str) -> Result<Self> {
        toml::from_str(data).map_err(|e| SyncError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read an explicitly requested config file; it must exist.
    pub fn load_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        Self::from_toml(path, &data)
    }

    /// Resolve the config: `explicit`, else `$MEGA_SYNC_CONFIG`, else the
    /// default location if it exists, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_file(Path::new(&path));
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }
}
