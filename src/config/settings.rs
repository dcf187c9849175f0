//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/trawl)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created.
    pub fn resolve() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "trawl", "trawl").ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width `ip port` lines
    #[default]
    Plain,
    /// One JSON object per line
    Json,
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Connect timeout in milliseconds.
    pub dial_timeout_ms: u64,
    /// Per-read/per-write timeout in milliseconds.
    pub data_timeout_ms: u64,
    /// Maximum number of concurrent scans.
    pub concurrency: usize,
    /// Rescan interval in seconds for live mode.
    pub live_interval_secs: u64,
    /// Also report proxies that require username/password.
    pub detect_auth: bool,
    /// Default output format.
    pub output_format: OutputFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dial_timeout_ms: 2000,
            data_timeout_ms: 2000,
            concurrency: 500,
            live_interval_secs: 60,
            detect_auth: false,
            output_format: OutputFormat::Plain,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, or defaults if absent.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::resolve()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to a specific file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_millis(self.data_timeout_ms)
    }

    pub fn live_interval(&self) -> Duration {
        Duration::from_secs(self.live_interval_secs)
    }
}
