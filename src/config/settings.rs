//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and stored scans.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_MS};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/trawl)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/trawl)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance, creating the directories on first use.
    pub fn get() -> ConfigResult<&'static Paths> {
        if let Some(paths) = PATHS.get() {
            return Ok(paths);
        }
        let paths = Self::from_project_dirs()?;
        Ok(PATHS.get_or_init(|| paths))
    }

    fn from_project_dirs() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "trawl", "trawl").ok_or(ConfigError::DirectoryNotFound)?;
        Self::create(
            project.config_dir().to_path_buf(),
            project.data_dir().to_path_buf(),
        )
    }

    /// Keep everything under one directory (`<root>/config`, `<root>/data`).
    pub fn under(root: impl AsRef<Path>) -> ConfigResult<Self> {
        let root = root.as_ref();
        Self::create(root.join("config"), root.join("data"))
    }

    fn create(config_dir: PathBuf, data_dir: PathBuf) -> ConfigResult<Self> {
        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// Path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Directory holding user-defined scan profiles.
    pub fn profiles_dir(&self) -> PathBuf {
        self.config_dir.join("profiles")
    }

    /// Directory holding stored scan reports.
    pub fn scans_dir(&self) -> PathBuf {
        self.data_dir.join("scans")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Hosts scanned at once.
    pub default_concurrency: usize,
    /// Ports probed at once per host; follows `default_concurrency` when unset.
    pub default_port_concurrency: Option<usize>,
    /// Connect timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Cap on connection attempts in flight across a scan.
    pub max_connections: Option<usize>,
    /// Probes per second, 0 for unlimited.
    pub default_rate_limit: u32,
    /// Grab banners unless told otherwise.
    pub grab_banner: bool,
    /// Default output format (plain, json, csv).
    pub default_output_format: String,
    /// Store every completed scan.
    pub auto_save_scans: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_concurrency: DEFAULT_CONCURRENCY,
            default_port_concurrency: None,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_connections: None,
            default_rate_limit: 0,
            grab_banner: false,
            default_output_format: "plain".to_string(),
            auto_save_scans: true,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get()?.settings_file();
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

    /// Save settings to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Paths::get()?.settings_file())
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
