//! Application configuration loading and saving.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tyre rolling circumference of a typical 700x23c road wheel, in mm.
const DEFAULT_CIRCUMFERENCE_MM: f64 = 2096.0;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// BLE addresses of the sensors to connect to
    pub sensors: Vec<String>,
    /// Tyre rolling circumference in millimetres
    pub wheel_circumference_mm: f64,
    /// Trailing window for speed/cadence averaging in seconds
    pub averaging_window_seconds: f64,
    /// Optional CSV power curve for speed→power estimation
    pub power_curve_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sensors: Vec::new(),
            wheel_circumference_mm: DEFAULT_CIRCUMFERENCE_MM,
            averaging_window_seconds: 3.0,
            power_curve_path: None,
        }
    }
}

impl AppConfig {
    /// Default configuration file path under the platform config dir.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "ProvidenceIT", "spindash")
            .context("could not determine config directory")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default path, falling back to
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a specific path, creating parent
    /// directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating config dir {}", parent.display()))?;
        }

        let text = toml::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, text).with_context(|| format!("writing config {}", path.display()))?;

        Ok(())
    }
}
