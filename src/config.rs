//! Persisted analysis defaults.
//!
//! Settings the user tweaks on most runs (method, threshold, keep policy)
//! can be saved to a platform-specific config file and picked up on later
//! runs. Precedence is CLI flag, then config file, then built-in default.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::duplicates::KeepPolicy;
use crate::similarity::{HashMethod, DEFAULT_THRESHOLD};

/// Saved analysis defaults.
///
/// Every field has a serde default so a hand-edited partial file still
/// loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Preferred similarity method.
    #[serde(default)]
    pub method: HashMethod,

    /// Preferred Hamming distance threshold.
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Preferred keep policy.
    #[serde(default)]
    pub keep: KeepPolicy,
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: HashMethod::Phash,
            threshold: DEFAULT_THRESHOLD,
            keep: KeepPolicy::LargestFile,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or the
    /// file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        log::info!("Defaults saved to {}", path.display());
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "imgdedup", "imgdedup")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}
