//! Configuration management for LearnHub

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::course::Catalog;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fraction of a video that must be watched to complete it (0.0-1.0)
    pub completion_threshold: f64,

    /// Playback sampling interval in milliseconds
    pub tick_interval_ms: u64,

    /// Catalog file replacing the built-in fixtures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixtures_path: Option<PathBuf>,

    /// Directory for progress data, overriding the platform default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            completion_threshold: 0.90,
            tick_interval_ms: 1000,
            fixtures_path: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Self =
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")?;
        Ok(config.sanitized())
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "learnhub")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let proj_dirs = ProjectDirs::from("", "", "learnhub")
            .context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Get the progress store path
    pub fn progress_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("progress.json"))
    }

    /// Sampling interval as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Load the configured catalog, or the built-in one
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.fixtures_path {
            Some(path) => Catalog::load(path),
            None => Catalog::builtin(),
        }
    }

    /// Clamp out-of-range values back to something usable
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.completion_threshold > 0.0 && self.completion_threshold <= 1.0) {
            tracing::warn!(
                "completion_threshold {} out of range, using {}",
                self.completion_threshold,
                defaults.completion_threshold
            );
            self.completion_threshold = defaults.completion_threshold;
        }
        if self.tick_interval_ms == 0 {
            self.tick_interval_ms = defaults.tick_interval_ms;
        }
        self
    }
}
