use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::config::rendering::{FailurePolicy, RenderConfig};
use crate::config::window::WindowConfig;
use crate::utils::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "glwidget.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub window: WindowConfig,
    pub rendering: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            rendering: RenderConfig::default(),
        }
    }
}

/// Command-line values that win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub transparent: bool,
    pub strict: bool,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn level_filter(&self) -> std::result::Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if overrides.transparent {
            self.rendering.transparent = true;
        }
        if overrides.strict {
            self.rendering.failure_policy = FailurePolicy::Strict;
        }
        if let Some(level) = &overrides.log_level {
            self.log_level = level.clone();
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Reads `path`, writing the default config there first if it is missing.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        if !path.exists() {
            let default_config = AppConfig::default();
            std::fs::write(path, default_config.to_toml_string()?)
                .context("Failed to write default config")?;
            return Ok(default_config);
        }

        Self::load(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "MetroManDevTeam", "glwidget")
            .context("Couldn't determine project directory")?;
        Ok(proj_dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}
