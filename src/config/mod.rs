//! Configuration for dock
//!
//! Two layers live here: the tool-wide [`Settings`] file managed by
//! [`ConfigManager`], and the per-image flag descriptor in [`image`].

pub mod image;
pub mod schema;

pub use image::{ImageConfig, DEFAULT_LABEL};
pub use schema::Settings;

use crate::error::{DockError, DockResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Settings file manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default settings file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dock")
            .join("config.toml")
    }

    /// Load settings, falling back to defaults if the file does not exist
    pub async fn load(&self) -> DockResult<Settings> {
        if !self.config_path.exists() {
            debug!("Settings file not found, using defaults");
            return Ok(Settings::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load settings from a specific file
    pub async fn load_from_file(&self, path: &Path) -> DockResult<Settings> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| DockError::io(format!("reading settings from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| DockError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save settings to file
    pub async fn save(&self, settings: &Settings) -> DockResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(settings)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            DockError::io(
                format!("writing settings to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Settings saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the settings directory exists
    async fn ensure_config_dir(&self) -> DockResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DockError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the settings file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
