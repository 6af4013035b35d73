//! Settings schema for dock
//!
//! Settings are stored at `~/.config/dock/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// General settings
    pub general: GeneralSettings,

    /// Image repository settings
    pub repository: RepositorySettings,

    /// Docker / x11docker invocation settings
    pub docker: DockerSettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Repository location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Repository root, used when neither `--repo` nor
    /// `DOCK_DESKTOP_X11_HOME` is set
    pub path: Option<PathBuf>,
}

/// How the external tools are invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DockerSettings {
    /// Docker CLI binary
    pub docker_bin: String,

    /// x11docker binary
    pub x11docker_bin: String,

    /// Prefix every invocation with sudo
    pub sudo: bool,

    /// Start the docker service through systemd when it is inactive
    pub ensure_service: bool,
}

impl Default for DockerSettings {
    fn default() -> Self {
        Self {
            docker_bin: "docker".to_string(),
            x11docker_bin: "x11docker".to_string(),
            sudo: true,
            ensure_service: true,
        }
    }
}
