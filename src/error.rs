//! Error types for dock
//!
//! All modules use `DockResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dock operations
pub type DockResult<T> = Result<T, DockError>;

/// All errors that can occur in dock
#[derive(Error, Debug)]
pub enum DockError {
    // Repository errors
    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("Image not found: {0}")]
    ImageNotFound(String),

    #[error("Image already exists: {0}")]
    ImageExists(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Executor errors
    #[error("Command failed: {command}, exit code: {code}")]
    ExecutionFailed { command: String, code: i32 },

    #[error("Failed to launch command: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl DockError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command launch error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an invalid tag error
    pub fn invalid_tag(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTag {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the external build/run tooling
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::ExecutionFailed { .. } | Self::CommandFailed { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ImageNotFound(_) => Some("Create it first with: dock touch <tag>"),
            Self::ImageExists(_) => Some("Remove it first with: dock remove <tag>"),
            Self::InvalidTag { .. } => {
                Some("Tags are '/'-separated names and may not contain '#'")
            }
            Self::CommandFailed { .. } => Some("Check that docker and x11docker are installed"),
            Self::ConfigInvalid { .. } => Some("Inspect the file with: dock configfile <tag>"),
            _ => None,
        }
    }
}
