//! Build environments
//!
//! A build environment is a directory holding a `Dockerfile` and an
//! `image_config.json`. Each image owns two: the working copy the user edits
//! and the snapshot of the last successful build.

use crate::config::image as image_config;
use crate::error::{DockError, DockResult};
use crate::files::{self, CompareCache, WorkingDirectory};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build descriptor file name
pub const DOCKERFILE: &str = "Dockerfile";

/// Flag descriptor file name
pub const CONFIGFILE: &str = "image_config.json";

/// Content written to a fresh `Dockerfile`
pub const DEFAULT_DOCKERFILE: &str = "FROM x11docker/lxqt";

/// One on-disk build context
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildEnvironment {
    directory: PathBuf,
    dockerfile: PathBuf,
    configfile: PathBuf,
}

impl BuildEnvironment {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        let directory = files::expand(directory);
        Self {
            dockerfile: directory.join(DOCKERFILE),
            configfile: directory.join(CONFIGFILE),
            directory,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn dockerfile(&self) -> &Path {
        &self.dockerfile
    }

    pub fn configfile(&self) -> &Path {
        &self.configfile
    }

    pub fn exists(&self) -> bool {
        self.directory.is_dir()
    }

    /// Ensure a basic build environment exists.
    ///
    /// Missing descriptor files are created with defaults; existing ones are
    /// left alone.
    pub fn touch(&self) -> DockResult<&Self> {
        fs::create_dir_all(&self.directory)
            .map_err(|e| DockError::io(format!("creating {}", self.directory.display()), e))?;

        if !self.dockerfile.exists() {
            fs::write(&self.dockerfile, DEFAULT_DOCKERFILE).map_err(|e| {
                DockError::io(format!("writing {}", self.dockerfile.display()), e)
            })?;
            info!("Created {}", self.dockerfile.display());
        }
        if !self.configfile.exists() {
            image_config::dump_default(&self.configfile)?;
            info!("Created {}", self.configfile.display());
        }

        Ok(self)
    }

    /// Delete the whole directory
    pub fn remove(&self) -> DockResult<()> {
        files::remove_directory(&self.directory)
    }

    /// Make this directory the process working directory until the guard drops
    pub fn as_working_directory(&self) -> DockResult<WorkingDirectory> {
        WorkingDirectory::enter(&self.directory)
    }
}

/// Overwrite `cache_env` with the contents of `source_env`.
///
/// Clears `compare` afterwards since the cache directory was just rewritten.
pub fn save(
    source_env: &BuildEnvironment,
    cache_env: &BuildEnvironment,
    compare: &CompareCache,
) -> DockResult<()> {
    debug!(
        "Saving {} as {}",
        source_env.directory().display(),
        cache_env.directory().display()
    );
    files::copy_directory(source_env.directory(), cache_env.directory())?;
    compare.clear();
    Ok(())
}

/// Whether two environments hold identical contents
pub fn are_same(
    source_env: &BuildEnvironment,
    cache_env: &BuildEnvironment,
    compare: &CompareCache,
) -> bool {
    files::are_same(source_env.directory(), cache_env.directory(), compare)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn derived_paths() {
        let env = BuildEnvironment::new("/repo/images/app/build");
        assert_eq!(env.dockerfile(), Path::new("/repo/images/app/build/Dockerfile"));
        assert_eq!(
            env.configfile(),
            Path::new("/repo/images/app/build/image_config.json")
        );
    }

    #[test]
    fn equality_is_by_directory() {
        assert_eq!(
            BuildEnvironment::new("/repo/a/../b"),
            BuildEnvironment::new("/repo/b")
        );
        assert_ne!(BuildEnvironment::new("/repo/a"), BuildEnvironment::new("/repo/b"));
    }

    #[test]
    fn touch_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let env = BuildEnvironment::new(dir.path().join("build"));
        assert!(!env.exists());

        env.touch().unwrap();

        assert!(env.exists());
        assert_eq!(fs::read_to_string(env.dockerfile()).unwrap(), DEFAULT_DOCKERFILE);
        let config: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(env.configfile()).unwrap()).unwrap();
        assert_eq!(config["dockerRunFlags"][0], "--privileged");
    }

    #[test]
    fn touch_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let env = BuildEnvironment::new(dir.path().join("build"));
        fs::create_dir_all(env.directory()).unwrap();
        fs::write(env.dockerfile(), "FROM alpine").unwrap();

        env.touch().unwrap();
        env.touch().unwrap();

        assert_eq!(fs::read_to_string(env.dockerfile()).unwrap(), "FROM alpine");
        assert!(env.configfile().exists());
    }

    #[test]
    fn save_makes_environments_same() {
        let dir = TempDir::new().unwrap();
        let source = BuildEnvironment::new(dir.path().join("build"));
        let cache = BuildEnvironment::new(dir.path().join(".build_cache"));
        let compare = CompareCache::new();
        source.touch().unwrap();

        assert!(!are_same(&source, &cache, &compare));
        save(&source, &cache, &compare).unwrap();
        assert!(compare.is_empty());
        assert!(are_same(&source, &cache, &compare));

        fs::write(source.dockerfile(), "FROM debian").unwrap();
        assert!(!are_same(&source, &cache, &compare));
    }

    #[test]
    fn remove_deletes_tree() {
        let dir = TempDir::new().unwrap();
        let env = BuildEnvironment::new(dir.path().join("build"));
        env.touch().unwrap();

        env.remove().unwrap();
        assert!(!env.exists());
        env.remove().unwrap();
    }

    #[test]
    #[serial]
    fn as_working_directory_scopes_cwd() {
        let dir = TempDir::new().unwrap();
        let env = BuildEnvironment::new(dir.path().join("build"));
        env.touch().unwrap();
        let before = std::env::current_dir().unwrap();

        {
            let _cwd = env.as_working_directory().unwrap();
            assert!(Path::new(DOCKERFILE).exists());
        }

        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
