//! Images: a tag bound to a working build environment and its build cache
//!
//! An image directory holds two build environments:
//!
//! | Directory      | Role                                   |
//! |----------------|----------------------------------------|
//! | `build`        | Working copy, edited by the user       |
//! | `.build_cache` | Snapshot of the last successful build  |
//!
//! A build is only needed while the two differ. The snapshot is refreshed
//! after the executor reports success and never otherwise, so a failed build
//! leaves the image in a state where the next `build` retries.

use crate::config::image as image_config;
use crate::docker::Executor;
use crate::environment::{self, BuildEnvironment};
use crate::error::{DockError, DockResult};
use crate::files::{self, CompareCache, StagedArchive};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Working build environment directory name
pub const BUILD_DIR: &str = "build";

/// Build cache directory name
pub const CACHE_DIR: &str = ".build_cache";

/// Replaces `/` in a tag to form a flat directory name
pub const TAG_SEPARATOR: char = '#';

/// Check that `tag` maps to a safe, unique directory name
pub fn validate_tag(tag: &str) -> DockResult<()> {
    if tag.is_empty() {
        return Err(DockError::invalid_tag(tag, "tag is empty"));
    }
    if tag.contains(TAG_SEPARATOR) {
        return Err(DockError::invalid_tag(
            tag,
            format!("'{}' is reserved", TAG_SEPARATOR),
        ));
    }
    if let Some(c) = tag
        .chars()
        .find(|c| *c == '\\' || *c == '\0' || c.is_whitespace())
    {
        return Err(DockError::invalid_tag(
            tag,
            format!("character {:?} is not allowed", c),
        ));
    }
    if let Some(segment) = tag
        .split('/')
        .find(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return Err(DockError::invalid_tag(
            tag,
            format!("path segment {:?} is not allowed", segment),
        ));
    }
    Ok(())
}

/// Directory name for a validated tag
pub fn directory_name(tag: &str) -> String {
    tag.replace('/', &TAG_SEPARATOR.to_string())
}

/// Tag recovered from an image directory name
pub fn tag_from_directory_name(name: &str) -> String {
    name.replace(TAG_SEPARATOR, "/")
}

/// Whether a build was actually performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The executor ran and the cache was refreshed
    Built,
    /// Source and cache matched; nothing ran
    UpToDate,
}

/// Build decision inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build even if unchanged, and bypass docker's layer cache
    pub force: bool,
    /// Build even if unchanged, keeping docker's layer cache
    pub suggest: bool,
}

/// Where an image stands relative to its cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    /// No image directory
    Untouched,
    /// Build environment present but not matching the cache
    Touched,
    /// Cache matches the build environment
    Built,
}

impl fmt::Display for ImageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Untouched => write!(f, "untouched"),
            Self::Touched => write!(f, "touched"),
            Self::Built => write!(f, "built"),
        }
    }
}

/// A tagged image inside a repository
#[derive(Debug, Clone)]
pub struct Image {
    tag: String,
    directory: PathBuf,
    build_env: BuildEnvironment,
    cache_env: BuildEnvironment,
    compare: CompareCache,
}

impl Image {
    /// Map `tag` to its directory under `images`.
    ///
    /// Only computes paths; nothing is created.
    pub fn new(images: &Path, tag: &str, compare: CompareCache) -> DockResult<Self> {
        validate_tag(tag)?;
        let directory = files::expand(images).join(directory_name(tag));

        Ok(Self {
            tag: tag.to_string(),
            build_env: BuildEnvironment::new(directory.join(BUILD_DIR)),
            cache_env: BuildEnvironment::new(directory.join(CACHE_DIR)),
            directory,
            compare,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The working build environment
    pub fn build_env(&self) -> &BuildEnvironment {
        &self.build_env
    }

    /// The snapshot of the last successful build
    pub fn cache_env(&self) -> &BuildEnvironment {
        &self.cache_env
    }

    pub fn exists(&self) -> bool {
        self.directory.exists()
    }

    /// Absent, or present with nothing inside
    pub fn is_empty(&self) -> bool {
        !self.exists() || files::is_empty_dir(&self.directory)
    }

    /// Whether the working environment differs from the cache
    pub fn needs_build(&self) -> bool {
        !environment::are_same(&self.build_env, &self.cache_env, &self.compare)
    }

    pub fn state(&self) -> ImageState {
        if self.is_empty() {
            ImageState::Untouched
        } else if self.needs_build() {
            ImageState::Touched
        } else {
            ImageState::Built
        }
    }

    /// Create a template build environment if none exists
    pub fn touch(&self) -> DockResult<&Self> {
        self.build_env.touch()?;
        Ok(self)
    }

    /// Build the image with `executor` if needed.
    ///
    /// Rebuilds when `suggest` or `force` is set or when the working copy
    /// differs from the cache. On success the working copy becomes the new
    /// cache; on failure the cache is left as it was.
    pub async fn build(
        &self,
        executor: &dyn Executor,
        options: BuildOptions,
    ) -> DockResult<BuildOutcome> {
        if !(options.suggest || options.force || self.needs_build()) {
            debug!("{} is up to date", self.tag);
            return Ok(BuildOutcome::UpToDate);
        }
        if !self.build_env.configfile().exists() {
            return Err(DockError::ImageNotFound(self.tag.clone()));
        }

        let config = image_config::load(
            self.build_env.configfile(),
            &self.directory,
            &self.tag,
            options.force,
        )?;

        info!("Building {}", self.tag);
        executor
            .build(self.build_env.directory(), config.build_flags())
            .await?;

        environment::save(&self.build_env, &self.cache_env, &self.compare)?;
        info!("Built {}", self.tag);
        Ok(BuildOutcome::Built)
    }

    /// Run the image with its current run flags.
    ///
    /// Does not build and does not look at the cache.
    pub async fn run(&self, executor: &dyn Executor) -> DockResult<&Self> {
        if !self.build_env.configfile().exists() {
            return Err(DockError::ImageNotFound(self.tag.clone()));
        }

        let config = image_config::load(
            self.build_env.configfile(),
            &self.directory,
            &self.tag,
            false,
        )?;
        executor
            .run(self.build_env.directory(), &self.tag, config.run_flags())
            .await?;
        Ok(self)
    }

    /// Drop the build cache so the next build always runs
    pub fn clean(&self) -> DockResult<&Self> {
        self.cache_env.remove()?;
        self.compare.clear();
        info!("Cleaned build cache of {}", self.tag);
        Ok(self)
    }

    /// Remove the docker image and delete the image directory
    pub async fn remove(&self, executor: &dyn Executor) -> DockResult<&Self> {
        executor.remove_image(&self.tag).await?;
        files::remove_directory(&self.directory)?;
        self.compare.clear();
        info!("Removed {}", self.tag);
        Ok(self)
    }

    /// Archive the whole image directory
    pub fn backup(&self, archive: &Path) -> DockResult<&Self> {
        if !self.exists() {
            return Err(DockError::ImageNotFound(self.tag.clone()));
        }
        files::make_archive(archive, &self.directory)?;
        info!("Backed up {} to {}", self.tag, archive.display());
        Ok(self)
    }

    /// Unpack an archive made by [`Image::backup`] as this image.
    ///
    /// Never merges: an existing image must be removed first.
    pub fn restore(&self, archive: &Path) -> DockResult<&Self> {
        if !self.is_empty() {
            return Err(DockError::ImageExists(self.tag.clone()));
        }
        self.restore_staged(self.stage_restore(archive)?)
    }

    /// Unpack `archive` beside the image directory without touching it
    pub fn stage_restore(&self, archive: &Path) -> DockResult<StagedArchive> {
        files::stage_archive(archive, &self.directory)
    }

    /// Move a tree staged by [`Image::stage_restore`] into place
    pub fn restore_staged(&self, staged: StagedArchive) -> DockResult<&Self> {
        if !self.is_empty() {
            return Err(DockError::ImageExists(self.tag.clone()));
        }
        if staged.target() != self.directory.as_path() {
            return Err(DockError::User(format!(
                "Archive was staged for {}, not {}",
                staged.target().display(),
                self.directory.display()
            )));
        }
        staged.commit()?;
        self.compare.clear();
        info!("Restored {}", self.tag);
        Ok(self)
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.directory == other.directory && self.tag == other.tag
    }
}

impl Eq for Image {}

impl Hash for Image {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.directory.hash(state);
        self.tag.hash(state);
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}
