//! Image repository
//!
//! All images live under `<root>/images/<tag with '/' replaced by '#'>`.

use crate::error::{DockError, DockResult};
use crate::files::{self, CompareCache};
use crate::image::{self, Image};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the repository root
pub const REPOSITORY_ENV: &str = "DOCK_DESKTOP_X11_HOME";

/// Images sub-directory name
pub const IMAGES_DIR: &str = "images";

/// Result of looking up a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Image),
    NotFound(String),
}

/// The collection of images rooted at one directory
#[derive(Debug, Clone)]
pub struct Repository {
    directory: PathBuf,
    images: PathBuf,
    compare: CompareCache,
}

impl Repository {
    /// Open the repository at `directory`, or at the configured default.
    ///
    /// The root falls back to `$DOCK_DESKTOP_X11_HOME`, then to
    /// `~/.local/share/dock`. The images directory is created if missing.
    pub fn open(directory: Option<&Path>) -> DockResult<Self> {
        let directory = Self::resolve_root(directory);
        let images = directory.join(IMAGES_DIR);

        fs::create_dir_all(&images)
            .map_err(|e| DockError::io(format!("creating {}", images.display()), e))?;
        debug!("Opened repository at {}", directory.display());

        Ok(Self {
            directory,
            images,
            compare: CompareCache::new(),
        })
    }

    /// Resolve the repository root without touching the filesystem
    pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
        match explicit {
            Some(path) => files::expand(path),
            None => match std::env::var_os(REPOSITORY_ENV) {
                Some(path) if !path.is_empty() => files::expand(PathBuf::from(path)),
                _ => Self::default_root(),
            },
        }
    }

    /// `~/.local/share/dock`
    pub fn default_root() -> PathBuf {
        files::expand("~").join(".local").join("share").join("dock")
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn images_dir(&self) -> &Path {
        &self.images
    }

    /// Comparison cache shared by every image of this repository
    pub fn compare_cache(&self) -> &CompareCache {
        &self.compare
    }

    /// Handle for `tag`, whether or not it exists on disk
    pub fn get(&self, tag: &str) -> DockResult<Image> {
        Image::new(&self.images, tag, self.compare.clone())
    }

    /// Handle for `tag` only if the image exists
    pub fn lookup(&self, tag: &str) -> DockResult<Lookup> {
        let image = self.get(tag)?;
        Ok(if image.exists() {
            Lookup::Found(image)
        } else {
            Lookup::NotFound(tag.to_string())
        })
    }

    /// Existing image for `tag`, or `ImageNotFound`
    pub fn require(&self, tag: &str) -> DockResult<Image> {
        match self.lookup(tag)? {
            Lookup::Found(image) => Ok(image),
            Lookup::NotFound(tag) => Err(DockError::ImageNotFound(tag)),
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).map(|image| image.exists()).unwrap_or(false)
    }

    /// Iterate over the images on disk, in directory order.
    ///
    /// The directory is re-read on every call.
    pub fn iter(&self) -> DockResult<Images> {
        let entries = fs::read_dir(&self.images)
            .map_err(|e| DockError::io(format!("listing {}", self.images.display()), e))?;
        Ok(Images {
            entries,
            repository: self.clone(),
        })
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.directory == other.directory
    }
}

impl Eq for Repository {}

/// Iterator over a repository's images
pub struct Images {
    entries: fs::ReadDir,
    repository: Repository,
}

impl Iterator for Images {
    type Item = DockResult<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    return Some(Err(DockError::io(
                        format!("listing {}", self.repository.images.display()),
                        e,
                    )))
                }
            };

            if !entry.path().is_dir() {
                debug!("Skipping non-directory {}", entry.path().display());
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                warn!("Skipping non UTF-8 image directory {:?}", name);
                continue;
            };

            match self.repository.get(&image::tag_from_directory_name(name)) {
                Ok(image) => return Some(Ok(image)),
                Err(e) => warn!("Skipping image directory {}: {}", name, e),
            }
        }
        None
    }
}
