//! Filesystem helpers
//!
//! Path expansion, directory copy/move/remove that keeps symlinks as links,
//! content comparison backed by an explicit [`CompareCache`], tar.gz archives,
//! and a scoped working directory guard.

use crate::error::{DockError, DockResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashMap;
use std::fs::{self, File, Metadata};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Expand a path into an absolute path with `~` resolved.
///
/// Does not touch the filesystem and does not resolve symlinks.
pub fn expand(target: impl AsRef<Path>) -> PathBuf {
    let target = target.as_ref();

    let expanded = match target.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => target.to_path_buf(),
        },
        Err(_) => target.to_path_buf(),
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    };

    normalize(&absolute)
}

/// Lexically drop `.` and resolve `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Cheap stat signature used to validate memoized comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Signature {
    len: u64,
    modified: Option<SystemTime>,
}

impl Signature {
    fn of(meta: &Metadata) -> Self {
        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    left: Signature,
    right: Signature,
    same: bool,
}

/// Memo of file comparison results.
///
/// Entries are keyed by the pair of paths and only reused while both stat
/// signatures still match. A rewrite that keeps size and mtime is invisible
/// to the signature, so anything that copies or deletes compared paths must
/// call [`CompareCache::clear`] before the next comparison.
///
/// Cloning yields another handle to the same cache.
#[derive(Debug, Clone, Default)]
pub struct CompareCache {
    entries: Arc<Mutex<HashMap<(PathBuf, PathBuf), Entry>>>,
}

impl CompareCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every memoized result
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Clearing comparison cache ({} entries)", entries.len());
        entries.clear();
    }

    /// Number of memoized comparisons
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, left: &Path, right: &Path, l: Signature, r: Signature) -> Option<bool> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(left.to_path_buf(), right.to_path_buf()))
            .filter(|e| e.left == l && e.right == r)
            .map(|e| e.same)
    }

    fn store(&self, left: &Path, right: &Path, l: Signature, r: Signature, same: bool) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            (left.to_path_buf(), right.to_path_buf()),
            Entry {
                left: l,
                right: r,
                same,
            },
        );
    }
}

/// Compare two files or directory trees by content.
///
/// Directories are equal when neither side has extra entries and every common
/// entry is equal, recursively. Anything missing, unreadable, or of a different
/// kind compares as not same.
pub fn are_same(source: &Path, target: &Path, cache: &CompareCache) -> bool {
    let (source, target) = (expand(source), expand(target));
    match compare(&source, &target, cache) {
        Ok(same) => same,
        Err(e) => {
            warn!(
                "Comparing {} with {} failed, treating as changed: {}",
                source.display(),
                target.display(),
                e
            );
            false
        }
    }
}

fn compare(left: &Path, right: &Path, cache: &CompareCache) -> std::io::Result<bool> {
    let (l_meta, r_meta) = match (fs::symlink_metadata(left), fs::symlink_metadata(right)) {
        (Ok(l), Ok(r)) => (l, r),
        _ => return Ok(false),
    };
    let (l_type, r_type) = (l_meta.file_type(), r_meta.file_type());

    if l_type.is_symlink() && r_type.is_symlink() {
        return Ok(fs::read_link(left)? == fs::read_link(right)?);
    }
    if l_type.is_dir() && r_type.is_dir() {
        return compare_dirs(left, right, cache);
    }
    if l_type.is_file() && r_type.is_file() {
        let (l_sig, r_sig) = (Signature::of(&l_meta), Signature::of(&r_meta));
        if let Some(same) = cache.lookup(left, right, l_sig, r_sig) {
            return Ok(same);
        }
        let same = l_sig.len == r_sig.len && files_identical(left, right)?;
        cache.store(left, right, l_sig, r_sig, same);
        return Ok(same);
    }

    Ok(false)
}

fn compare_dirs(left: &Path, right: &Path, cache: &CompareCache) -> std::io::Result<bool> {
    let mut l_names = list_names(left)?;
    let mut r_names = list_names(right)?;
    l_names.sort();
    r_names.sort();

    if l_names != r_names {
        debug!(
            "Directory listings differ: {} vs {}",
            left.display(),
            right.display()
        );
        return Ok(false);
    }

    for name in &l_names {
        if !compare(&left.join(name), &right.join(name), cache)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn list_names(dir: &Path) -> std::io::Result<Vec<std::ffi::OsString>> {
    fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect()
}

fn files_identical(left: &Path, right: &Path) -> std::io::Result<bool> {
    const CHUNK: usize = 8192;

    let mut l = BufReader::new(File::open(left)?);
    let mut r = BufReader::new(File::open(right)?);
    let mut l_buf = [0u8; CHUNK];
    let mut r_buf = [0u8; CHUNK];

    loop {
        let l_read = read_full(&mut l, &mut l_buf)?;
        let r_read = read_full(&mut r, &mut r_buf)?;
        if l_read != r_read || l_buf[..l_read] != r_buf[..r_read] {
            return Ok(false);
        }
        if l_read == 0 {
            return Ok(true);
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Replace `target` with a recursive copy of `source`.
///
/// `target` is removed first, so this never merges. Symlinks are recreated as
/// links rather than followed.
pub fn copy_directory(source: &Path, target: &Path) -> DockResult<()> {
    let (source, target) = (expand(source), expand(target));
    if !source.exists() {
        return Err(DockError::PathNotFound(source));
    }

    remove_directory(&target)?;
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DockError::io(format!("creating {}", parent.display()), e))?;
    }

    debug!("Copying {} to {}", source.display(), target.display());

    for entry in WalkDir::new(&source) {
        let entry = entry.map_err(|e| {
            DockError::io(
                format!("walking {}", source.display()),
                std::io::Error::other(e),
            )
        })?;
        let path = entry.path();
        let rel = match path.strip_prefix(&source) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let dest_path = target.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest_path)
                .map_err(|e| DockError::io(format!("creating {}", dest_path.display()), e))?;
        } else if file_type.is_symlink() {
            copy_symlink(path, &dest_path)?;
        } else {
            fs::copy(path, &dest_path).map_err(|e| {
                DockError::io(
                    format!("copying {} to {}", path.display(), dest_path.display()),
                    e,
                )
            })?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, dest: &Path) -> DockResult<()> {
    let target = fs::read_link(link)
        .map_err(|e| DockError::io(format!("reading link {}", link.display()), e))?;
    std::os::unix::fs::symlink(&target, dest)
        .map_err(|e| DockError::io(format!("creating link {}", dest.display()), e))
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, dest: &Path) -> DockResult<()> {
    fs::copy(link, dest).map_err(|e| {
        DockError::io(
            format!("copying {} to {}", link.display(), dest.display()),
            e,
        )
    })?;
    Ok(())
}

/// Move `source` to `target`.
///
/// Uses a rename; when that fails (for example across filesystems) and
/// `target` does not exist yet, falls back to copy followed by delete.
pub fn move_directory(source: &Path, target: &Path) -> DockResult<()> {
    let (source, target) = (expand(source), expand(target));
    if fs::symlink_metadata(&source).is_err() {
        return Err(DockError::PathNotFound(source));
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DockError::io(format!("creating {}", parent.display()), e))?;
    }

    debug!("Moving {} to {}", source.display(), target.display());

    match fs::rename(&source, &target) {
        Ok(()) => Ok(()),
        Err(e) if !target.exists() => {
            debug!("Rename failed ({}), copying instead", e);
            copy_directory(&source, &target)?;
            remove_directory(&source)
        }
        Err(e) => Err(DockError::io(
            format!("moving {} to {}", source.display(), target.display()),
            e,
        )),
    }
}

/// Remove a directory tree or a single file; absent paths are fine.
pub fn remove_directory(target: &Path) -> DockResult<()> {
    let target = expand(target);
    let meta = match fs::symlink_metadata(&target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(DockError::io(format!("inspecting {}", target.display()), e)),
    };

    debug!("Removing {}", target.display());

    let result = if meta.is_dir() {
        fs::remove_dir_all(&target)
    } else {
        fs::remove_file(&target)
    };
    result.map_err(|e| DockError::io(format!("removing {}", target.display()), e))
}

/// Pack `source` into a gzip-compressed tar at `archive`.
///
/// Entries are relative to `source`; symlinks are stored as links.
pub fn make_archive(archive: &Path, source: &Path) -> DockResult<()> {
    let (archive, source) = (expand(archive), expand(source));
    if !source.is_dir() {
        return Err(DockError::PathNotFound(source));
    }
    if let Some(parent) = archive.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| DockError::io(format!("creating {}", parent.display()), e))?;
    }

    debug!("Archiving {} into {}", source.display(), archive.display());

    let file = File::create(&archive)
        .map_err(|e| DockError::io(format!("creating {}", archive.display()), e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    builder
        .append_dir_all(".", &source)
        .map_err(|e| DockError::io(format!("archiving {}", source.display()), e))?;
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| DockError::io(format!("finishing {}", archive.display()), e))?;

    Ok(())
}

/// Prefix of staging directories; it never maps back to a valid tag
const STAGING_PREFIX: &str = "#restore.";

/// An archive unpacked next to its final location but not yet moved there.
///
/// Dropping it deletes the staged tree.
#[derive(Debug)]
pub struct StagedArchive {
    staging: TempDir,
    target: PathBuf,
}

impl StagedArchive {
    /// Where the unpacked tree currently lives
    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    /// Where [`StagedArchive::commit`] will put it
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the unpacked tree into place.
    ///
    /// An empty directory at the target is replaced; anything else fails
    /// with `AlreadyExists` and leaves both sides alone.
    pub fn commit(self) -> DockResult<()> {
        if fs::symlink_metadata(&self.target).is_ok() {
            if !is_empty_dir(&self.target) {
                return Err(DockError::io(
                    format!("restoring into {}", self.target.display()),
                    std::io::Error::from(std::io::ErrorKind::AlreadyExists),
                ));
            }
            fs::remove_dir(&self.target)
                .map_err(|e| DockError::io(format!("removing {}", self.target.display()), e))?;
        }

        debug!(
            "Moving {} into {}",
            self.staging.path().display(),
            self.target.display()
        );
        fs::rename(self.staging.path(), &self.target).map_err(|e| {
            DockError::io(
                format!(
                    "moving {} to {}",
                    self.staging.path().display(),
                    self.target.display()
                ),
                e,
            )
        })
    }
}

/// Whether `path` is a directory with no entries
pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

/// Unpack a gzip-compressed tar created by [`make_archive`] into a staging
/// directory beside `target`.
///
/// The archive is decoded completely before anything is returned; on failure
/// the partial tree is deleted and `target` is never touched.
pub fn stage_archive(archive: &Path, target: &Path) -> DockResult<StagedArchive> {
    let (archive, target) = (expand(archive), expand(target));
    let file = File::open(&archive).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DockError::PathNotFound(archive.clone()),
        _ => DockError::io(format!("opening {}", archive.display()), e),
    })?;

    let parent = target
        .parent()
        .ok_or_else(|| DockError::User(format!("Cannot restore into {}", target.display())))?;
    fs::create_dir_all(parent)
        .map_err(|e| DockError::io(format!("creating {}", parent.display()), e))?;
    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(|e| DockError::io(format!("staging in {}", parent.display()), e))?;

    debug!(
        "Unpacking {} into {}",
        archive.display(),
        staging.path().display()
    );

    let mut unpacker = tar::Archive::new(GzDecoder::new(file));
    unpacker.set_preserve_permissions(true);
    unpacker.set_unpack_xattrs(false);
    unpacker
        .unpack(staging.path())
        .map_err(|e| DockError::io(format!("unpacking {}", archive.display()), e))?;

    Ok(StagedArchive { staging, target })
}

/// Unpack a gzip-compressed tar created by [`make_archive`] as `target`.
///
/// `target` must be absent or an empty directory.
pub fn unpack_archive(archive: &Path, target: &Path) -> DockResult<()> {
    stage_archive(archive, target)?.commit()
}

/// Process working directory held for the lifetime of the guard.
///
/// The current directory is process-global: only one guard may be live at a
/// time and callers must serialize their use.
#[derive(Debug)]
pub struct WorkingDirectory {
    previous: PathBuf,
}

impl WorkingDirectory {
    /// Change into `target`, restoring the previous directory on drop
    pub fn enter(target: &Path) -> DockResult<Self> {
        let target = expand(target);
        let previous = std::env::current_dir()
            .map_err(|e| DockError::io("getting current directory", e))?;
        std::env::set_current_dir(&target)
            .map_err(|e| DockError::io(format!("entering {}", target.display()), e))?;
        debug!("Entered working directory {}", target.display());
        Ok(Self { previous })
    }

    /// Directory that will be restored on drop
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            warn!(
                "Failed to restore working directory {}: {}",
                self.previous.display(),
                e
            );
        }
    }
}
