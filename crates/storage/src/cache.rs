//! Local model cache directory.
//!
//! A per-user directory on local disk that mirrors remote objects by file
//! name. Presence is binary: a file either exists under its name or it
//! doesn't, no size/hash/mtime is ever compared with the remote copy.
//!
//! Writes go through a temporary file in the same directory which is then
//! renamed over the final name, so an interrupted download never leaves a
//! truncated file that a later run would mistake for a complete one.

use crate::error::{ErrorKind, Result};
use crate::path::{validate as validate_path, validate_file_name};
use std::fs::create_dir_all as sync_create_dir;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// Suffix of in-flight downloads.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Local cache directory.
///
/// # Examples
///
/// ```no_run
/// use archeon_storage::LocalCache;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = LocalCache::open("/home/me/archeon/downloads/u1")?;
/// if !cache.contains("scene.gs").await? {
///     cache.write_atomic("scene.gs", b"...".to_vec()).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}
impl LocalCache {
    /// Open (creating if needed) the cache directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, exists but is not a
    /// directory, or cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it happens once per session and it's not
            // worth making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
            tracing::debug!(root = %root.display(), "Created cache directory");
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the cached file called `name`.
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_file_name(name)?))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Whether a file called `name` is present.
    pub async fn contains(&self, name: &str) -> Result<bool> {
        let path = self.path_of(name)?;
        Ok(fs::try_exists(&path).await.map_err(|e| Self::map_io_error(e, &path))?)
    }

    /// Write `data` under `name`, replacing any existing file, without ever
    /// exposing a partially written file under the final name.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn write_atomic(&self, name: &str, data: Vec<u8>) -> Result<()> {
        let target = self.path_of(name)?;
        let root = self.root.clone();
        let joined = tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::Builder::new()
                .prefix(".")
                .suffix(PARTIAL_SUFFIX)
                .tempfile_in(&root)
                .map_err(|e| Self::map_io_error(e, &root))?;
            tmp.write_all(&data).map_err(ErrorKind::Io)?;
            tmp.as_file().sync_all().map_err(ErrorKind::Io)?;
            // On failure the temporary file is removed when `PersistError`
            // (which still owns it) is dropped.
            tmp.persist(&target).map_err(|e| Self::map_io_error(e.error, &target))?;
            Ok(())
        })
        .await;
        joined.map_err(|e| ErrorKind::Io(std::io::Error::other(e)))?
    }

    /// Recursively copy every file under `source` into the cache, keeping
    /// relative paths and overwriting files that already exist.
    ///
    /// Returns the number of files copied. A missing `source` copies nothing.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn copy_tree_from(&self, source: &Path) -> Result<u64> {
        let source = source.to_path_buf();
        let root = self.root.clone();
        let joined = tokio::task::spawn_blocking(move || copy_tree(&source, &root)).await;
        joined.map_err(|e| ErrorKind::Io(std::io::Error::other(e)))?
    }
}

/// Blocking recursive copy. Walks with an explicit stack instead of
/// recursion; every destination path is validated against `to`.
fn copy_tree(from: &Path, to: &Path) -> Result<u64> {
    if !from.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    let mut stack = vec![from.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| LocalCache::map_io_error(e, &current))?;
        for entry in entries {
            let entry = entry.map_err(|e| LocalCache::map_io_error(e, &current))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| LocalCache::map_io_error(e, &path))?;
            let relative = path.strip_prefix(from).map_err(|_| ErrorKind::InvalidPath(path.clone()))?;
            let destination = to.join(validate_path(relative)?);
            if file_type.is_dir() {
                sync_create_dir(&destination).map_err(|e| LocalCache::map_io_error(e, &destination))?;
                stack.push(path);
            } else if file_type.is_file() || path.is_file() {
                std::fs::copy(&path, &destination).map_err(|e| LocalCache::map_io_error(e, &destination))?;
                copied += 1;
            }
            // Note: silently drop what is most likely a broken symlink.
        }
    }
    Ok(copied)
}
