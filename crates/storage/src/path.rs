//! Path validation and security utilities.
//!
//! Object keys come from a remote service and local file names are derived
//! from them, so everything that ends up joined onto the cache root passes
//! through here first.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Resolves the path of a bundled viewer asset, relative to the viewer
/// source directory, into the path it gets inside a user's model directory.
///
/// [`LocalCache::copy_tree_from()`](crate::LocalCache::copy_tree_from) joins
/// the result onto the cache root, so `.` and `..` are resolved here and
/// anything that would climb out of that directory is refused. A leading `/`
/// is dropped; a Windows drive prefix, a path that resolves to nothing and a
/// component carrying a NUL byte are refused.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use archeon_storage::validate_path;
///
/// assert_eq!(validate_path("js/viewer.js").unwrap(), Path::new("js/viewer.js"));
/// assert_eq!(validate_path("./css/../index.html").unwrap(), Path::new("index.html"));
/// assert!(validate_path("../ArcheonViewer.exe").is_err());
/// assert!(validate_path("js/../../index.html").is_err());
/// assert!(validate_path(".").is_err());
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let asset = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(asset.to_path_buf());
    let mut resolved: Vec<&std::ffi::OsStr> = Vec::new();
    for component in asset.components() {
        match component {
            // NUL would truncate the path once it reaches a syscall.
            Component::Normal(part) if part.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir => {
                resolved.pop().ok_or_else(invalid)?;
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
        }
    }
    if resolved.is_empty() {
        exn::bail!(invalid());
    }
    Ok(resolved.into_iter().collect())
}

/// Validates a single file name: exactly one normal path component.
///
/// Used for names derived from object keys, which must land directly inside
/// the cache directory.
pub fn validate_file_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(s)), None) if !s.as_encoded_bytes().contains(&0) && s == name => Ok(name),
        _ => exn::bail!(ErrorKind::InvalidPath(PathBuf::from(name))),
    }
}
