//! Remote object keys and listing prefixes.

use crate::error::{ErrorKind, Result};
use crate::path::validate_file_name;
use derive_more::Display;
use exn::ResultExt;

/// A string identifying one object in the remote store, e.g.
/// `models/<user-id>/scene.gs`.
///
/// Keys are immutable once listed. The local file that mirrors an object is
/// named after the key's last `/`-separated segment; see
/// [`file_name()`](Self::file_name).
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("{_0}")]
pub struct ObjectKey(String);
impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The local file name for this key (its basename).
    ///
    /// Fails with [`InvalidKey`](ErrorKind::InvalidKey) when the last segment
    /// is empty (a "folder" key such as `models/u1/`), is `.` or `..`, or
    /// contains a null byte.
    ///
    /// ```
    /// use archeon_storage::ObjectKey;
    /// assert_eq!(ObjectKey::new("models/u1/a.gs").file_name().unwrap(), "a.gs");
    /// assert_eq!(ObjectKey::new("a.gs").file_name().unwrap(), "a.gs");
    /// assert!(ObjectKey::new("models/u1/").file_name().is_err());
    /// ```
    pub fn file_name(&self) -> Result<&str> {
        let name = self.0.rsplit('/').next().unwrap_or_default();
        validate_file_name(name).or_raise(|| ErrorKind::InvalidKey(self.0.clone()))
    }
}
impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}
impl From<String> for ObjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A user-scoped listing prefix. Always non-empty and always ends with `/`.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{_0}")]
pub struct Prefix(String);
impl Prefix {
    /// Root under which every user's models live.
    pub const MODELS_ROOT: &'static str = "models";

    /// Validate an arbitrary prefix.
    ///
    /// ```
    /// use archeon_storage::Prefix;
    /// assert!(Prefix::new("models/u1/").is_ok());
    /// assert!(Prefix::new("models/u1").is_err());
    /// assert!(Prefix::new("").is_err());
    /// ```
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() || !prefix.ends_with('/') || prefix.contains('\0') {
            exn::bail!(ErrorKind::InvalidPrefix(prefix));
        }
        Ok(Self(prefix))
    }

    /// `models/<user-id>/`
    pub fn for_user(user_id: &str) -> Result<Self> {
        if user_id.is_empty() || user_id.contains('/') {
            exn::bail!(ErrorKind::InvalidPrefix(format!("{}/{user_id}/", Self::MODELS_ROOT)));
        }
        Self::new(format!("{}/{user_id}/", Self::MODELS_ROOT))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `key` lives under this prefix.
    pub fn contains(&self, key: &ObjectKey) -> bool {
        key.as_str().starts_with(&self.0)
    }
}
impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
