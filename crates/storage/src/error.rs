//! Storage Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Remote failures are always rooted in either [`ErrorKind::Listing`] or
//! [`ErrorKind::Download`], with the transport/status/body problem attached
//! as a child frame. Callers decide what to do from the root: a listing
//! failure aborts a sync session, a download failure only fails one file.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// File does not exist
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied on the local filesystem
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Local path (or file name derived from a key) escapes the cache root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Listing prefix is empty or lacks a trailing separator
    #[display("invalid prefix `{_0}`: must be non-empty and end with `/`")]
    InvalidPrefix(#[error(not(source))] String),
    /// Object key has no usable file name
    #[display("invalid object key `{_0}`")]
    InvalidKey(#[error(not(source))] String),
    /// Storage endpoint URL could not be parsed
    #[display("invalid storage endpoint `{_0}`")]
    InvalidEndpoint(#[error(not(source))] String),
    /// Transport-level failure talking to the storage API
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Storage API answered with a non-success status
    #[display("unexpected HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// Storage API answered with a body we could not understand
    #[display("malformed response: {_0}")]
    MalformedResponse(#[error(not(source))] String),
    /// Listing objects under a prefix failed; the sync session cannot start
    #[display("could not list objects under `{_0}`")]
    Listing(#[error(not(source))] String),
    /// Downloading a single object failed
    #[display("could not download `{_0}`")]
    Download(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in this workspace retries automatically; this is informational
    /// for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Network(_) => true,
            Self::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}
