//! Launch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A launch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for launch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The viewer has not been provisioned into the user directory yet.
    #[display("viewer executable not found at {}; sync your files first", _0.display())]
    ExecutableNotFound(#[error(not(source))] PathBuf),
    #[display("no web browser detected on your system")]
    BrowserNotFound,
    #[display("not an http(s) URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// The operating system refused to start the process.
    #[display("could not start {}", _0.display())]
    Spawn(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
