//! Sync Error Types
//!
//! Only whole-session failures live here. A single file failing to download
//! or to be written is not an error of the session: it is reported as
//! [`Outcome::Failed`](crate::Outcome::Failed) and the session carries on.

use derive_more::{Display, Error};

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The remote listing failed; nothing was downloaded
    #[display("could not list remote models")]
    Listing,
    /// Copying the bundled viewer files failed
    #[display("could not provision viewer assets")]
    Provision,
    /// The local cache directory could not be inspected
    #[display("could not read the local model cache")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Listing)
    }
}
