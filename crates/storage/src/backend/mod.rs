//! Remote store trait and implementations.
//!
//! This module defines the [`RemoteStore`] trait: the two operations the sync
//! routine needs from a cloud object store (list keys under a prefix,
//! download one object). The production implementation talks to the
//! Firebase Cloud Storage REST API; a scripted in-memory store is available
//! behind the `mock` feature for tests in dependent crates.

mod firebase;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::firebase::FirebaseStore;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockStore;
use crate::error::Result;
use crate::key::{ObjectKey, Prefix};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub(crate) type ObjectKeyStream<'a> = Pin<Box<dyn Stream<Item = Result<ObjectKey>> + Send + 'a>>;

/// Unified interface for remote object stores.
///
/// Implementations are scoped to one credential (a signed-in user); the
/// caller only supplies the prefix and keys.
///
/// # Examples
///
/// ```
/// use archeon_storage::{ObjectKey, Prefix, RemoteStore, error::Result};
///
/// async fn total_size(store: &dyn RemoteStore, prefix: &Prefix) -> Result<usize> {
///     let mut total = 0;
///     for key in store.list(prefix).await? {
///         total += store.download(&key).await?.len();
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// List every object key under `prefix`, in the order the backend
    /// returns them.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`]. Any error is rooted in
    /// [`Listing`](crate::error::ErrorKind::Listing).
    async fn list(&self, prefix: &Prefix) -> Result<Vec<ObjectKey>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Stream object keys under `prefix` as pages arrive.
    ///
    /// The stream ends after the first error.
    fn list_stream<'a>(&'a self, prefix: &'a Prefix) -> ObjectKeyStream<'a>;

    /// Fetch the raw bytes of one object.
    ///
    /// Any error is rooted in [`Download`](crate::error::ErrorKind::Download).
    async fn download(&self, key: &ObjectKey) -> Result<Vec<u8>>;
}
