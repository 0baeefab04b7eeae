//! In-memory remote store for testing.

use super::ObjectKeyStream;
use crate::error::{ErrorKind, Result};
use crate::key::{ObjectKey, Prefix};
use crate::RemoteStore;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory remote store for testing.
///
/// Objects keep their insertion order, which is the order [`list`](RemoteStore::list)
/// returns them in. Downloads of keys marked with [`failing`](Self::failing)
/// answer a `Download` error with an HTTP 500 child, and every download call
/// (successful or not) is counted.
///
/// # Examples
///
/// Requires the `mock` feature.
///
/// ```ignore
/// use archeon_storage::{MockStore, ObjectKey, Prefix, RemoteStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_objects([
///     ("models/u1/a.gs", b"splat a"),
///     ("models/u1/b.gs", b"splat b"),
/// ])
/// .failing("models/u1/b.gs");
/// let keys = store.list(&Prefix::for_user("u1")?).await?;
/// assert_eq!(keys.len(), 2);
/// assert!(store.download(&ObjectKey::new("models/u1/b.gs")).await.is_err());
/// assert_eq!(store.download_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    objects: Vec<(ObjectKey, Vec<u8>)>,
    failing: HashSet<ObjectKey>,
    listing_fails: bool,
    downloads: AtomicUsize,
    downloaded: Mutex<Vec<ObjectKey>>,
}

impl MockStore {
    /// Create a mock store pre-populated with objects.
    pub fn with_objects(objects: impl IntoIterator<Item = (impl Into<ObjectKey>, impl AsRef<[u8]>)>) -> Self {
        Self {
            name: "mock".to_string(),
            objects: objects.into_iter().map(|(key, data)| (key.into(), data.as_ref().to_vec())).collect(),
            failing: HashSet::new(),
            listing_fails: false,
            downloads: AtomicUsize::new(0),
            downloaded: Mutex::new(Vec::new()),
        }
    }

    /// Make downloads of `key` fail.
    pub fn failing(mut self, key: impl Into<ObjectKey>) -> Self {
        self.failing.insert(key.into());
        self
    }

    /// Make listing fail as if the backend answered HTTP 403.
    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Number of download calls made so far.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Keys passed to [`download`](RemoteStore::download), in call order.
    pub fn downloaded(&self) -> Vec<ObjectKey> {
        self.downloaded.lock().map(|keys| keys.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: &'a Prefix) -> ObjectKeyStream<'a> {
        Box::pin(stream! {
            if self.listing_fails {
                let err = exn::Exn::from(ErrorKind::Status(403)).raise(ErrorKind::Listing(prefix.to_string()));
                yield Err(err);
                return;
            }
            for (key, _) in self.objects.iter().filter(|(key, _)| prefix.contains(key)) {
                yield Ok(key.clone());
            }
        })
    }

    async fn download(&self, key: &ObjectKey) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut keys) = self.downloaded.lock() {
            keys.push(key.clone());
        }
        if self.failing.contains(key) {
            let err = exn::Exn::from(ErrorKind::Status(500)).raise(ErrorKind::Download(key.to_string()));
            return Err(err);
        }
        let data = self.objects.iter().find(|(k, _)| k == key).map(|(_, data)| data.clone());
        match data {
            Some(data) => Ok(data),
            None => Err(exn::Exn::from(ErrorKind::Status(404)).raise(ErrorKind::Download(key.to_string()))),
        }
    }
}
