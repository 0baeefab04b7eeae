use crate::error::{ErrorKind, Result};
use crate::provision::provision_viewer_assets;
use crate::{Outcome, Progress, ProgressSink, SyncEvent, SyncReport};
use archeon_storage::error::Result as StorageResult;
use archeon_storage::{LocalCache, ObjectKey, Prefix, RemoteStore};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use std::path::Path;
use tracing::instrument;

/// Streams [`SyncEvent`]s while mirroring `keys` from `store` into `cache`.
///
/// Keys are handled one at a time, in order. A key whose file name already
/// exists in the cache is skipped without a download; anything else is
/// downloaded and written atomically. A key that fails (no usable file name,
/// download error, write error) is reported as [`Outcome::Failed`] and the
/// stream moves on; nothing is retried.
///
/// An empty `keys` completes immediately without touching the filesystem.
pub fn sync<'a, S>(store: &'a S, keys: Vec<ObjectKey>, cache: &'a LocalCache) -> impl Stream<Item = SyncEvent> + 'a
where
    S: RemoteStore + ?Sized,
{
    stream! {
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        let total = u64::try_from(keys.len()).unwrap_or(u64::MAX);
        yield SyncEvent::Started { total };

        let mut report = SyncReport::default();
        if keys.is_empty() {
            tracing::info!("No files to sync");
            yield SyncEvent::Complete(report);
            return;
        }

        let mut progress = Progress::new(total);
        for key in keys {
            yield SyncEvent::Processing { key: key.clone(), progress };
            let outcome = sync_key(store, cache, &key).await;
            progress.advance();
            yield SyncEvent::Finished { key: key.clone(), outcome: outcome.clone(), progress };
            report.push(key, outcome);
        }

        tracing::info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Sync complete"
        );
        yield SyncEvent::Complete(report);
    }
}

/// Drive [`sync`] to completion, handing every event to `sink`.
pub async fn sync_with<S>(
    store: &S,
    keys: Vec<ObjectKey>,
    cache: &LocalCache,
    sink: &mut impl ProgressSink,
) -> SyncReport
where
    S: RemoteStore + ?Sized,
{
    let mut events = std::pin::pin!(sync(store, keys, cache));
    let mut report = SyncReport::default();
    while let Some(event) = events.next().await {
        sink.on_event(&event);
        if let SyncEvent::Complete(complete) = event {
            report = complete;
        }
    }
    report
}

/// One full sync session for a user: provision the viewer assets, list the
/// user's models, then sync them.
///
/// A listing failure aborts the session before anything is downloaded.
#[instrument(skip_all, fields(store = store.name(), prefix = %prefix))]
pub async fn run<S>(
    store: &S,
    prefix: &Prefix,
    cache: &LocalCache,
    assets: &Path,
    sink: &mut impl ProgressSink,
) -> Result<SyncReport>
where
    S: RemoteStore + ?Sized,
{
    provision_viewer_assets(assets, cache).await?;
    let keys = store.list(prefix).await.or_raise(|| ErrorKind::Listing)?;
    tracing::debug!(keys = keys.len(), "Listed remote models");
    Ok(sync_with(store, keys, cache, sink).await)
}

/// Every remote key under `prefix`, paired with whether a file of the same
/// name is already in `cache`.
///
/// Keys without a usable file name are reported as not cached.
#[instrument(skip_all, fields(store = store.name(), prefix = %prefix))]
pub async fn inventory<S>(store: &S, prefix: &Prefix, cache: &LocalCache) -> Result<Vec<(ObjectKey, bool)>>
where
    S: RemoteStore + ?Sized,
{
    let keys = store.list(prefix).await.or_raise(|| ErrorKind::Listing)?;
    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let cached = match key.file_name() {
            Ok(name) => cache.contains(name).await.or_raise(|| ErrorKind::Cache)?,
            Err(_) => false,
        };
        entries.push((key, cached));
    }
    Ok(entries)
}

#[instrument(skip_all, fields(key = %key))]
async fn sync_key<S>(store: &S, cache: &LocalCache, key: &ObjectKey) -> Outcome
where
    S: RemoteStore + ?Sized,
{
    match try_sync_key(store, cache, key).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(error = ?err, "Failed to sync file");
            Outcome::Failed { reason: failure_reason(err.frame()) }
        },
    }
}

/// The failed frame followed by everything beneath it, so that a missing
/// object and a failed local write read differently in the report.
fn failure_reason(frame: &exn::Frame) -> String {
    let mut reason = frame.error().to_string();
    for child in frame.children() {
        reason.push_str(": ");
        reason.push_str(&failure_reason(child));
    }
    reason
}

async fn try_sync_key<S>(store: &S, cache: &LocalCache, key: &ObjectKey) -> StorageResult<Outcome>
where
    S: RemoteStore + ?Sized,
{
    let name = key.file_name()?;
    if cache.contains(name).await? {
        tracing::debug!(file = name, "Already present, skipping");
        return Ok(Outcome::Skipped);
    }
    let data = store.download(key).await?;
    let bytes = u64::try_from(data.len()).unwrap_or(u64::MAX);
    cache.write_atomic(name, data).await?;
    tracing::info!(file = name, bytes, "Downloaded");
    Ok(Outcome::Downloaded { bytes })
}
