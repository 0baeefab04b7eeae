use crate::error::{ErrorKind, Result};
use archeon_storage::LocalCache;
use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

/// Copy the bundled viewer files under `source` into the cache directory,
/// recursively, overwriting anything already there under the same name.
///
/// Runs on every sync regardless of which models are present. A missing
/// `source` is not an error: nothing is copied and a warning is logged.
/// Returns the number of files copied.
#[instrument(skip(cache), fields(target = %cache.root().display()))]
pub async fn provision_viewer_assets(source: &Path, cache: &LocalCache) -> Result<u64> {
    if !source.is_dir() {
        tracing::warn!(source = %source.display(), "Viewer assets not found; skipping provisioning");
        return Ok(0);
    }
    let copied = cache.copy_tree_from(source).await.or_raise(|| ErrorKind::Provision)?;
    tracing::info!(files = copied, "Provisioned viewer assets");
    Ok(copied)
}
