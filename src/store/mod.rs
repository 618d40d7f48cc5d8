//! Whole-file JSON persistence for the queue and the duplicate ledger
//!
//! Each store owns its backing file exclusively while the process runs and
//! serializes its load-mutate-persist cycle behind a `tokio::sync::Mutex`.
//!
//! ## Submodules
//!
//! - [`queue`] — ordered work queue of listing URLs with status labels
//! - [`ledger`] — seller → article record of fully processed listings
//!
//! Both share the same file discipline:
//! - a missing or malformed file loads as an empty structure plus a warning
//! - every mutation rewrites the whole file through a temporary sibling and
//!   an atomic rename, so a crash mid-write never leaves a truncated file

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

mod ledger;
mod queue;

pub use ledger::DuplicateLedger;
pub use queue::QueueStore;

/// Load a JSON document, degrading to `T::default()` when it is missing or unreadable
pub async fn load_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(?path, "state file does not exist, starting empty");
            return T::default();
        }
        Err(e) => {
            tracing::warn!(?path, error = %e, "cannot read state file, starting empty");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => {
            tracing::debug!(?path, "loaded state file");
            value
        }
        Err(e) => {
            tracing::warn!(?path, error = %e, "malformed state file, starting empty");
            T::default()
        }
    }
}

/// Write `value` as pretty JSON to `path` via a temporary file and rename
///
/// Parent directories are created as needed.
pub async fn save_atomic<T>(path: &Path, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let persist_err = |reason: String| Error::Persist {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = serde_json::to_vec_pretty(value).map_err(|e| persist_err(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| persist_err(format!("cannot create {}: {}", parent.display(), e)))?;
    }

    let tmp = temp_path(path);
    let write = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.write_all(b"\n").await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    };

    if let Err(e) = write.await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(persist_err(e.to_string()));
    }

    tracing::debug!(?path, bytes = bytes.len(), "saved state file");
    Ok(())
}

/// `<file name>.tmp` next to the target
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state".into());
    name.push(".tmp");
    path.with_file_name(name)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
