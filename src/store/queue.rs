//! Ordered work queue of listing URLs.

use super::{load_or_default, save_atomic};
use crate::error::Result;
use crate::types::{QueueEntry, QueueStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// On-disk layout: `{"queue": [...]}`
///
/// Entries are decoded one by one so a single bad entry cannot empty the queue.
#[derive(Debug, Default, Deserialize)]
struct QueueFile {
    #[serde(default)]
    queue: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct QueueFileRef<'a> {
    queue: &'a [QueueEntry],
}

/// Persistent queue of URLs, unique by exact string match
///
/// Every mutating call persists the whole queue before returning. When the
/// save fails the in-memory change is kept and `Err(Error::Persist)` is
/// returned; the next successful save writes it out.
#[derive(Debug)]
pub struct QueueStore {
    path: PathBuf,
    entries: Mutex<Vec<QueueEntry>>,
}

impl QueueStore {
    /// Open the queue backed by `path`
    ///
    /// A missing or malformed file yields an empty queue. Within a readable
    /// file, an entry without a usable `url` is dropped with a warning and
    /// the rest are kept.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file: QueueFile = load_or_default(&path).await;

        let entries: Vec<QueueEntry> = file
            .queue
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value(raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(path = ?path, index, error = %e, "dropping unreadable queue entry");
                    None
                }
            })
            .collect();

        tracing::debug!(path = ?path, entries = entries.len(), "queue loaded");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `url` as a pending entry, or return the existing entry unchanged
    pub async fn add(&self, url: &str) -> Result<QueueEntry> {
        self.insert(url).await.map(|(entry, _)| entry)
    }

    /// Like [`add`](Self::add), also reporting whether a new entry was created
    ///
    /// The check and the append happen under one lock, so concurrent callers
    /// for the same URL see exactly one `true`.
    pub async fn insert(&self, url: &str) -> Result<(QueueEntry, bool)> {
        let mut entries = self.entries.lock().await;

        if let Some(existing) = entries.iter().find(|e| e.url == url) {
            tracing::debug!(url, status = %existing.status, "url already queued");
            return Ok((existing.clone(), false));
        }

        let entry = QueueEntry {
            url: url.to_string(),
            added_at: chrono::Local::now().naive_local(),
            status: QueueStatus::Pending,
        };
        entries.push(entry.clone());
        self.persist(&entries).await?;

        tracing::info!(url, queued = entries.len(), "url added to queue");
        Ok((entry, true))
    }

    /// Drop every entry for `url`; returns whether anything was removed
    pub async fn remove(&self, url: &str) -> Result<bool> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.url != url);

        if entries.len() == before {
            return Ok(false);
        }

        self.persist(&entries).await?;
        tracing::info!(url, removed = before - entries.len(), "url removed from queue");
        Ok(true)
    }

    /// All entries in insertion order
    pub async fn get_all(&self) -> Vec<QueueEntry> {
        self.entries.lock().await.clone()
    }

    /// Pending entries in insertion order
    pub async fn get_pending(&self) -> Vec<QueueEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.status == QueueStatus::Pending)
            .cloned()
            .collect()
    }

    /// Look up the first entry for `url`
    pub async fn get(&self, url: &str) -> Option<QueueEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|e| e.url == url)
            .cloned()
    }

    /// Number of entries
    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Number of pending entries
    pub async fn count_pending(&self) -> usize {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.status == QueueStatus::Pending)
            .count()
    }

    /// Overwrite the status of the first entry for `url`
    ///
    /// No transition rules are enforced. Returns `Ok(false)` when the URL is
    /// not queued.
    pub async fn update_status(&self, url: &str, status: impl Into<QueueStatus>) -> Result<bool> {
        let status = status.into();
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.iter_mut().find(|e| e.url == url) else {
            tracing::debug!(url, %status, "status update for unknown url");
            return Ok(false);
        };
        entry.status = status;
        self.persist(&entries).await?;
        Ok(true)
    }

    /// Remove every entry
    pub async fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.clear();
        self.persist(&entries).await?;
        tracing::info!("queue cleared");
        Ok(())
    }

    async fn persist(&self, entries: &[QueueEntry]) -> Result<()> {
        save_atomic(&self.path, &QueueFileRef { queue: entries })
            .await
            .inspect_err(|e| tracing::warn!(path = ?self.path, error = %e, "failed to save queue"))
    }
}
