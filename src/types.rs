//! Core types for closet-dl

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Timestamp format used for `added_at` in the queue file
pub const ADDED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Queue entry status label
///
/// The five known labels are written by the orchestrator. Any other label
/// found in the queue file is preserved verbatim as [`QueueStatus::Other`];
/// no transition rules are enforced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueueStatus {
    /// Waiting to be processed
    #[default]
    Pending,
    /// Currently handed to the downloader
    Processing,
    /// Downloaded and organized into the closet
    Completed,
    /// Downloaded but not organized
    Downloaded,
    /// Downloader failed
    Failed,
    /// Unrecognized label carried through unchanged
    Other(String),
}

impl QueueStatus {
    /// The label as written to the queue file
    pub fn as_str(&self) -> &str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Completed => "completed",
            QueueStatus::Downloaded => "downloaded",
            QueueStatus::Failed => "failed",
            QueueStatus::Other(label) => label,
        }
    }
}

impl From<String> for QueueStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            "pending" => QueueStatus::Pending,
            "processing" => QueueStatus::Processing,
            "completed" => QueueStatus::Completed,
            "downloaded" => QueueStatus::Downloaded,
            "failed" => QueueStatus::Failed,
            _ => QueueStatus::Other(label),
        }
    }
}

impl From<&str> for QueueStatus {
    fn from(label: &str) -> Self {
        QueueStatus::from(label.to_string())
    }
}

impl From<QueueStatus> for String {
    fn from(status: QueueStatus) -> Self {
        match status {
            QueueStatus::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One URL submitted for processing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Listing URL, unique within the queue
    pub url: String,
    /// Local time the URL was enqueued
    ///
    /// Reading also accepts ISO 8601 and RFC 3339 timestamps. A missing or
    /// unparseable value becomes the load time so the entry itself survives.
    #[serde(with = "added_at_serde", default = "added_at_serde::load_time")]
    pub added_at: NaiveDateTime,
    /// Status label
    #[serde(default)]
    pub status: QueueStatus,
}

/// A processed listing recorded in the duplicate ledger
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Listing URL, compared verbatim for duplicate detection
    #[serde(default)]
    pub url: String,
    /// Listing title as found in the metadata
    #[serde(default)]
    pub title: String,
    /// Number of images organized for this listing
    #[serde(default, rename = "img_count")]
    pub image_count: u64,
}

/// Articles of one seller keyed by article key (`item_<id>` or `article_<n>`)
pub type SellerArticles = BTreeMap<String, ArticleRecord>;

/// Full ledger: seller username to that seller's articles
pub type LedgerData = BTreeMap<String, SellerArticles>;

/// Per-seller aggregate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// Number of recorded articles
    pub articles_count: usize,
    /// Sum of image counts
    pub total_images: u64,
}

/// Ledger-wide aggregate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Number of sellers
    pub total_users: usize,
    /// Number of articles across all sellers
    pub total_articles: usize,
    /// Sum of image counts across all sellers
    pub total_images: u64,
}

/// What happened to a single queue item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Already in the ledger; the downloader was not invoked
    Skipped,
    /// Downloaded and organized
    Completed {
        /// Seller folder the images landed in
        location: PathBuf,
        /// Number of images moved
        images: usize,
    },
    /// Downloaded but left unorganized in its working directory
    Downloaded {
        /// Working directory holding the raw files
        work_dir: PathBuf,
    },
    /// The downloader failed
    Failed {
        /// Error description
        error: String,
    },
}

/// Totals for one queue drain
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Pending entries at the start of the batch
    pub total: usize,
    /// Entries downloaded and organized
    pub completed: usize,
    /// Entries downloaded without organization
    pub downloaded: usize,
    /// Entries skipped as duplicates
    pub skipped: usize,
    /// Entries whose download failed
    pub failed: usize,
    /// Whether the batch stopped early on cancellation
    pub cancelled: bool,
}

impl BatchSummary {
    /// Number of entries actually handled
    pub fn processed(&self) -> usize {
        self.completed + self.downloaded + self.skipped + self.failed
    }

    pub(crate) fn record(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Skipped => self.skipped += 1,
            ItemOutcome::Completed { .. } => self.completed += 1,
            ItemOutcome::Downloaded { .. } => self.downloaded += 1,
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Event emitted by the pipeline
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// URL added to the queue
    Queued {
        /// Listing URL
        url: String,
    },

    /// URL removed from the queue
    Removed {
        /// Listing URL
        url: String,
    },

    /// Queue emptied
    QueueCleared,

    /// Status label written for a queue entry
    StatusChanged {
        /// Listing URL
        url: String,
        /// New status
        status: QueueStatus,
    },

    /// Item handed to the downloader
    Started {
        /// Listing URL
        url: String,
        /// Human-readable label derived from the URL
        label: String,
    },

    /// Item skipped because the ledger already has it
    Skipped {
        /// Listing URL
        url: String,
    },

    /// Downloader failed for this item
    FetchFailed {
        /// Listing URL
        url: String,
        /// Error message
        error: String,
    },

    /// Files organized into the closet
    Organized {
        /// Listing URL
        url: String,
        /// Seller folder
        location: PathBuf,
        /// Files moved successfully
        moved: usize,
        /// Files that could not be moved
        failed: usize,
    },

    /// Organization did not run to completion
    OrganizeFailed {
        /// Listing URL
        url: String,
        /// Collected error messages
        errors: Vec<String>,
    },

    /// Queue drain started
    BatchStarted {
        /// Pending entries in this batch
        total: usize,
    },

    /// Queue drain finished or was cancelled
    BatchFinished {
        /// Totals
        summary: BatchSummary,
    },
}

mod added_at_serde {
    use super::ADDED_AT_FORMAT;
    use chrono::{DateTime, Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Formats tried in order when reading a queue file
    const ACCEPTED_FORMATS: &[&str] = &[
        ADDED_AT_FORMAT,
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(ADDED_AT_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw.as_str().and_then(parse) {
            Some(value) => Ok(value),
            None => {
                tracing::warn!(added_at = %raw, "unreadable queue timestamp, using load time");
                Ok(load_time())
            }
        }
    }

    pub fn load_time() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        ACCEPTED_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.with_timezone(&Local).naive_local())
            })
    }
}
