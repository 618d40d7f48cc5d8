//! Orchestrator: drains the queue one listing at a time
//!
//! A [`Pipeline`] is the single context object that owns the queue store,
//! the duplicate ledger, the organizer and the fetcher. It is cheap to
//! clone; clones share all state, so a front end can enqueue from one clone
//! while a background task drains the queue with another.
//!
//! ## Submodules
//!
//! - `process`: one listing: duplicate skip, fetch, organize, ledger record
//! - `batch`: draining all pending entries with cooperative cancellation

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{CliFetcher, ItemFetcher};
use crate::organizer::FileOrganizer;
use crate::store::{DuplicateLedger, QueueStore};
use crate::types::{Event, QueueEntry, QueueStatus};
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};

mod batch;
mod process;

/// Capacity of the event channel; slow subscribers miss older events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Queue orchestrator
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) config: Arc<Config>,
    pub(crate) queue: Arc<QueueStore>,
    pub(crate) ledger: Arc<DuplicateLedger>,
    pub(crate) organizer: Arc<FileOrganizer>,
    pub(crate) fetcher: Arc<dyn ItemFetcher>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Held for the whole of one item so only one listing is ever in flight
    pub(crate) in_flight: Arc<Mutex<()>>,
}

impl Pipeline {
    /// Build a pipeline that runs the configured external downloader
    ///
    /// Loads the queue and ledger files; missing or malformed files start
    /// empty. Fails only on invalid configuration.
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(CliFetcher::from_config(&config.fetcher));
        Self::with_fetcher(config, fetcher).await
    }

    /// Build a pipeline around a custom [`ItemFetcher`]
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn ItemFetcher>) -> Result<Self> {
        config.validate()?;

        let queue = QueueStore::open(&config.paths.queue_file).await;
        let ledger = DuplicateLedger::open(&config.paths.ledger_file).await;

        let mut organizer_config = config.organizer.clone();
        organizer_config.closet_dir = Some(config.closet_dir());
        let organizer = FileOrganizer::new(organizer_config);

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        tracing::info!(
            fetcher = fetcher.name(),
            queue_file = ?config.paths.queue_file,
            ledger_file = ?config.paths.ledger_file,
            closet = ?config.closet_dir(),
            "pipeline ready"
        );

        Ok(Self {
            config: Arc::new(config),
            queue: Arc::new(queue),
            ledger: Arc::new(ledger),
            organizer: Arc::new(organizer),
            fetcher,
            event_tx,
            in_flight: Arc::new(Mutex::new(())),
        })
    }

    /// Subscribe to pipeline events
    ///
    /// Each subscriber receives events emitted after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The queue store
    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    /// The duplicate ledger
    pub fn ledger(&self) -> &DuplicateLedger {
        &self.ledger
    }

    /// The organizer, with the closet root already resolved
    pub fn organizer(&self) -> &FileOrganizer {
        &self.organizer
    }

    /// Add a URL to the queue (idempotent)
    pub async fn enqueue(&self, url: &str) -> Result<QueueEntry> {
        let (entry, created) = self.queue.insert(url).await?;
        if created {
            self.emit_event(Event::Queued {
                url: url.to_string(),
            });
        }
        Ok(entry)
    }

    /// Remove a URL from the queue
    pub async fn remove(&self, url: &str) -> Result<bool> {
        let removed = self.queue.remove(url).await?;
        if removed {
            self.emit_event(Event::Removed {
                url: url.to_string(),
            });
        }
        Ok(removed)
    }

    /// Empty the queue
    pub async fn clear_queue(&self) -> Result<()> {
        self.queue.clear().await?;
        self.emit_event(Event::QueueCleared);
        Ok(())
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // no receivers is fine
        self.event_tx.send(event).ok();
    }

    /// Write a status label; a failed save is logged and processing continues
    pub(crate) async fn set_status(&self, url: &str, status: QueueStatus) {
        match self.queue.update_status(url, status.clone()).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(url, %status, "url not queued, status not recorded"),
            Err(e) => tracing::warn!(url, %status, error = %e, "status kept in memory only"),
        }
        self.emit_event(Event::StatusChanged {
            url: url.to_string(),
            status,
        });
    }
}


// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
