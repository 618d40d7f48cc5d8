//! # closet-dl
//!
//! Queue-driven downloader and organizer for second-hand marketplace listings.
//!
//! Listing URLs go into a persistent queue. Draining the queue hands each
//! URL to an external downloader, then moves the downloaded photos into a
//! per-seller "closet" under sequential, filesystem-safe names, and records
//! the listing in a duplicate ledger so it is never fetched twice.
//!
//! ## Layout
//!
//! - [`store`]: the JSON-backed queue and duplicate ledger
//! - [`organizer`]: metadata lookup, name normalization and photo moves
//! - [`fetch`]: the downloader seam ([`ItemFetcher`]) and its CLI implementation
//! - [`pipeline`]: the orchestrator tying them together
//!
//! ## Quick Start
//!
//! ```no_run
//! use closet_dl::{Config, Pipeline};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::new(Config::default()).await?;
//!
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     pipeline.enqueue("https://www.vinted.it/items/4242-red-coat").await?;
//!     let summary = pipeline.process_queue(&CancellationToken::new()).await;
//!     println!("{} completed, {} failed", summary.completed, summary.failed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
pub mod fetch;
pub mod organizer;
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
pub mod store;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, FetchError, OrganizeError, Result};
pub use fetch::{CliFetcher, ItemFetcher};
pub use organizer::{FileOrganizer, OrganizationResult};
pub use pipeline::Pipeline;
pub use store::{DuplicateLedger, QueueStore};
pub use types::{BatchSummary, Event, ItemOutcome, QueueEntry, QueueStatus};

use tokio_util::sync::CancellationToken;

/// Drain the queue, stopping between items on SIGTERM or Ctrl+C
///
/// The listing in flight when the signal arrives is finished first, so the
/// queue and ledger never disagree about it.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use closet_dl::{Config, Pipeline, process_until_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pipeline = Pipeline::new(Config::default()).await?;
///     let summary = process_until_shutdown(&pipeline).await;
///     println!("{summary:?}");
///     Ok(())
/// }
/// ```
pub async fn process_until_shutdown(pipeline: &Pipeline) -> BatchSummary {
    let cancel = CancellationToken::new();

    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            tracing::info!("finishing current listing before stopping");
            cancel.cancel();
        })
    };

    let summary = pipeline.process_queue(&cancel).await;
    watcher.abort();
    summary
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("received SIGTERM");
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("received SIGINT");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C"),
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
    }
}
