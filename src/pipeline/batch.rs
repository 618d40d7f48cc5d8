//! Draining the queue.

use super::Pipeline;
use crate::types::{BatchSummary, Event, QueueStatus};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

impl Pipeline {
    /// Process every pending entry in queue order
    ///
    /// The pending list is snapshotted at the start. Cancellation is checked
    /// between items only: an item that has started always runs to the end,
    /// so callers should expect to wait for the current download after
    /// cancelling. Entries removed or re-labelled while the batch runs are
    /// passed over.
    pub async fn process_queue(&self, cancel: &CancellationToken) -> BatchSummary {
        let pending = self.queue.get_pending().await;
        let mut summary = BatchSummary {
            total: pending.len(),
            ..Default::default()
        };

        tracing::info!(total = summary.total, "starting batch");
        self.emit_event(Event::BatchStarted {
            total: summary.total,
        });

        for entry in pending {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                tracing::info!(
                    processed = summary.processed(),
                    remaining = summary.total - summary.processed(),
                    "batch cancelled"
                );
                break;
            }

            let still_pending = self
                .queue
                .get(&entry.url)
                .await
                .is_some_and(|current| current.status == QueueStatus::Pending);
            if !still_pending {
                tracing::debug!(url = %entry.url, "entry no longer pending, passing over");
                continue;
            }

            let outcome = self.process_item(&entry.url).await;
            summary.record(&outcome);
        }

        tracing::info!(
            completed = summary.completed,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "batch finished"
        );
        self.emit_event(Event::BatchFinished { summary });

        summary
    }

    /// Drain the queue on a background task
    ///
    /// The front end keeps its own clone of the pipeline to enqueue and read
    /// state while the batch runs.
    pub fn spawn_batch(&self, cancel: CancellationToken) -> JoinHandle<BatchSummary> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.process_queue(&cancel).await })
    }
}
