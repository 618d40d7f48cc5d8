//! Processing of a single listing.

use super::Pipeline;
use crate::organizer::OrganizationResult;
use crate::retry::fetch_with_retry;
use crate::types::{Event, ItemOutcome, QueueStatus};
use crate::utils::{item_label_from_url, work_dir_name};
use std::path::Path;

impl Pipeline {
    /// Run one listing through the pipeline
    ///
    /// 1. already in the ledger (and duplicates are skipped): mark it
    ///    successful without calling the downloader
    /// 2. mark `processing` and fetch into `<download_dir>/<work dir>`;
    ///    a fetch failure marks `failed`
    /// 3. with auto-organize off, mark `downloaded`
    /// 4. organize into the closet; success records the listing in the
    ///    ledger and marks `completed`, anything else leaves the files in
    ///    the working directory and marks `downloaded`
    ///
    /// Only one listing is processed at a time across all clones of the
    /// pipeline. No timeout is applied: a downloader that never exits keeps
    /// the item in flight indefinitely.
    pub async fn process_item(&self, url: &str) -> ItemOutcome {
        let _slot = self.in_flight.lock().await;

        let processing = &self.config.processing;
        let success_status = if processing.auto_organize {
            QueueStatus::Completed
        } else {
            QueueStatus::Downloaded
        };

        if processing.skip_duplicates && self.ledger.is_already_downloaded(url).await {
            tracing::info!(url, "already downloaded, skipping");
            self.emit_event(Event::Skipped {
                url: url.to_string(),
            });
            self.set_status(url, success_status).await;
            return ItemOutcome::Skipped;
        }

        let label = item_label_from_url(url);
        tracing::info!(url, label = %label, "processing listing");
        self.set_status(url, QueueStatus::Processing).await;
        self.emit_event(Event::Started {
            url: url.to_string(),
            label,
        });

        let work_dir = self.config.paths.download_dir.join(work_dir_name(url));
        if let Err(error) = self.fetch_into(url, &work_dir).await {
            tracing::error!(url, error = %error, "download failed");
            self.emit_event(Event::FetchFailed {
                url: url.to_string(),
                error: error.clone(),
            });
            self.set_status(url, QueueStatus::Failed).await;
            return ItemOutcome::Failed { error };
        }

        if !processing.auto_organize {
            tracing::info!(url, work_dir = ?work_dir, "downloaded without organizing");
            self.set_status(url, QueueStatus::Downloaded).await;
            return ItemOutcome::Downloaded { work_dir };
        }

        let report = self.organizer.organize(&work_dir).await;
        let Some(location) = report.final_location.clone().filter(|_| report.success) else {
            tracing::warn!(url, work_dir = ?work_dir, errors = ?report.errors, "organize failed, files left in place");
            self.emit_event(Event::OrganizeFailed {
                url: url.to_string(),
                errors: report.errors,
            });
            self.set_status(url, QueueStatus::Downloaded).await;
            return ItemOutcome::Downloaded { work_dir };
        };

        self.record_in_ledger(url, &report).await;

        self.emit_event(Event::Organized {
            url: url.to_string(),
            location: location.clone(),
            moved: report.moved_count(),
            failed: report.failed_count(),
        });

        if processing.cleanup_work_dir {
            self.cleanup_work_dir(&work_dir, &report).await;
        }

        self.set_status(url, QueueStatus::Completed).await;
        tracing::info!(url, location = ?location, images = report.moved_count(), "listing completed");

        ItemOutcome::Completed {
            location,
            images: report.moved_count(),
        }
    }

    /// Create the working directory and run the fetcher with the retry policy
    async fn fetch_into(&self, url: &str, work_dir: &Path) -> std::result::Result<(), String> {
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|e| format!("cannot create working directory {}: {}", work_dir.display(), e))?;

        fetch_with_retry(&self.config.retry, || self.fetcher.fetch(url, work_dir))
            .await
            .map_err(|e| e.to_string())
    }

    /// Record an organized listing; a failed save is only logged
    async fn record_in_ledger(&self, url: &str, report: &OrganizationResult) {
        let (Some(username), Some(title)) = (&report.username, &report.title) else {
            tracing::warn!(url, "organize report without identity, not recorded");
            return;
        };

        let images = report.moved_count() as u64;
        match self
            .ledger
            .add_download_record(username, title, url, images)
            .await
        {
            Ok(key) => tracing::debug!(url, seller = %username, key = %key, "recorded in ledger"),
            Err(e) => tracing::warn!(url, error = %e, "ledger not saved, listing may be fetched again"),
        }
    }

    /// Remove the working directory unless photos were left behind in it
    async fn cleanup_work_dir(&self, work_dir: &Path, report: &OrganizationResult) {
        if report.failed_count() > 0 {
            tracing::debug!(work_dir = ?work_dir, "keeping working directory with unmoved photos");
            return;
        }
        if closet_inside(work_dir, report.final_location.as_deref()) {
            tracing::debug!(work_dir = ?work_dir, "closet lives inside working directory, keeping it");
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
            tracing::warn!(work_dir = ?work_dir, error = %e, "failed to remove working directory");
        }
    }
}

fn closet_inside(work_dir: &Path, location: Option<&Path>) -> bool {
    location.is_some_and(|loc| loc.starts_with(work_dir))
}
