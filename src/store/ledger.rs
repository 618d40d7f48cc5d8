//! Duplicate ledger: seller → article key → record.

use super::{load_or_default, save_atomic};
use crate::error::Result;
use crate::types::{ArticleRecord, GlobalStats, LedgerData, SellerArticles, UserStats};
use crate::utils::extract_item_id;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Persistent record of fully processed listings
///
/// Lookups compare stored URLs verbatim across every seller; keys only
/// group records on disk. Records are never pruned.
#[derive(Debug)]
pub struct DuplicateLedger {
    path: PathBuf,
    data: Mutex<LedgerData>,
}

impl DuplicateLedger {
    /// Open the ledger backed by `path`
    ///
    /// A missing or malformed file yields an empty ledger.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data: LedgerData = load_or_default(&path).await;
        tracing::debug!(path = ?path, sellers = data.len(), "ledger loaded");
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any record under any seller has exactly this URL
    pub async fn is_already_downloaded(&self, url: &str) -> bool {
        let data = self.data.lock().await;
        let found = data
            .iter()
            .find(|(_, articles)| articles.values().any(|record| record.url == url));

        match found {
            Some((seller, _)) => {
                tracing::debug!(url, seller = %seller, "listing already in ledger");
                true
            }
            None => false,
        }
    }

    /// Record a processed listing and persist the ledger
    ///
    /// The article key is `item_<id>` when the URL carries an item id,
    /// otherwise `article_<n>` where `n` is one more than the seller's
    /// current record count. Returns the key that was written.
    pub async fn add_download_record(
        &self,
        username: &str,
        title: &str,
        url: &str,
        image_count: u64,
    ) -> Result<String> {
        let mut data = self.data.lock().await;
        let articles = data.entry(username.to_string()).or_default();

        let key = match extract_item_id(url) {
            Some(id) => format!("item_{id}"),
            None => format!("article_{}", articles.len() + 1),
        };

        articles.insert(
            key.clone(),
            ArticleRecord {
                url: url.to_string(),
                title: title.to_string(),
                image_count,
            },
        );

        tracing::debug!(seller = username, key = %key, image_count, "ledger record added");

        save_atomic(&self.path, &*data)
            .await
            .inspect_err(|e| tracing::warn!(path = ?self.path, error = %e, "failed to save ledger"))?;

        Ok(key)
    }

    /// Article count and image total for one seller (zeros when unknown)
    pub async fn get_user_stats(&self, username: &str) -> UserStats {
        let data = self.data.lock().await;
        data.get(username).map(seller_stats).unwrap_or_default()
    }

    /// Seller, article and image totals across the ledger
    pub async fn get_global_stats(&self) -> GlobalStats {
        let data = self.data.lock().await;
        data.values().fold(
            GlobalStats {
                total_users: data.len(),
                ..Default::default()
            },
            |mut acc, articles| {
                let stats = seller_stats(articles);
                acc.total_articles += stats.articles_count;
                acc.total_images += stats.total_images;
                acc
            },
        )
    }

    /// Snapshot of the full ledger
    pub async fn list_downloaded_items(&self) -> LedgerData {
        self.data.lock().await.clone()
    }

    /// Snapshot of one seller's records (empty when unknown)
    pub async fn list_user_items(&self, username: &str) -> SellerArticles {
        self.data
            .lock()
            .await
            .get(username)
            .cloned()
            .unwrap_or_default()
    }
}

fn seller_stats(articles: &SellerArticles) -> UserStats {
    UserStats {
        articles_count: articles.len(),
        total_images: articles.values().map(|r| r.image_count).sum(),
    }
}
