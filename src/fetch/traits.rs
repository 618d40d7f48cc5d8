//! The external downloader collaborator

use async_trait::async_trait;
use std::path::Path;

/// Fetches one listing into a working directory
///
/// On success the implementation must have written the metadata document
/// and zero or more raw `photo_*` files into `output_dir` before returning.
/// On failure the pipeline marks the item failed and does not organize.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use closet_dl::fetch::ItemFetcher;
/// use std::path::Path;
///
/// struct Offline;
///
/// #[async_trait]
/// impl ItemFetcher for Offline {
///     async fn fetch(&self, url: &str, output_dir: &Path) -> closet_dl::Result<()> {
///         let meta = r#"{"title": "Red Coat", "user": {"login": "alice"}}"#;
///         tokio::fs::write(output_dir.join("item.json"), meta).await?;
///         tokio::fs::write(output_dir.join("photo_1.webp"), url).await?;
///         Ok(())
///     }
///
///     fn name(&self) -> &'static str {
///         "offline"
///     }
/// }
/// ```
#[async_trait]
pub trait ItemFetcher: Send + Sync {
    /// Download the listing at `url` into the existing directory `output_dir`
    async fn fetch(&self, url: &str, output_dir: &Path) -> crate::Result<()>;

    /// Short implementation name for logs
    fn name(&self) -> &'static str;
}
