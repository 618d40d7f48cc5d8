//! External downloader integration
//!
//! The downloader that scrapes a listing is an external collaborator. The
//! pipeline only talks to it through the [`ItemFetcher`] trait:
//!
//! - [`CliFetcher`]: runs an external program with a templated argument list
//! - any custom implementation injected with
//!   [`Pipeline::with_fetcher`](crate::Pipeline::with_fetcher)
//!
//! ## Usage
//!
//! ```no_run
//! use closet_dl::config::FetcherConfig;
//! use closet_dl::fetch::{CliFetcher, ItemFetcher};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> closet_dl::Result<()> {
//!     let fetcher = CliFetcher::from_config(&FetcherConfig::default());
//!     let work_dir = Path::new("downloads/item_4242");
//!     tokio::fs::create_dir_all(work_dir).await?;
//!     fetcher.fetch("https://www.vinted.it/items/4242-red-coat", work_dir).await?;
//!     Ok(())
//! }
//! ```

mod cli;
mod traits;

pub use cli::{CliFetcher, OUTPUT_DIR_PLACEHOLDER, URL_PLACEHOLDER};
pub use traits::ItemFetcher;
