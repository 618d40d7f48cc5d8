//! Retry logic with exponential backoff for the fetch step
//!
//! The downloader talks to a remote marketplace, so some failures are
//! transient. With the default [`RetryConfig`] (`max_attempts = 0`) an
//! operation runs exactly once; raising `max_attempts` opts into bounded
//! retries with exponential backoff and optional jitter.
//!
//! # Example
//!
//! ```no_run
//! use closet_dl::retry::{IsRetryable, fetch_with_retry};
//! use closet_dl::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! fetch_with_retry(&config, || async {
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, FetchError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Fetch(e) => e.is_retryable(),
            // Persistence, metadata and configuration problems need user action
            Error::Config { .. }
            | Error::Serialization(_)
            | Error::Persist { .. }
            | Error::Organize(_) => false,
        }
    }
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // A failing scrape is usually the network or the marketplace
            FetchError::NonZeroExit { .. } | FetchError::Terminated { .. } => true,
            FetchError::Spawn { .. } | FetchError::BinaryNotFound(_) => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Returns the successful result or the last error once the error is
/// permanent or `config.max_attempts` retries have been used.
pub async fn fetch_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                let wait = if config.jitter { add_jitter(delay) } else { delay };

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = wait.as_millis(),
                    "fetch failed, retrying"
                );

                tokio::time::sleep(wait).await;

                // an unusable multiplier pins the delay at the ceiling
                let next = Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
                    .unwrap_or(config.max_delay);
                delay = next.min(config.max_delay);
            }
            Err(e) => {
                if attempt > 0 {
                    tracing::error!(error = %e, attempts = attempt + 1, "fetch failed after all retries");
                }
                return Err(e);
            }
        }
    }
}

/// Add uniform jitter so the delay lands between `delay` and `2 * delay`
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
