//! Configuration types for closet-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Locations of the backing files and the download area
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Queue file (default: "data/download_queue.json")
    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,

    /// Duplicate ledger file (default: "data/downloaded_items.json")
    #[serde(default = "default_ledger_file")]
    pub ledger_file: PathBuf,

    /// Directory under which per-item working directories are created (default: "downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            queue_file: default_queue_file(),
            ledger_file: default_ledger_file(),
            download_dir: default_download_dir(),
        }
    }
}

/// File organizer settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Closet root. When unset the organizer uses `<base_directory>/closet`
    /// and the pipeline uses `<download_dir>/closet`.
    #[serde(default)]
    pub closet_dir: Option<PathBuf>,

    /// Name of the metadata document written by the downloader (default: "item.json")
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// Filename prefix of raw photo files (default: "photo_")
    #[serde(default = "default_photo_prefix")]
    pub photo_prefix: String,

    /// Extensions accepted as photos, without the dot
    #[serde(default = "default_photo_extensions")]
    pub photo_extensions: Vec<String>,

    /// Maximum length of a normalized seller or title component (default: 100)
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            closet_dir: None,
            metadata_file: default_metadata_file(),
            photo_prefix: default_photo_prefix(),
            photo_extensions: default_photo_extensions(),
            max_name_length: default_max_name_length(),
        }
    }
}

/// Orchestration behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Skip items already recorded in the ledger (default: true)
    #[serde(default = "default_true")]
    pub skip_duplicates: bool,

    /// Organize fetched files into the closet (default: true)
    #[serde(default = "default_true")]
    pub auto_organize: bool,

    /// Remove the per-item working directory after a successful organize (default: true)
    #[serde(default = "default_true")]
    pub cleanup_work_dir: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            skip_duplicates: true,
            auto_organize: true,
            cleanup_work_dir: true,
        }
    }
}

/// External downloader invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Program to execute (default: "vinted-downloader")
    #[serde(default = "default_fetcher_program")]
    pub program: PathBuf,

    /// Argument template; `{url}` and `{output_dir}` are substituted per item
    #[serde(default = "default_fetcher_args")]
    pub args: Vec<String>,

    /// Resolve `program` through PATH (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            program: default_fetcher_program(),
            args: default_fetcher_args(),
            search_path: true,
        }
    }
}

/// Retry configuration for the fetch step
///
/// `max_attempts` defaults to 0 so a failed download is reported as failed
/// right away; raise it to opt into bounded retries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 0)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for the pipeline
///
/// Every section falls back to its defaults, so an empty JSON object is a
/// valid configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backing files and download area
    #[serde(default)]
    pub paths: PathsConfig,

    /// File organizer
    #[serde(default)]
    pub organizer: OrganizerConfig,

    /// Orchestration toggles
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// External downloader
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Fetch retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the organizer or fetcher cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.organizer.metadata_file.trim().is_empty() {
            return Err(invalid("organizer.metadata_file", "must not be empty"));
        }
        if self.organizer.photo_prefix.is_empty() {
            return Err(invalid("organizer.photo_prefix", "must not be empty"));
        }
        if self.organizer.photo_extensions.is_empty() {
            return Err(invalid(
                "organizer.photo_extensions",
                "at least one extension is required",
            ));
        }
        if self.organizer.max_name_length == 0 {
            return Err(invalid("organizer.max_name_length", "must be positive"));
        }
        if self.fetcher.program.as_os_str().is_empty() {
            return Err(invalid("fetcher.program", "must not be empty"));
        }
        let multiplier = self.retry.backoff_multiplier;
        if self.retry.max_attempts > 0 && !(multiplier.is_finite() && multiplier >= 1.0) {
            return Err(invalid(
                "retry.backoff_multiplier",
                "must be a finite number >= 1.0 when retries are enabled",
            ));
        }
        Ok(())
    }

    /// Closet root used by the pipeline
    pub fn closet_dir(&self) -> PathBuf {
        self.organizer
            .closet_dir
            .clone()
            .unwrap_or_else(|| self.paths.download_dir.join("closet"))
    }
}

fn invalid(key: &str, message: &str) -> Error {
    Error::Config {
        message: format!("{key} {message}"),
        key: Some(key.to_string()),
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_file() -> PathBuf {
    PathBuf::from("data/download_queue.json")
}

fn default_ledger_file() -> PathBuf {
    PathBuf::from("data/downloaded_items.json")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_metadata_file() -> String {
    "item.json".to_string()
}

fn default_photo_prefix() -> String {
    "photo_".to_string()
}

fn default_photo_extensions() -> Vec<String> {
    vec!["webp".into(), "jpg".into(), "jpeg".into(), "png".into()]
}

fn default_max_name_length() -> usize {
    100
}

fn default_fetcher_program() -> PathBuf {
    PathBuf::from("vinted-downloader")
}

fn default_fetcher_args() -> Vec<String> {
    vec!["{url}".into(), "-o".into(), "{output_dir}".into()]
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
