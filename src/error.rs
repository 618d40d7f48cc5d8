//! Error types for closet-dl
//!
//! This module provides the error hierarchy for the library:
//! - A top-level [`Error`] returned by fallible store, fetch and pipeline operations
//! - [`OrganizeError`] describing why a working directory could not be organized
//! - [`FetchError`] describing failures of the external downloader
//!
//! The organizer never returns these as `Err`; it renders them into
//! [`OrganizationResult::errors`](crate::organizer::OrganizationResult) so that
//! callers always receive a complete report.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for closet-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for closet-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "organizer.metadata_file")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a backing file (queue or ledger) failed
    #[error("failed to persist {path}: {reason}")]
    Persist {
        /// The file that could not be written
        path: PathBuf,
        /// The reason the write failed
        reason: String,
    },

    /// File organization error
    #[error("organize error: {0}")]
    Organize(#[from] OrganizeError),

    /// External downloader error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Reasons a working directory could not be (fully) organized
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The metadata document is missing from the working directory
    #[error("metadata document not found: {path}")]
    MetadataNotFound {
        /// Where the metadata document was expected
        path: PathBuf,
    },

    /// The metadata document exists but is not a valid JSON object
    #[error("invalid metadata document {path}: {reason}")]
    InvalidMetadata {
        /// The metadata document path
        path: PathBuf,
        /// Parse failure description
        reason: String,
    },

    /// None of the seller login paths resolved to a non-empty value
    #[error("seller username not found in metadata (tried {tried})")]
    MissingUsername {
        /// The accessor paths that were tried, comma separated
        tried: String,
    },

    /// The metadata has no usable title
    #[error("title not found in metadata")]
    MissingTitle,

    /// No raw photo files matched the naming convention
    #[error("no photo files found in {path}")]
    NoPhotos {
        /// The working directory that was scanned
        path: PathBuf,
    },

    /// File move/rename failed
    #[error("failed to move {source_path} to {dest_path}: {reason}")]
    MoveFailed {
        /// The source path of the file being moved
        source_path: PathBuf,
        /// The destination path where the file should be moved
        dest_path: PathBuf,
        /// The reason the move failed
        reason: String,
    },

    /// No free name could be found at the destination
    #[error("file collision at {path}: {reason}")]
    FileCollision {
        /// The path where the collision occurred
        path: PathBuf,
        /// The reason for the collision
        reason: String,
    },

    /// Invalid path encountered while organizing
    #[error("invalid path {path}: {reason}")]
    InvalidPath {
        /// The invalid path that was encountered
        path: PathBuf,
        /// The reason the path is invalid
        reason: String,
    },
}

/// External downloader failures
#[derive(Debug, Error)]
pub enum FetchError {
    /// The downloader process could not be started
    #[error("failed to execute {program}: {reason}")]
    Spawn {
        /// Program that was executed
        program: PathBuf,
        /// Underlying spawn error
        reason: String,
    },

    /// The downloader exited with a non-zero code
    #[error("downloader exited with code {code} for {url}: {stderr}")]
    NonZeroExit {
        /// The item URL that was being fetched
        url: String,
        /// Process exit code
        code: i32,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The downloader was terminated by a signal
    #[error("downloader terminated by signal while fetching {url}")]
    Terminated {
        /// The item URL that was being fetched
        url: String,
    },

    /// The configured downloader binary could not be located
    #[error("downloader binary not found: {0}")]
    BinaryNotFound(String),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Persist { .. } => "persist_error",
            Error::Organize(e) => match e {
                OrganizeError::MetadataNotFound { .. } => "metadata_not_found",
                OrganizeError::InvalidMetadata { .. } => "invalid_metadata",
                OrganizeError::MissingUsername { .. } => "missing_username",
                OrganizeError::MissingTitle => "missing_title",
                OrganizeError::NoPhotos { .. } => "no_photos",
                OrganizeError::MoveFailed { .. } => "move_failed",
                OrganizeError::FileCollision { .. } => "file_collision",
                OrganizeError::InvalidPath { .. } => "invalid_path",
            },
            Error::Fetch(e) => match e {
                FetchError::Spawn { .. } => "fetch_spawn_failed",
                FetchError::NonZeroExit { .. } => "fetch_failed",
                FetchError::Terminated { .. } => "fetch_terminated",
                FetchError::BinaryNotFound(_) => "binary_not_found",
            },
        }
    }
}
