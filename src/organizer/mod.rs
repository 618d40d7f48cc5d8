//! File organizer: moves raw photos from a working directory into the closet
//!
//! One [`FileOrganizer::organize`] call reads the metadata document from the
//! working directory, resolves the seller and title, and moves every raw
//! photo to `<closet>/<seller>/<title>_<NNN>.<ext>`. Nothing is ever
//! overwritten: a taken destination name gains a `_dup<N>` suffix.
//!
//! The organizer never returns `Err`. Every problem is rendered into the
//! [`OrganizationResult`] so the caller always gets a full report:
//! - identity problems (metadata missing, seller or title absent) stop the
//!   call before the filesystem is touched
//! - a failed move is recorded for that file and the remaining files continue

use crate::config::OrganizerConfig;
use crate::error::OrganizeError;
use crate::utils::{get_unique_path, move_file};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod metadata;
mod normalize;

pub use normalize::{FALLBACK_NAME, normalize};

/// Prefix of [`MovedFile::to`] for files that could not be moved
pub const MOVE_ERROR_PREFIX: &str = "ERROR: ";

/// One raw photo and where it ended up
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedFile {
    /// Original location in the working directory
    pub from: PathBuf,
    /// Destination path, or `ERROR: <message>` when the move failed
    pub to: String,
    /// Final file name, or `ERROR` when the move failed
    pub new_name: String,
}

impl MovedFile {
    fn moved(from: PathBuf, to: &Path) -> Self {
        Self {
            from,
            to: to.display().to_string(),
            new_name: to
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    fn failed(from: PathBuf, message: &str) -> Self {
        Self {
            from,
            to: format!("{MOVE_ERROR_PREFIX}{message}"),
            new_name: "ERROR".to_string(),
        }
    }

    /// Whether this file stayed behind
    pub fn is_failed(&self) -> bool {
        self.to.starts_with(MOVE_ERROR_PREFIX)
    }
}

/// Report of one organize call
///
/// `success` says whether the process ran to completion, not whether every
/// file moved; inspect [`moved_files`](Self::moved_files) for per-file
/// outcomes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OrganizationResult {
    /// The call ran to completion with at least one photo
    pub success: bool,
    /// Per-file outcomes in photo order
    pub moved_files: Vec<MovedFile>,
    /// Human-readable problems, including per-file move failures
    pub errors: Vec<String>,
    /// Seller folder, set once it has been created
    pub user_folder: Option<PathBuf>,
    /// Seller folder, set only when the call succeeded
    pub final_location: Option<PathBuf>,
    /// Raw seller login from the metadata
    pub username: Option<String>,
    /// Raw listing title from the metadata
    pub title: Option<String>,
}

impl OrganizationResult {
    /// Number of photos that reached the closet
    pub fn moved_count(&self) -> usize {
        self.moved_files.iter().filter(|f| !f.is_failed()).count()
    }

    /// Number of photos left in the working directory
    pub fn failed_count(&self) -> usize {
        self.moved_files.iter().filter(|f| f.is_failed()).count()
    }

    fn push_error(&mut self, error: OrganizeError) {
        self.errors.push(error.to_string());
    }
}

/// Stateless organizer; one instance can serve any number of working directories
#[derive(Clone, Debug)]
pub struct FileOrganizer {
    config: OrganizerConfig,
}

impl FileOrganizer {
    /// Create an organizer with the given naming and layout settings
    pub fn new(config: OrganizerConfig) -> Self {
        Self { config }
    }

    /// Settings in use
    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    /// Closet root for a working directory: the configured one or `<base_dir>/closet`
    pub fn closet_root(&self, base_dir: &Path) -> PathBuf {
        self.config
            .closet_dir
            .clone()
            .unwrap_or_else(|| base_dir.join("closet"))
    }

    /// Organize the photos in `base_dir` into the closet
    pub async fn organize(&self, base_dir: &Path) -> OrganizationResult {
        let mut result = OrganizationResult::default();

        let metadata_path = base_dir.join(&self.config.metadata_file);
        let doc = match metadata::load(&metadata_path).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(path = ?metadata_path, error = %e, "cannot read metadata");
                result.push_error(e);
                return result;
            }
        };

        let username = metadata::seller_login(&doc);
        let title = metadata::title(&doc);
        let (username, title) = match (username, title) {
            (Ok(username), Ok(title)) => (username, title),
            (username, title) => {
                for error in [username.err(), title.err()].into_iter().flatten() {
                    tracing::warn!(path = ?metadata_path, error = %error, "incomplete metadata");
                    result.push_error(error);
                }
                return result;
            }
        };

        let max_len = self.config.max_name_length;
        let seller_dir = normalize(&username, max_len);
        let file_title = normalize(&title, max_len);
        tracing::debug!(seller = %username, folder = %seller_dir, title = %title, name = %file_title, "resolved identity");

        result.username = Some(username);
        result.title = Some(title);

        let user_folder = self.closet_root(base_dir).join(&seller_dir);
        if let Err(e) = tokio::fs::create_dir_all(&user_folder).await {
            result.push_error(OrganizeError::InvalidPath {
                path: user_folder,
                reason: format!("cannot create seller folder: {e}"),
            });
            return result;
        }
        result.user_folder = Some(user_folder.clone());

        let photos = match self.find_photos(base_dir).await {
            Ok(photos) => photos,
            Err(e) => {
                result.push_error(OrganizeError::InvalidPath {
                    path: base_dir.to_path_buf(),
                    reason: format!("cannot list working directory: {e}"),
                });
                return result;
            }
        };

        if photos.is_empty() {
            tracing::warn!(path = ?base_dir, "no photos to organize");
            result.push_error(OrganizeError::NoPhotos {
                path: base_dir.to_path_buf(),
            });
            return result;
        }

        for (index, photo) in photos.into_iter().enumerate() {
            match self.move_photo(&photo, &user_folder, &file_title, index).await {
                Ok(dest) => {
                    tracing::debug!(from = ?photo, to = ?dest, "photo moved");
                    result.moved_files.push(MovedFile::moved(photo, &dest));
                }
                Err(e) => {
                    tracing::warn!(file = ?photo, error = %e, "failed to move photo");
                    let message = e.to_string();
                    result.moved_files.push(MovedFile::failed(photo, &message));
                    result.push_error(e);
                }
            }
        }

        result.final_location = Some(user_folder);
        result.success = true;

        tracing::info!(
            seller = %seller_dir,
            moved = result.moved_count(),
            failed = result.failed_count(),
            "organized listing photos"
        );

        result
    }

    /// Raw photos in `base_dir`, sorted by file name
    async fn find_photos(&self, base_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut photos = Vec::new();
        let mut entries = tokio::fs::read_dir(base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if self.is_photo(&path) {
                photos.push(path);
            }
        }

        photos.sort();
        Ok(photos)
    }

    fn is_photo(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        name.starts_with(&self.config.photo_prefix)
            && self.config.photo_extensions.iter().any(|allowed| allowed == ext)
    }

    async fn move_photo(
        &self,
        photo: &Path,
        user_folder: &Path,
        file_title: &str,
        index: usize,
    ) -> Result<PathBuf, OrganizeError> {
        let file_name = match photo.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_{:03}.{}", file_title, index + 1, ext),
            None => format!("{}_{:03}", file_title, index + 1),
        };

        let dest = get_unique_path(&user_folder.join(file_name)).map_err(|e| match e {
            crate::Error::Organize(inner) => inner,
            other => OrganizeError::FileCollision {
                path: user_folder.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

        move_file(photo, &dest)
            .await
            .map_err(|e| OrganizeError::MoveFailed {
                source_path: photo.to_path_buf(),
                dest_path: dest.clone(),
                reason: e.to_string(),
            })?;

        Ok(dest)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
