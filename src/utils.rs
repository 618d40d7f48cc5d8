//! Utility functions for file operations and listing URLs

use crate::error::{Error, OrganizeError, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Maximum number of `_dup` suffixes tried when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Characters kept from the end of a URL when no label can be derived
const LABEL_FALLBACK_CHARS: usize = 50;

#[allow(clippy::unwrap_used)] // literal pattern
static ITEM_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/items/(\d+)").unwrap());

/// Get a free path for a file, appending `_dup{n}` to the stem on collision
///
/// The suffix is always derived from the original stem, so a second
/// collision yields `name_dup2.ext` rather than `name_dup1_dup1.ext`.
///
/// # Examples
///
/// ```
/// use closet_dl::utils::get_unique_path;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/closet/alice/Red_Coat_001.webp");
/// let unique = get_unique_path(path).unwrap();
/// // If the file exists, returns /tmp/closet/alice/Red_Coat_001_dup1.webp
/// ```
pub fn get_unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
        Error::Organize(OrganizeError::InvalidPath {
            path: path.to_path_buf(),
            reason: "cannot extract file stem".to_string(),
        })
    })?;

    let extension = path.extension().and_then(|e| e.to_str());

    let parent = path.parent().ok_or_else(|| {
        Error::Organize(OrganizeError::InvalidPath {
            path: path.to_path_buf(),
            reason: "cannot extract parent directory".to_string(),
        })
    })?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match extension {
            Some(ext) => format!("{stem}_dup{i}.{ext}"),
            None => format!("{stem}_dup{i}"),
        };
        let new_path = parent.join(new_name);
        if !new_path.exists() {
            return Ok(new_path);
        }
    }

    Err(Error::Organize(OrganizeError::FileCollision {
        path: path.to_path_buf(),
        reason: format!("no free name after {MAX_RENAME_ATTEMPTS} attempts"),
    }))
}

/// Move a file, falling back to copy + remove across filesystems
pub async fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!(?source, ?destination, "rename crosses devices, copying instead");
            tokio::fs::copy(source, destination).await?;
            tokio::fs::remove_file(source).await
        }
        Err(e) => Err(e),
    }
}

/// Numeric item id from a listing URL (`.../items/<digits>...`)
///
/// ```
/// use closet_dl::utils::extract_item_id;
///
/// assert_eq!(
///     extract_item_id("https://www.vinted.it/items/4242-red-coat?referrer=catalog"),
///     Some("4242".to_string())
/// );
/// assert_eq!(extract_item_id("https://www.vinted.it/member/12"), None);
/// ```
#[must_use]
pub fn extract_item_id(url: &str) -> Option<String> {
    ITEM_ID_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Human-readable label for a listing URL, used in logs and events
///
/// Takes the last path segment, drops the leading id before the first `-`
/// and title-cases the remaining words. URLs without such a segment fall
/// back to their last 50 characters.
#[must_use]
pub fn item_label_from_url(url: &str) -> String {
    let segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string(),
        Err(_) => url
            .rsplit('/')
            .next()
            .and_then(|last| last.split('?').next())
            .unwrap_or_default()
            .to_string(),
    };

    match segment.split_once('-') {
        Some((_, words)) => title_case(&words.replace('-', " ")),
        None => {
            let total = url.chars().count();
            url.chars()
                .skip(total.saturating_sub(LABEL_FALLBACK_CHARS))
                .collect()
        }
    }
}

/// Name of the per-item working directory under the download area
///
/// `item_<id>` when the URL carries an item id, otherwise a stable hash of
/// the URL so the same URL always maps to the same directory.
#[must_use]
pub fn work_dir_name(url: &str) -> String {
    match extract_item_id(url) {
        Some(id) => format!("item_{id}"),
        None => {
            let digest = Sha256::digest(url.as_bytes());
            let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
            format!("url_{hex}")
        }
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
