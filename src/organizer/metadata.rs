//! Seller and title lookup in the downloader's metadata document.

use crate::error::OrganizeError;
use serde_json::Value;
use std::path::Path;

/// Accessor paths for the seller login, tried in order
///
/// New marketplace schema variants are supported by extending this list.
pub const SELLER_LOGIN_PATHS: &[&str] = &["user.login", "login", "seller.login"];

/// Accessor path for the listing title
pub const TITLE_PATH: &str = "title";

/// Read and parse the metadata document
pub async fn load(path: &Path) -> Result<Value, OrganizeError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(OrganizeError::MetadataNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(OrganizeError::InvalidMetadata {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let doc: Value = serde_json::from_str(&raw).map_err(|e| OrganizeError::InvalidMetadata {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if !doc.is_object() {
        return Err(OrganizeError::InvalidMetadata {
            path: path.to_path_buf(),
            reason: "expected a JSON object".to_string(),
        });
    }

    Ok(doc)
}

/// Raw seller login: the first accessor path with a non-empty scalar value
pub fn seller_login(doc: &Value) -> Result<String, OrganizeError> {
    SELLER_LOGIN_PATHS
        .iter()
        .find_map(|path| lookup(doc, path).and_then(scalar_text))
        .ok_or_else(|| OrganizeError::MissingUsername {
            tried: SELLER_LOGIN_PATHS.join(", "),
        })
}

/// Raw listing title
pub fn title(doc: &Value) -> Result<String, OrganizeError> {
    lookup(doc, TITLE_PATH)
        .and_then(scalar_text)
        .ok_or(OrganizeError::MissingTitle)
}

/// Resolve a dotted accessor path such as `user.login`
fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |node, key| node.get(key))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}
