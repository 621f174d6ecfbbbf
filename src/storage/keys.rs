//! Object key generation and URL building

use crate::storage::types::StorageError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// File name used when the client sends none
pub const DEFAULT_FILE_NAME: &str = "recording.webm";

/// Build a collision-free key: `{prefix}/{YYYY}/{MM}/{DD}/{id}-{name}`
pub fn upload_key(prefix: &str, file_name: Option<&str>, now: DateTime<Utc>, id: Uuid) -> String {
    let name = file_name
        .map(sanitize_file_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    let prefix = prefix.trim_matches('/');
    let dated = now.format("%Y/%m/%d");

    if prefix.is_empty() {
        format!("{}/{}-{}", dated, id, name)
    } else {
        format!("{}/{}/{}-{}", prefix, dated, id, name)
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`
///
/// Directory components are dropped and leading dots stripped, so the result
/// can never escape its key prefix.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').chars().take(100).collect()
}

/// Reject keys that are empty, absolute, or walk upwards
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key is empty".to_string()));
    }
    if key.starts_with('/') || key.starts_with('\\') {
        return Err(StorageError::InvalidKey(format!("'{}' is absolute", key)));
    }
    if key
        .split(['/', '\\'])
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "'{}' contains an empty or relative segment",
            key
        )));
    }
    Ok(())
}

/// Percent-encode each key segment, keeping `/` separators
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a base URL and a key into a public URL
pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), encode_key(key))
}
