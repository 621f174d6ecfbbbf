//! Storage capability and errors

use crate::media::MediaAsset;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where an uploaded object ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Publicly resolvable URL
    pub url: String,
    /// Key the object was stored under
    pub key: String,
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// An object storage backend
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Public URL an object stored under `key` resolves at
    fn public_url(&self, key: &str) -> String;

    /// Store `data` under `key`, replacing any existing object
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<UploadResult, StorageError>;
}

/// Upload a media asset under `key` and return its public URL
pub async fn upload(
    store: &dyn ObjectStore,
    file: &MediaAsset,
    key: &str,
) -> Result<UploadResult, StorageError> {
    tracing::debug!(
        "Uploading {} bytes ({}) to {} as {}",
        file.len(),
        file.mime,
        store.name(),
        key
    );
    let result = store.put(key, file.data.clone(), &file.mime).await?;
    tracing::info!("Uploaded {} -> {}", result.key, result.url);
    Ok(result)
}
