//! Local filesystem storage backend
//!
//! Objects are written under a root directory; serving them is left to a
//! static file server mounted at the public base URL.

use crate::storage::keys;
use crate::storage::types::{ObjectStore, StorageError, UploadResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(root: PathBuf, public_base_url: &str) -> Self {
        Self {
            root,
            base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// On-disk location of a key
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        keys::validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, segment| path.join(segment)))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn name(&self) -> &'static str {
        "local"
    }

    fn public_url(&self, key: &str) -> String {
        keys::public_url(&self.base_url, key)
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<UploadResult, StorageError> {
        let path = self.path_for(key)?;
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        tokio::fs::create_dir_all(&parent).await?;

        // Stage beside the target, then rename into place
        let len = data.len();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut staged = NamedTempFile::new_in(&parent)?;
            staged.write_all(&data)?;
            staged.as_file().sync_all()?;
            staged.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Backend(format!("Write task failed: {}", e)))??;

        tracing::debug!("Stored {} bytes at {:?}", len, path);

        Ok(UploadResult {
            url: self.public_url(key),
            key: key.to_string(),
        })
    }
}
