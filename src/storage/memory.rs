//! In-process storage backend

use crate::storage::keys;
use crate::storage::types::{ObjectStore, StorageError, UploadResult};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A stored object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Keeps objects in a map; contents are lost on restart
pub struct MemoryStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            base_url: public_base_url.trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn public_url(&self, key: &str) -> String {
        keys::public_url(&self.base_url, key)
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<UploadResult, StorageError> {
        keys::validate_key(key)?;
        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(UploadResult {
            url: self.public_url(key),
            key: key.to_string(),
        })
    }
}
