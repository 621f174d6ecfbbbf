//! Object storage module
//!
//! This module uploads finished media to object storage and turns storage
//! keys into public URLs. Backends implement [`ObjectStore`]:
//! - `S3Store` for AWS S3 and S3-compatible services
//! - `LocalStore` for a directory on disk
//! - `MemoryStore` for tests and throwaway deployments

pub mod keys;
pub mod local;
pub mod memory;
pub mod s3;
pub mod types;

pub use keys::upload_key;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;
pub use types::{upload, ObjectStore, StorageError, UploadResult};

use crate::config::StorageConfig;
use std::sync::Arc;

/// Build the configured storage backend
pub async fn connect(config: &StorageConfig) -> Arc<dyn ObjectStore> {
    match config {
        StorageConfig::S3 {
            bucket,
            region,
            endpoint,
            public_base_url,
        } => Arc::new(
            S3Store::connect(
                bucket,
                region.as_deref(),
                endpoint.as_deref(),
                public_base_url.as_deref(),
            )
            .await,
        ),
        StorageConfig::Local {
            root,
            public_base_url,
        } => {
            tracing::info!("Local storage ready under {:?}", root);
            Arc::new(LocalStore::new(root.clone(), public_base_url))
        }
        StorageConfig::Memory { public_base_url } => {
            tracing::warn!("Using in-memory storage; uploads are lost on restart");
            Arc::new(MemoryStore::new(public_base_url))
        }
    }
}
