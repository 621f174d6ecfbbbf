//! S3 object storage backend

use crate::storage::keys;
use crate::storage::types::{ObjectStore, StorageError, UploadResult};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

const FALLBACK_REGION: &str = "us-east-1";

/// Uploads objects to an S3 bucket
pub struct S3Store {
    client: Client,
    bucket: String,
    base_url: String,
}

impl S3Store {
    /// Build a client from the AWS provider chain plus explicit overrides
    pub async fn connect(
        bucket: &str,
        region: Option<&str>,
        endpoint: Option<&str>,
        public_base_url: Option<&str>,
    ) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        let resolved_region = sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| FALLBACK_REGION.to_string());
        let base_url = default_base_url(bucket, &resolved_region, endpoint, public_base_url);

        tracing::info!(
            "S3 storage ready: bucket={}, region={}, public URLs under {}",
            bucket,
            resolved_region,
            base_url
        );

        Self {
            client,
            bucket: bucket.to_string(),
            base_url,
        }
    }
}

/// Base URL objects resolve under
///
/// An explicit public base wins; a custom endpoint uses path-style URLs;
/// otherwise the virtual-hosted AWS form is used.
fn default_base_url(
    bucket: &str,
    region: &str,
    endpoint: Option<&str>,
    public_base_url: Option<&str>,
) -> String {
    if let Some(base) = public_base_url {
        return base.trim_end_matches('/').to_string();
    }
    if let Some(endpoint) = endpoint {
        return format!("{}/{}", endpoint.trim_end_matches('/'), bucket);
    }
    format!("https://{}.s3.{}.amazonaws.com", bucket, region)
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "s3"
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

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Backend(DisplayErrorContext(e).to_string()))?;

        Ok(UploadResult {
            url: self.public_url(key),
            key: key.to_string(),
        })
    }
}
