//! Bucket-existence-gated storage facade
//!
//! Every bucket or object operation first checks that the bucket exists, then
//! makes a single call into the injected [`StorageClient`]. A missing bucket or
//! object is reported through the return value (`false`, `None`, an empty list)
//! rather than as an error. Backend errors are propagated unchanged.

mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::primitives::ByteStream;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

pub use error::{GatewayError, GatewayResult};

use crate::client::{
    BucketInfo, ObjectEntry, ObjectRange, ObjectStat, PresignMethod, PresignedUrl, StorageClient,
};

/// Largest presigned URL expiry accepted by `SigV4`: 7 days
pub const MAX_PRESIGNED_EXPIRY_SECS: u64 = 7 * 24 * 3600;

/// Content type used for uploads that do not specify one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Response content type requested for presigned PUT URLs
const PRESIGNED_PUT_RESPONSE_CONTENT_TYPE: &str = "application/json";

/// Most keys a single bulk delete request may carry
const MAX_DELETE_BATCH: usize = 1000;

/// Gateway configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Upper bound for presigned URL expiry in seconds
    pub max_presigned_expiry_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_presigned_expiry_secs: MAX_PRESIGNED_EXPIRY_SECS,
        }
    }
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveObjectsOutcome {
    /// The bucket does not exist, nothing was sent to the backend
    BucketMissing,
    /// The delete requests were issued
    Completed {
        /// Keys the backend reported as not deleted
        failed: Vec<String>,
    },
}

impl RemoveObjectsOutcome {
    /// Keys that failed to delete; empty on full success and when the bucket is missing
    #[must_use]
    pub fn failed_keys(&self) -> &[String] {
        match self {
            Self::BucketMissing => &[],
            Self::Completed { failed } => failed.as_slice(),
        }
    }

    /// Whether every key was deleted
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { failed } if failed.is_empty())
    }
}

/// Storage facade guarding every operation with a bucket existence check
pub struct StorageGateway {
    client: Arc<dyn StorageClient>,
    config: GatewayConfig,
}

impl StorageGateway {
    /// Creates a new storage gateway
    ///
    /// # Arguments
    ///
    /// * `client` - Storage backend client, shared for the lifetime of the application
    /// * `config` - Gateway configuration
    #[must_use]
    pub fn new(client: Arc<dyn StorageClient>, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    /// Returns the gateway configuration
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Checks if a bucket exists
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn bucket_exists(&self, bucket: &str) -> GatewayResult<bool> {
        Ok(self.client.bucket_exists(bucket).await?)
    }

    /// Creates a bucket
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the bucket was created
    /// * `Ok(false)` if the bucket already exists
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn make_bucket(&self, bucket: &str) -> GatewayResult<bool> {
        if self.bucket_exists(bucket).await? {
            debug!("Bucket already exists: {}", bucket);
            return Ok(false);
        }

        self.client.create_bucket(bucket).await?;
        info!("Created bucket: {}", bucket);
        Ok(true)
    }

    /// Lists bucket names in the order reported by the backend
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn list_bucket_names(&self) -> GatewayResult<Vec<String>> {
        Ok(self
            .list_buckets()
            .await?
            .into_iter()
            .map(|bucket| bucket.name)
            .collect())
    }

    /// Lists all buckets
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn list_buckets(&self) -> GatewayResult<Vec<BucketInfo>> {
        Ok(self.client.list_buckets().await?)
    }

    /// Removes a bucket
    ///
    /// The bucket is scanned client-side first: the first object with a
    /// non-zero size blocks the removal and ends the scan.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the bucket was deleted and no longer exists
    /// * `Ok(false)` if the bucket does not exist, is not empty, or still exists after deletion
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if any backend call fails
    pub async fn remove_bucket(&self, bucket: &str) -> GatewayResult<bool> {
        if !self.bucket_exists(bucket).await? {
            debug!("Cannot remove missing bucket: {}", bucket);
            return Ok(false);
        }

        if let Some(object) = self.client.find_non_empty_object(bucket).await? {
            debug!(
                "Bucket {} is not empty, found {} ({} bytes)",
                bucket, object.key, object.size
            );
            return Ok(false);
        }

        self.client.delete_bucket(bucket).await?;

        let removed = !self.bucket_exists(bucket).await?;
        if removed {
            info!("Removed bucket: {}", bucket);
        } else {
            warn!("Bucket {} still exists after deletion", bucket);
        }
        Ok(removed)
    }

    /// Lists the names of all objects in a bucket
    ///
    /// Returns an empty list if the bucket does not exist.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn list_object_names(&self, bucket: &str) -> GatewayResult<Vec<String>> {
        Ok(self
            .list_objects(bucket)
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(|object| object.key)
            .collect())
    }

    /// Lists all objects in a bucket, `None` if the bucket does not exist
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn list_objects(&self, bucket: &str) -> GatewayResult<Option<Vec<ObjectEntry>>> {
        if !self.bucket_exists(bucket).await? {
            return Ok(None);
        }

        Ok(Some(self.client.list_objects(bucket).await?))
    }

    /// Uploads an object
    ///
    /// # Arguments
    ///
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    /// * `body` - Object content
    /// * `content_type` - Content type, `application/octet-stream` if `None`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the upload succeeded and the stored object is non-empty
    /// * `Ok(false)` if the bucket does not exist or the stored object is empty
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the upload or the follow-up metadata fetch fails
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_type: Option<&str>,
    ) -> GatewayResult<bool> {
        if !self.bucket_exists(bucket).await? {
            debug!("Skipping upload of {} to missing bucket {}", key, bucket);
            return Ok(false);
        }

        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);
        self.client
            .put_object(bucket, key, body, content_type)
            .await?;

        let stat = self.client.stat_object(bucket, key).await?;
        Ok(stat.is_some_and(|stat| stat.size > 0))
    }

    /// Opens a stream over an object
    ///
    /// # Returns
    ///
    /// * `Ok(Some(stream))` with the object content; the caller owns the stream
    /// * `Ok(None)` if the bucket or object does not exist, or the object is empty
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if a backend call fails
    pub async fn get_object(&self, bucket: &str, key: &str) -> GatewayResult<Option<ByteStream>> {
        self.open_object(bucket, key, None).await
    }

    /// Opens a stream over a byte range of an object
    ///
    /// Reads `length` bytes starting at `offset`, or up to the end of the
    /// object when `length` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if a backend call fails, including an
    /// offset past the end of the object
    pub async fn get_object_range(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> GatewayResult<Option<ByteStream>> {
        self.open_object(bucket, key, Some(ObjectRange { offset, length }))
            .await
    }

    /// Downloads an object into a local file
    ///
    /// # Returns
    ///
    /// * `Ok(true)` once the object has been written to `local_path`
    /// * `Ok(false)` if the bucket or object does not exist, or the object is empty
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if a backend call fails and
    /// `GatewayError::Io` if the local file cannot be written. A download that
    /// fails mid-stream removes the partially written file.
    pub async fn download_object(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> GatewayResult<bool> {
        let Some(body) = self.get_object(bucket, key).await? else {
            return Ok(false);
        };

        let reader = body.into_async_read();
        tokio::pin!(reader);

        let mut file = tokio::fs::File::create(local_path).await?;
        let copied = async {
            let written = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(written)
        }
        .await;
        drop(file);

        let written = match copied {
            Ok(written) => written,
            Err(e) => {
                warn!(
                    "Failed to download {}/{} to {}: {}",
                    bucket,
                    key,
                    local_path.display(),
                    e
                );
                // Drop the partial file
                if let Err(remove_err) = tokio::fs::remove_file(local_path).await {
                    warn!(
                        "Failed to remove partial download {}: {}",
                        local_path.display(),
                        remove_err
                    );
                }
                return Err(e.into());
            }
        };

        debug!(
            "Downloaded {}/{} to {} ({} bytes)",
            bucket,
            key,
            local_path.display(),
            written
        );
        Ok(true)
    }

    /// Removes an object
    ///
    /// Returns `false` only when the bucket does not exist; the object itself
    /// is not checked.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend call fails
    pub async fn remove_object(&self, bucket: &str, key: &str) -> GatewayResult<bool> {
        if !self.bucket_exists(bucket).await? {
            return Ok(false);
        }

        self.client.delete_object(bucket, key).await?;
        Ok(true)
    }

    /// Removes several objects
    ///
    /// Keys are sent in batches of at most 1000. The outcome carries the keys the
    /// backend failed to delete.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if a backend call fails
    pub async fn remove_objects<I, K>(
        &self,
        bucket: &str,
        keys: I,
    ) -> GatewayResult<RemoveObjectsOutcome>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        if !self.bucket_exists(bucket).await? {
            return Ok(RemoveObjectsOutcome::BucketMissing);
        }

        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let mut failed = Vec::new();
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            failed.extend(self.client.delete_objects(bucket, batch.to_vec()).await?);
        }

        if !failed.is_empty() {
            warn!(
                "Failed to delete {} of {} objects in bucket {}",
                failed.len(),
                keys.len(),
                bucket
            );
        }

        Ok(RemoveObjectsOutcome::Completed { failed })
    }

    /// Generates a presigned URL for HTTP GET requests
    ///
    /// Browsers and mobile clients can download the object with this URL even
    /// when the bucket is private.
    ///
    /// # Arguments
    ///
    /// * `bucket` - Bucket name
    /// * `key` - Object key
    /// * `expiry_secs` - URL lifetime in seconds, between 1 and the configured maximum
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` with the signed URL
    /// * `Ok(None)` if the bucket does not exist, whatever the expiry
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidExpiry` if the bucket exists and `expiry_secs` is out of range
    /// Returns `GatewayError::Storage` if a backend call fails
    pub async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u64,
    ) -> GatewayResult<Option<PresignedUrl>> {
        self.presign(PresignMethod::Get, bucket, key, expiry_secs, Vec::new())
            .await
    }

    /// Generates a presigned URL for HTTP PUT requests
    ///
    /// The request asks the backend to answer the upload with an
    /// `application/json` content type. Returns `None` if the bucket does not
    /// exist, whatever the expiry.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidExpiry` if the bucket exists and `expiry_secs` is out of range
    /// Returns `GatewayError::Storage` if a backend call fails
    pub async fn presigned_put_url(
        &self,
        bucket: &str,
        key: &str,
        expiry_secs: u64,
    ) -> GatewayResult<Option<PresignedUrl>> {
        let extra_query = vec![(
            "response-content-type".to_string(),
            PRESIGNED_PUT_RESPONSE_CONTENT_TYPE.to_string(),
        )];
        self.presign(PresignMethod::Put, bucket, key, expiry_secs, extra_query)
            .await
    }

    /// Fetches object metadata
    ///
    /// Returns `None` if the bucket or the object does not exist.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if a backend call fails
    pub async fn stat_object(&self, bucket: &str, key: &str) -> GatewayResult<Option<ObjectStat>> {
        if !self.bucket_exists(bucket).await? {
            return Ok(None);
        }

        Ok(self.client.stat_object(bucket, key).await?)
    }

    /// Returns the unsigned URL of an object, `None` if the bucket does not exist
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if a backend call fails
    pub async fn object_url(&self, bucket: &str, key: &str) -> GatewayResult<Option<String>> {
        if !self.bucket_exists(bucket).await? {
            return Ok(None);
        }

        Ok(Some(self.client.object_url(bucket, key)?))
    }

    /// Applies an access policy document to a bucket
    ///
    /// Unlike the other operations this does not check that the bucket exists;
    /// a missing bucket surfaces as a backend error.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Storage` if the backend rejects the policy or the bucket
    pub async fn set_bucket_policy(&self, bucket: &str, policy_json: &str) -> GatewayResult<()> {
        self.client.put_bucket_policy(bucket, policy_json).await?;
        debug!("Applied policy to bucket: {}", bucket);
        Ok(())
    }

    async fn open_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ObjectRange>,
    ) -> GatewayResult<Option<ByteStream>> {
        let Some(stat) = self.stat_object(bucket, key).await? else {
            return Ok(None);
        };
        if stat.size == 0 {
            debug!("Object {}/{} is empty", bucket, key);
            return Ok(None);
        }

        Ok(Some(self.client.get_object(bucket, key, range).await?))
    }

    async fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        key: &str,
        expiry_secs: u64,
        extra_query: Vec<(String, String)>,
    ) -> GatewayResult<Option<PresignedUrl>> {
        if !self.bucket_exists(bucket).await? {
            return Ok(None);
        }

        let expires_in = self.validate_expiry(expiry_secs)?;

        let presigned = self
            .client
            .presign(method, bucket, key, expires_in, extra_query)
            .await?;
        Ok(Some(presigned))
    }

    fn validate_expiry(&self, expiry_secs: u64) -> GatewayResult<Duration> {
        let max = self.config.max_presigned_expiry_secs;
        if (1..=max).contains(&expiry_secs) {
            Ok(Duration::from_secs(expiry_secs))
        } else {
            Err(GatewayError::InvalidExpiry {
                expiry: expiry_secs,
                max,
            })
        }
    }
}
