//! Object storage client abstraction
//!
//! [`StorageClient`] lists the calls the gateway makes into the storage backend.
//! [`S3StorageClient`] implements it on top of `aws-sdk-s3`, which makes it work
//! with AWS S3 as well as S3-compatible services such as `LocalStack` or `MinIO`.

mod error;
mod s3;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

pub use error::{StorageClientError, StorageClientResult};
pub use s3::S3StorageClient;

/// Bucket entry returned by a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,
    /// Creation time as reported by the backend
    pub created_at: Option<DateTime<Utc>>,
}

/// Object entry returned by an object listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
    /// Object key
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub last_modified: Option<DateTime<Utc>>,
    /// `ETag`
    pub etag: Option<String>,
}

/// Object metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectStat {
    /// Bucket holding the object
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Object size in bytes
    pub size: u64,
    /// Content type recorded at upload time
    pub content_type: Option<String>,
    /// Last modified timestamp
    pub last_modified: Option<DateTime<Utc>>,
    /// `ETag`
    pub etag: Option<String>,
}

/// HTTP method a presigned URL is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PresignMethod {
    /// Download
    Get,
    /// Upload
    Put,
}

impl fmt::Display for PresignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// Presigned URL with expiration information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUrl {
    /// The presigned URL
    pub url: String,
    /// Method the URL is signed for
    pub method: PresignMethod,
    /// UTC timestamp when the URL expires
    pub expires_at: DateTime<Utc>,
}

/// Byte range of an object read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRange {
    /// First byte to read
    pub offset: u64,
    /// Number of bytes to read, or `None` to read to the end of the object
    pub length: Option<u64>,
}

impl ObjectRange {
    /// Renders the range as an HTTP `Range` header value
    ///
    /// A zero length, or one reaching past `u64::MAX`, yields an open-ended range.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let end = self
            .length
            .filter(|length| *length > 0)
            .and_then(|length| self.offset.checked_add(length - 1));

        match end {
            Some(end) => format!("bytes={}-{end}", self.offset),
            None => format!("bytes={}-", self.offset),
        }
    }
}

/// Operations the gateway needs from an object storage backend
///
/// Implementations return backend errors unchanged; sentinel handling lives in
/// the gateway.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Checks whether a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> StorageClientResult<bool>;

    /// Creates a bucket
    async fn create_bucket(&self, bucket: &str) -> StorageClientResult<()>;

    /// Deletes a bucket
    async fn delete_bucket(&self, bucket: &str) -> StorageClientResult<()>;

    /// Lists all buckets visible to the caller
    async fn list_buckets(&self) -> StorageClientResult<Vec<BucketInfo>>;

    /// Lists every object in a bucket, following pagination
    async fn list_objects(&self, bucket: &str) -> StorageClientResult<Vec<ObjectEntry>>;

    /// Returns the first object with a non-zero size, stopping the listing there
    async fn find_non_empty_object(&self, bucket: &str)
        -> StorageClientResult<Option<ObjectEntry>>;

    /// Uploads an object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> StorageClientResult<()>;

    /// Opens a stream over an object, optionally limited to a byte range
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ObjectRange>,
    ) -> StorageClientResult<ByteStream>;

    /// Fetches object metadata, `None` when the object does not exist
    async fn stat_object(&self, bucket: &str, key: &str) -> StorageClientResult<Option<ObjectStat>>;

    /// Deletes a single object
    async fn delete_object(&self, bucket: &str, key: &str) -> StorageClientResult<()>;

    /// Deletes a batch of objects and returns the keys the backend failed to delete
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>)
        -> StorageClientResult<Vec<String>>;

    /// Generates a presigned URL
    ///
    /// `extra_query` parameters are added to the request before signing.
    async fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        extra_query: Vec<(String, String)>,
    ) -> StorageClientResult<PresignedUrl>;

    /// Returns the unsigned URL of an object
    fn object_url(&self, bucket: &str, key: &str) -> StorageClientResult<String>;

    /// Applies a bucket policy document
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageClientResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_with_length() {
        let range = ObjectRange {
            offset: 10,
            length: Some(5),
        };
        assert_eq!(range.to_header_value(), "bytes=10-14");
    }

    #[test]
    fn test_open_ended_range() {
        let range = ObjectRange {
            offset: 100,
            length: None,
        };
        assert_eq!(range.to_header_value(), "bytes=100-");

        let range = ObjectRange {
            offset: 0,
            length: Some(0),
        };
        assert_eq!(range.to_header_value(), "bytes=0-");
    }

    #[test]
    fn test_oversized_length_is_open_ended() {
        let range = ObjectRange {
            offset: 5,
            length: Some(u64::MAX),
        };
        assert_eq!(range.to_header_value(), "bytes=5-");

        let range = ObjectRange {
            offset: 0,
            length: Some(u64::MAX),
        };
        assert_eq!(range.to_header_value(), format!("bytes=0-{}", u64::MAX - 1));
    }

    #[test]
    fn test_presign_method_display() {
        assert_eq!(PresignMethod::Get.to_string(), "GET");
        assert_eq!(PresignMethod::Put.to_string(), "PUT");
    }
}
