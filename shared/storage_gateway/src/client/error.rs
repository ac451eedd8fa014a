//! Error types for storage client operations

use aws_sdk_s3::{
    error::{BuildError, SdkError},
    operation::{
        create_bucket::CreateBucketError, delete_bucket::DeleteBucketError,
        delete_object::DeleteObjectError, delete_objects::DeleteObjectsError,
        get_object::GetObjectError, head_bucket::HeadBucketError, head_object::HeadObjectError,
        list_buckets::ListBucketsError, list_objects_v2::ListObjectsV2Error,
        put_bucket_policy::PutBucketPolicyError, put_object::PutObjectError,
    },
    presigning::PresigningConfigError,
};
use thiserror::Error;

/// Result type for storage client operations
pub type StorageClientResult<T> = Result<T, StorageClientError>;

/// Errors returned by the storage backend
#[derive(Debug, Error)]
pub enum StorageClientError {
    /// Failed to check bucket existence
    #[error("Failed to check bucket existence: {0:?}")]
    HeadBucketError(#[from] SdkError<HeadBucketError>),

    /// Failed to create bucket
    #[error("Failed to create bucket: {0:?}")]
    CreateBucketError(#[from] SdkError<CreateBucketError>),

    /// Failed to delete bucket
    #[error("Failed to delete bucket: {0:?}")]
    DeleteBucketError(#[from] SdkError<DeleteBucketError>),

    /// Failed to list buckets
    #[error("Failed to list buckets: {0:?}")]
    ListBucketsError(#[from] SdkError<ListBucketsError>),

    /// Failed to list objects
    #[error("Failed to list objects: {0:?}")]
    ListObjectsError(#[from] SdkError<ListObjectsV2Error>),

    /// Failed to upload object
    #[error("Failed to put object: {0:?}")]
    PutObjectError(#[from] SdkError<PutObjectError>),

    /// Failed to download object
    #[error("Failed to get object: {0:?}")]
    GetObjectError(#[from] SdkError<GetObjectError>),

    /// Failed to fetch object metadata
    #[error("Failed to fetch object metadata: {0:?}")]
    HeadObjectError(#[from] SdkError<HeadObjectError>),

    /// Failed to delete object
    #[error("Failed to delete object: {0:?}")]
    DeleteObjectError(#[from] SdkError<DeleteObjectError>),

    /// Failed to delete a batch of objects
    #[error("Failed to delete objects: {0:?}")]
    DeleteObjectsError(#[from] SdkError<DeleteObjectsError>),

    /// Failed to apply bucket policy
    #[error("Failed to put bucket policy: {0:?}")]
    PutBucketPolicyError(#[from] SdkError<PutBucketPolicyError>),

    /// Request could not be built
    #[error("Failed to build request: {0}")]
    BuildError(#[from] BuildError),

    /// Presigning configuration was rejected
    #[error("Failed to create presigning config: {0}")]
    PresigningConfigError(#[from] PresigningConfigError),

    /// Presigned request could not be generated
    #[error("Failed to generate presigned URL: {0}")]
    PresigningError(String),

    /// Configured endpoint cannot be turned into an object URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}
