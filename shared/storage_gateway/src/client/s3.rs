//! S3 storage client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{
        interceptors::BeforeTransmitInterceptorContextMut, ConfigBag, Intercept,
        RuntimeComponents,
    },
    error::{BoxError, SdkError},
    operation::head_object::HeadObjectError,
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime as AwsDateTime},
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, Delete, Object, ObjectIdentifier,
    },
    Client as S3Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};
use url::Url;

use super::{
    BucketInfo, ObjectEntry, ObjectRange, ObjectStat, PresignMethod, PresignedUrl, StorageClient,
    StorageClientError, StorageClientResult,
};
use crate::environment::Environment;

/// Region that rejects an explicit location constraint on bucket creation
const DEFAULT_REGION: &str = "us-east-1";

/// Storage client backed by `aws-sdk-s3`
pub struct S3StorageClient {
    s3_client: Arc<S3Client>,
    endpoint_url: Option<String>,
}

impl S3StorageClient {
    /// Creates a new S3 storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `endpoint_url` - Endpoint override the client was configured with, if any.
    ///   With an override, object URLs use path-style addressing
    ///   (`{endpoint}/{bucket}/{key}`); without one they point at the AWS
    ///   virtual-hosted endpoint of the configured region.
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, endpoint_url: Option<String>) -> Self {
        Self {
            s3_client,
            endpoint_url,
        }
    }

    /// Creates an S3 storage client configured for the given environment
    ///
    /// The endpoint override comes from the loaded AWS configuration, so
    /// `LocalStack` in development and `AWS_ENDPOINT_URL` elsewhere both yield
    /// path-style object URLs.
    pub async fn from_environment(environment: &Environment) -> Self {
        let aws_config = environment.aws_config().await;
        let endpoint_url = aws_config.endpoint_url().map(ToString::to_string);
        let s3_client = S3Client::from_conf(environment.s3_client_config(&aws_config));

        Self::new(Arc::new(s3_client), endpoint_url)
    }

    fn region(&self) -> &str {
        self.s3_client
            .config()
            .region()
            .map_or(DEFAULT_REGION, |region| region.as_ref())
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn bucket_exists(&self, bucket: &str) -> StorageClientResult<bool> {
        debug!("Checking if bucket exists: {}", bucket);

        match self.s3_client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err)) if service_err.err().is_not_found() => {
                debug!("Bucket does not exist: {}", bucket);
                Ok(false)
            }
            Err(e) => {
                error!("Failed to check bucket existence for {}: {:?}", bucket, e);
                Err(e.into())
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> StorageClientResult<()> {
        let region = self.region();
        let mut request = self.s3_client.create_bucket().bucket(bucket);

        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StorageClientResult<()> {
        self.s3_client.delete_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    async fn list_buckets(&self) -> StorageClientResult<Vec<BucketInfo>> {
        let response = self.s3_client.list_buckets().send().await?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|bucket| {
                bucket.name().map(|name| BucketInfo {
                    name: name.to_string(),
                    created_at: bucket.creation_date().and_then(to_utc),
                })
            })
            .collect())
    }

    async fn list_objects(&self, bucket: &str) -> StorageClientResult<Vec<ObjectEntry>> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut entries = Vec::new();
        while let Some(page) = pages.next().await {
            entries.extend(page?.contents().iter().filter_map(to_entry));
        }

        debug!("Listed {} objects in bucket {}", entries.len(), bucket);
        Ok(entries)
    }

    async fn find_non_empty_object(
        &self,
        bucket: &str,
    ) -> StorageClientResult<Option<ObjectEntry>> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            if let Some(entry) = page?
                .contents()
                .iter()
                .filter_map(to_entry)
                .find(|entry| entry.size > 0)
            {
                return Ok(Some(entry));
            }
        }

        Ok(None)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> StorageClientResult<()> {
        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await?;

        Ok(())
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        range: Option<ObjectRange>,
    ) -> StorageClientResult<ByteStream> {
        let response = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .set_range(range.map(|range| range.to_header_value()))
            .send()
            .await?;

        Ok(response.body)
    }

    async fn stat_object(&self, bucket: &str, key: &str) -> StorageClientResult<Option<ObjectStat>> {
        let result = self
            .s3_client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => Ok(Some(ObjectStat {
                bucket: bucket.to_string(),
                key: key.to_string(),
                size: output.content_length().map_or(0, to_size),
                content_type: output.content_type().map(ToString::to_string),
                last_modified: output.last_modified().and_then(to_utc),
                etag: output.e_tag().map(ToString::to_string),
            })),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                debug!("Object does not exist: {}/{}", bucket, key);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> StorageClientResult<()> {
        self.s3_client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        Ok(())
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        keys: Vec<String>,
    ) -> StorageClientResult<Vec<String>> {
        let objects = keys
            .into_iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()?;

        // Quiet mode makes the response list failures only
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()?;

        let response = self
            .s3_client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await?;

        let failed: Vec<String> = response
            .errors()
            .iter()
            .filter_map(|err| {
                warn!(
                    "Failed to delete {}/{:?}: {:?} {:?}",
                    bucket,
                    err.key(),
                    err.code(),
                    err.message()
                );
                err.key().map(ToString::to_string)
            })
            .collect();

        Ok(failed)
    }

    async fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        key: &str,
        expires_in: Duration,
        extra_query: Vec<(String, String)>,
    ) -> StorageClientResult<PresignedUrl> {
        debug!(
            "Generating presigned {} URL for object: {}/{} expiring in {:?}",
            method, bucket, key, expires_in
        );

        let presigning_config = PresigningConfig::expires_in(expires_in)?;
        let extra_query = ExtraQueryParams(extra_query);

        let presigned_request = match method {
            PresignMethod::Get => self
                .s3_client
                .get_object()
                .bucket(bucket)
                .key(key)
                .customize()
                .interceptor(extra_query)
                .presigned(presigning_config)
                .await
                .map_err(|e| StorageClientError::PresigningError(format!("{e:?}")))?,
            PresignMethod::Put => self
                .s3_client
                .put_object()
                .bucket(bucket)
                .key(key)
                .customize()
                .interceptor(extra_query)
                .presigned(presigning_config)
                .await
                .map_err(|e| StorageClientError::PresigningError(format!("{e:?}")))?,
        };

        let expires_at: DateTime<Utc> = Utc::now() + expires_in;

        Ok(PresignedUrl {
            url: presigned_request.uri().to_string(),
            method,
            expires_at,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> StorageClientResult<String> {
        let (mut url, path_style) = match &self.endpoint_url {
            Some(endpoint_url) => (parse_url(endpoint_url)?, true),
            None => (
                parse_url(&format!(
                    "https://{bucket}.s3.{}.amazonaws.com/",
                    self.region()
                ))?,
                false,
            ),
        };

        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                StorageClientError::InvalidEndpoint("endpoint cannot be a base URL".to_string())
            })?;
            segments.pop_if_empty();
            if path_style {
                segments.push(bucket);
            }
            segments.extend(key.split('/'));
        }

        Ok(url.into())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> StorageClientResult<()> {
        self.s3_client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await?;

        Ok(())
    }
}

/// Appends query parameters to a request before it is signed
#[derive(Debug)]
struct ExtraQueryParams(Vec<(String, String)>);

impl Intercept for ExtraQueryParams {
    fn name(&self) -> &'static str {
        "ExtraQueryParams"
    }

    fn modify_before_signing(
        &self,
        context: &mut BeforeTransmitInterceptorContextMut<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        if self.0.is_empty() {
            return Ok(());
        }

        let request = context.request_mut();
        let mut uri = Url::parse(request.uri())?;
        uri.query_pairs_mut()
            .extend_pairs(self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        request.set_uri(String::from(uri))?;
        Ok(())
    }
}

fn parse_url(raw: &str) -> StorageClientResult<Url> {
    Url::parse(raw).map_err(|e| StorageClientError::InvalidEndpoint(format!("{raw}: {e}")))
}

fn to_entry(object: &Object) -> Option<ObjectEntry> {
    object.key().map(|key| ObjectEntry {
        key: key.to_string(),
        size: object.size().map_or(0, to_size),
        last_modified: object.last_modified().and_then(to_utc),
        etag: object.e_tag().map(ToString::to_string),
    })
}

fn to_utc(timestamp: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

fn to_size(size: i64) -> u64 {
    u64::try_from(size).unwrap_or_default()
}
