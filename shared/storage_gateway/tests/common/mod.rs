// Not every helper is used in every test, so we allow dead code
#![allow(dead_code)]

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use storage_gateway::{
    logging::init_tracing, Environment, GatewayConfig, S3StorageClient, StorageGateway,
};
use uuid::Uuid;

/// `LocalStack` endpoint the development environment points at
pub const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

/// Setup test environment variables with `LocalStack` credentials
pub fn setup_test_env() {
    dotenvy::from_path(".env.example").ok();
}

/// Test context that removes its bucket on drop
pub struct TestContext {
    pub gateway: StorageGateway,
    pub s3_client: S3Client,
    pub bucket_name: String,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let client = self.s3_client.clone();
        let bucket = self.bucket_name.clone();

        // Use tokio runtime to empty and delete the bucket
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Ok(listing) = client.list_objects_v2().bucket(&bucket).send().await {
                    for object in listing.contents() {
                        if let Some(key) = object.key() {
                            let _ = client.delete_object().bucket(&bucket).key(key).send().await;
                        }
                    }
                }
                let _ = client.delete_bucket().bucket(&bucket).send().await;
            });
        }
    }
}

impl TestContext {
    /// Creates a gateway against `LocalStack` with a unique bucket name
    ///
    /// The bucket is not created; tests call `make_bucket` when they need it.
    pub async fn new() -> Self {
        Self::with_config(GatewayConfig::default()).await
    }

    pub async fn with_config(config: GatewayConfig) -> Self {
        setup_test_env();

        let environment = Environment::Development {
            max_presign_expiry_override: None,
        };
        let _ = init_tracing(&environment);

        let storage_client = S3StorageClient::from_environment(&environment).await;
        let gateway = StorageGateway::new(Arc::new(storage_client), config);

        // Raw client for assertions and cleanup
        let aws_config = environment.aws_config().await;
        let s3_client = S3Client::from_conf(environment.s3_client_config(&aws_config));

        Self {
            gateway,
            s3_client,
            bucket_name: unique_bucket_name(),
        }
    }

    /// Creates the context bucket and fails the test if it already exists
    pub async fn with_bucket() -> Self {
        let ctx = Self::new().await;
        assert!(
            ctx.gateway
                .make_bucket(&ctx.bucket_name)
                .await
                .expect("Failed to create test bucket"),
            "test bucket should not exist yet"
        );
        ctx
    }
}

/// Bucket names must be lowercase and at most 63 characters
pub fn unique_bucket_name() -> String {
    format!("test-gateway-{}", Uuid::new_v4().simple())
}
