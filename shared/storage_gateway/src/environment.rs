//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, SdkConfig};
use tracing::Level;

use crate::gateway::{GatewayConfig, MAX_PRESIGNED_EXPIRY_SECS};

/// `LocalStack` endpoint used in development
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development {
        /// Optional override for the maximum presigned URL expiry in seconds
        max_presign_expiry_override: Option<u64>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let max_presign_expiry_override = env::var("PRESIGNED_URL_MAX_EXPIRY_SECS")
                    .ok()
                    .and_then(|val| val.parse::<u64>().ok());

                Self::Development {
                    max_presign_expiry_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            Self::Development { .. } => Some(LOCALSTACK_ENDPOINT),
        }
    }

    /// Loads the AWS configuration with retry and timeout settings
    ///
    /// Development points every client at `LocalStack`; other environments keep
    /// whatever endpoint the default provider chain resolves.
    pub async fn aws_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(
                RetryConfig::standard()
                    .with_max_attempts(3)
                    .with_initial_backoff(Duration::from_millis(50)),
            )
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(30))
                    .build(),
            );

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }

    /// S3 service configuration derived from a loaded AWS configuration
    ///
    /// Development and any endpoint override switch to path-style addressing,
    /// which `LocalStack` and `MinIO` require.
    /// <https://github.com/awslabs/aws-sdk-rust/discussions/874>
    #[must_use]
    pub fn s3_client_config(&self, aws_config: &SdkConfig) -> aws_sdk_s3::Config {
        let mut builder = aws_sdk_s3::config::Builder::from(aws_config);
        if matches!(self, Self::Development { .. }) || aws_config.endpoint_url().is_some() {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Maximum presigned URL expiry in seconds, never above 7 days
    #[must_use]
    pub fn max_presigned_expiry_secs(&self) -> u64 {
        match self {
            Self::Production | Self::Staging => MAX_PRESIGNED_EXPIRY_SECS,
            Self::Development {
                max_presign_expiry_override,
            } => max_presign_expiry_override
                .unwrap_or(MAX_PRESIGNED_EXPIRY_SECS)
                .clamp(1, MAX_PRESIGNED_EXPIRY_SECS),
        }
    }

    /// Gateway configuration for the environment
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            max_presigned_expiry_secs: self.max_presigned_expiry_secs(),
        }
    }

    /// Tracing level, `TRACING_LEVEL` takes precedence over the environment default
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}
