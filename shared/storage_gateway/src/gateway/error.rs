//! Error types for gateway operations

use thiserror::Error;

use crate::client::StorageClientError;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur during gateway operations
///
/// A missing bucket or object is not an error; operations report it through
/// their return value.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Presigned URL expiry outside the accepted range
    #[error("Invalid expiry {expiry}: expires must be in range of 1 to {max}")]
    InvalidExpiry {
        /// Requested expiry in seconds
        expiry: u64,
        /// Largest accepted expiry in seconds
        max: u64,
    },

    /// Storage backend error
    #[error(transparent)]
    Storage(#[from] StorageClientError),

    /// Local file error while downloading an object
    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),
}
