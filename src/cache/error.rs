//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// A caller-supplied argument or stored value the operation cannot use.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("Cache operation timed out after {0}ms")]
    Timeout(u64),
}

impl CacheError {
    /// Whether the error means the backend could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Timeout(_))
    }
}

impl CacheError {
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CacheError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_connection_dropped() || error.is_connection_refusal() || error.is_timeout() {
            CacheError::Connection(error.to_string())
        } else {
            CacheError::Operation(error.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Serialization(error.to_string())
    }
}
