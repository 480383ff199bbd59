//! Request and response bodies of the cache endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::config::validation::{MAX_LOCK_TTL_SECONDS, MAX_TTL_SECONDS};

/// Most ids accepted by one batch request.
pub const MAX_BATCH_SIZE: u64 = 500;

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PutEntryRequest {
    /// Any JSON value
    #[schema(value_type = Object)]
    pub value: Value,
    #[validate(range(
        min = 1,
        max = MAX_TTL_SECONDS,
        message = "ttlSeconds must be between 1 and 2592000"
    ))]
    pub ttl_seconds: Option<u64>,
    /// Store obfuscated (default) or as plain JSON
    pub obfuscate: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IncrementRequest {
    #[validate(range(
        min = 1,
        max = MAX_TTL_SECONDS,
        message = "ttlSeconds must be between 1 and 2592000"
    ))]
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LockedPutRequest {
    #[schema(value_type = Object)]
    pub value: Value,
    #[validate(range(
        min = 1,
        max = MAX_TTL_SECONDS,
        message = "ttlSeconds must be between 1 and 2592000"
    ))]
    pub ttl_seconds: Option<u64>,
    #[validate(range(
        min = 1,
        max = MAX_LOCK_TTL_SECONDS,
        message = "lockTtlSeconds must be between 1 and 3600"
    ))]
    pub lock_ttl_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BatchGetRequest {
    #[validate(length(min = 1, max = MAX_BATCH_SIZE, message = "between 1 and 500 ids are required"))]
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchEntry {
    pub id: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchSetRequest {
    #[validate(length(min = 1, max = MAX_BATCH_SIZE, message = "between 1 and 500 entries are required"))]
    pub entries: Vec<BatchEntry>,
    #[validate(range(
        min = 1,
        max = MAX_TTL_SECONDS,
        message = "ttlSeconds must be between 1 and 2592000"
    ))]
    pub ttl_seconds: Option<u64>,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct KeyResponse {
    /// The full tenant-scoped key the value was stored under
    pub key: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CounterResponse {
    pub value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LockedWriteResponse {
    /// `false` when another writer held the lock and nothing was written
    pub acquired: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchGetResponse {
    /// One slot per requested id, `null` where nothing is cached
    #[schema(value_type = Vec<Object>)]
    pub values: Vec<Option<Value>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchSetResponse {
    pub count: usize,
}
