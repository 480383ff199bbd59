//! CacheStore trait definition.

use async_trait::async_trait;

use crate::cache::CacheError;

/// Trait for raw store operations on text values.
///
/// Keys passed in are already tenant-scoped; backends may add their own
/// global prefix. Every TTL is in seconds and must be greater than zero.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Get a value from the store.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Set a value with an expiry, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), CacheError>;

    /// Set a value only if the key is absent. Returns whether it was set.
    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove a value only if it currently equals `expected`.
    async fn remove_if_equals(&self, key: &str, expected: &str) -> Result<bool, CacheError>;

    /// Check whether a key exists.
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Get several values in one round trip, preserving input order.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError>;

    /// Set several values with the same TTL in one round trip.
    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: u64,
    ) -> Result<(), CacheError>;

    /// Atomically increment a counter and refresh its TTL.
    async fn increment(&self, key: &str, ttl_seconds: u64) -> Result<i64, CacheError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), CacheError>;
}
