//! Test doubles for cache backends.

use async_trait::async_trait;

use crate::cache::{CacheError, CacheStore};

/// Store that fails every call, as an unreachable backend would.
pub(crate) struct DownStore;

#[async_trait]
impl CacheStore for DownStore {
    fn backend_name(&self) -> &'static str {
        "down"
    }
    async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn set(&self, _: &str, _: String, _: u64) -> Result<(), CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn set_if_absent(&self, _: &str, _: String, _: u64) -> Result<bool, CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn remove(&self, _: &str) -> Result<(), CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn remove_if_equals(&self, _: &str, _: &str) -> Result<bool, CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn exists(&self, _: &str) -> Result<bool, CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn get_many(&self, _: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn set_many(&self, _: Vec<(String, String)>, _: u64) -> Result<(), CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn increment(&self, _: &str, _: u64) -> Result<i64, CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Connection("refused".to_string()))
    }
}
