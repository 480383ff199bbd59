//! Access patterns layered on [`TenantCache`].
//!
//! None of these keep state of their own; they only order calls to the
//! cache and to a caller-supplied producer or writer.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::{CacheError, CacheKey, TenantCache};

impl TenantCache {
    /// Cache-aside read.
    ///
    /// Returns the cached value on a hit. On a miss runs `producer`, stores
    /// a successful result and returns it. A failure to store is logged and
    /// does not affect the result; a producer error is returned unchanged.
    pub async fn cache_aside<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl_seconds: Option<u64>,
        producer: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await {
            tracing::trace!(key = %key, "Cache hit");
            return Ok(cached);
        }

        tracing::trace!(key = %key, "Cache miss");
        let value = producer().await?;

        if let Err(e) = self.set(key, &value, ttl_seconds).await {
            tracing::warn!(key = %key, error = %e, "Failed to populate cache after miss");
        }

        Ok(value)
    }

    /// Write-through: the authoritative write runs first and the cache is
    /// only updated once it has succeeded.
    pub async fn write_through<T, E, W, Fut>(
        &self,
        key: &CacheKey,
        value: T,
        ttl_seconds: Option<u64>,
        writer: W,
    ) -> Result<T, E>
    where
        T: Serialize,
        E: From<CacheError>,
        W: FnOnce(&T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        writer(&value).await?;
        self.set(key, &value, ttl_seconds).await?;
        Ok(value)
    }

    /// Cache first, then the authoritative write.
    ///
    /// Despite the name, the authoritative write is awaited before this
    /// returns; nothing is deferred or batched. If it fails, the cache
    /// already holds the new value until its TTL runs out.
    pub async fn write_behind<T, E, W, Fut>(
        &self,
        key: &CacheKey,
        value: T,
        ttl_seconds: Option<u64>,
        writer: W,
    ) -> Result<T, E>
    where
        T: Serialize,
        E: From<CacheError>,
        W: FnOnce(&T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        self.set(key, &value, ttl_seconds).await?;
        writer(&value).await?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::settings::CacheConfig;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Producer(&'static str),
        Cache(String),
    }

    impl From<CacheError> for TestError {
        fn from(error: CacheError) -> Self {
            TestError::Cache(error.to_string())
        }
    }

    fn cache() -> TenantCache {
        let config = CacheConfig {
            obfuscation_key: "pattern-tests".to_string(),
            ..CacheConfig::default()
        };
        TenantCache::new(Arc::new(MemoryStore::new()), &config).unwrap()
    }

    fn key(id: &str) -> CacheKey {
        CacheKey::new("acme", "patterns", &[id]).unwrap()
    }

    #[tokio::test]
    async fn test_cache_aside_calls_producer_once() {
        let cache = cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, TestError> = cache
                .cache_aside(&key("count"), Some(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_aside_propagates_producer_error() {
        let cache = cache();
        let value: Result<u32, TestError> = cache
            .cache_aside(&key("fail"), Some(60), || async {
                Err(TestError::Producer("upstream down"))
            })
            .await;
        assert_eq!(value, Err(TestError::Producer("upstream down")));
        assert!(!cache.exists(&key("fail")).await);
    }

    #[tokio::test]
    async fn test_write_through_skips_cache_on_writer_error() {
        let cache = cache();
        let result: Result<u32, TestError> = cache
            .write_through(&key("wt"), 7, Some(60), |_| async {
                Err(TestError::Producer("db rejected"))
            })
            .await;
        assert_eq!(result, Err(TestError::Producer("db rejected")));
        assert_eq!(cache.get::<u32>(&key("wt")).await, None);
    }

    #[tokio::test]
    async fn test_write_through_updates_cache_after_write() {
        let cache = cache();
        let result: Result<u32, TestError> = cache
            .write_through(&key("wt"), 7, Some(60), |v| {
                let v = *v;
                async move {
                    assert_eq!(v, 7);
                    Ok(())
                }
            })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(cache.get::<u32>(&key("wt")).await, Some(7));
    }

    #[tokio::test]
    async fn test_write_behind_caches_before_writer() {
        let cache = cache();
        let probe = cache.clone();
        let result: Result<u32, TestError> = cache
            .write_behind(&key("wb"), 9, Some(60), |_| async move {
                assert_eq!(probe.get::<u32>(&key("wb")).await, Some(9));
                Err(TestError::Producer("db rejected"))
            })
            .await;
        assert_eq!(result, Err(TestError::Producer("db rejected")));
        assert_eq!(cache.get::<u32>(&key("wb")).await, Some(9));
    }

    #[tokio::test]
    async fn test_write_through_surfaces_cache_error() {
        let config = CacheConfig {
            obfuscation_key: "pattern-tests".to_string(),
            default_ttl_seconds: 0,
            ..CacheConfig::default()
        };
        let cache = TenantCache::new(Arc::new(MemoryStore::new()), &config).unwrap();
        let result: Result<u32, TestError> = cache
            .write_through(&key("ttl"), 1, None, |_| async { Ok(()) })
            .await;
        assert!(matches!(result, Err(TestError::Cache(_))));
    }
}
