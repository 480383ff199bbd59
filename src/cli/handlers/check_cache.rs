//! Cache connectivity check
//!
//! Connects with the configured backend, pings it and runs a
//! write/read/delete round trip under the reserved system tenant.

use crate::cache::{CacheKey, TenantCache};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};
use serde_json::json;

/// Tenant used for probes; never a customer tenant.
pub const SYSTEM_TENANT: &str = "_system";
const PROBE_NAMESPACE: &str = "probe";
const PROBE_TTL_SECONDS: u64 = 30;

pub struct CheckCacheCommandHandler {
    config: Settings,
}

impl CheckCacheCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Connect to the backend and run the probe.
    pub async fn execute(&self) -> AppResult<()> {
        println!(
            "Checking cache backend: {}",
            self.config.cache.backend.as_str()
        );

        let cache = TenantCache::from_config(&self.config.cache)
            .await
            .map_err(|e| AppError::cache("connect", e))?;
        println!("✓ Connected");

        Self::probe(&cache).await?;
        println!("Cache check completed successfully");
        Ok(())
    }

    /// Ping, then write, read back and delete a short-lived entry.
    pub async fn probe(cache: &TenantCache) -> AppResult<()> {
        cache.ping().await.map_err(|e| AppError::cache("ping", e))?;
        println!("✓ Ping");

        let id = uuid::Uuid::new_v4().to_string();
        let key = CacheKey::new(SYSTEM_TENANT, PROBE_NAMESPACE, &[id.as_str()])
            .map_err(|e| AppError::cache("key", e))?;
        let written = json!({ "probe": id });

        cache
            .set(&key, &written, Some(PROBE_TTL_SECONDS))
            .await
            .map_err(|e| AppError::cache("set", e))?;

        let read: Option<serde_json::Value> = cache.get(&key).await;
        if read.as_ref() != Some(&written) {
            // Best effort; the entry expires on its own anyway.
            let _ = cache.delete(&key).await;
            return Err(AppError::Internal {
                source: anyhow::anyhow!("Cache probe read back {:?}", read),
            });
        }
        println!("✓ Round trip ({})", key.as_str());

        cache
            .delete(&key)
            .await
            .map_err(|e| AppError::cache("delete", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::DownStore;
    use crate::config::settings::CacheBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_check_memory_backend() {
        let mut config = Settings::default();
        config.cache.backend = CacheBackend::Memory;

        let handler = CheckCacheCommandHandler::new(config);
        assert!(handler.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_probe_leaves_no_entry_behind() {
        let cache = TenantCache::from_config(&Settings::default().cache)
            .await
            .unwrap();

        CheckCacheCommandHandler::probe(&cache).await.unwrap();
        CheckCacheCommandHandler::probe(&cache).await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_reports_unavailable_backend() {
        let cache = TenantCache::new(Arc::new(DownStore), &Settings::default().cache).unwrap();

        let err = CheckCacheCommandHandler::probe(&cache).await.unwrap_err();
        assert!(matches!(err, AppError::Cache { .. }));
    }
}
