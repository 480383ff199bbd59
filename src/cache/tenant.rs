//! Tenant cache facade over a [`CacheStore`] backend.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::cache::memory::MemoryStore;
use crate::cache::redis::RedisStore;
use crate::cache::{CacheError, CacheKey, CacheStore, Encoding, Obfuscator};
use crate::config::settings::{CacheBackend, CacheConfig};
use crate::config::validation::{MAX_LOCK_TTL_SECONDS, MAX_TTL_SECONDS};

/// Tenant-scoped cache shared by every request of the process.
///
/// Built once at startup and passed around through application state;
/// cloning only bumps reference counts.
///
/// Read operations (`get`, `get_many`, `exists`) log backend failures and
/// behave as if the entry were absent. Write operations return the error so
/// callers never assume a write happened when it did not.
#[derive(Clone)]
pub struct TenantCache {
    store: Arc<dyn CacheStore>,
    obfuscator: Obfuscator,
    default_ttl: u64,
    lock_ttl: u64,
    op_timeout: Duration,
}

impl TenantCache {
    /// Create a cache over an existing store.
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Result<Self, CacheError> {
        Ok(Self {
            store,
            obfuscator: Obfuscator::new(&config.obfuscation_key)?,
            default_ttl: config.default_ttl_seconds,
            lock_ttl: config.lock_ttl_seconds,
            op_timeout: Duration::from_millis(config.operation_timeout_ms),
        })
    }

    /// Connect to the configured backend and build the cache.
    pub async fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let store: Arc<dyn CacheStore> = match config.backend {
            CacheBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                MemoryStore::spawn_sweeper(
                    &store,
                    Duration::from_secs(config.memory.sweep_interval_seconds),
                );
                store
            }
            CacheBackend::Redis => Arc::new(RedisStore::new(&config.redis).await?),
        };

        tracing::info!(backend = store.backend_name(), "Tenant cache initialized");
        Self::new(store, config)
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn lock_ttl(&self) -> u64 {
        self.lock_ttl
    }

    /// Get and decode a value. Missing, expired or unreadable entries are `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let stored = match self.timed(self.store.get(key.as_str())).await {
            Ok(stored) => stored?,
            Err(e) => {
                self.log_read_failure("get", key.as_str(), &e);
                return None;
            }
        };

        match self.obfuscator.decode(&stored) {
            Ok(value) => Some(value),
            Err(e) => {
                self.log_read_failure("decode", key.as_str(), &e);
                None
            }
        }
    }

    /// Store an obfuscated value. `ttl_seconds` falls back to the default TTL.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        self.set_with(key, value, ttl_seconds, Encoding::Obfuscated)
            .await
    }

    /// Store a value with an explicit encoding.
    pub async fn set_with<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl_seconds: Option<u64>,
        encoding: Encoding,
    ) -> Result<(), CacheError> {
        let ttl = self.resolve_ttl(ttl_seconds)?;
        let stored = self.obfuscator.encode(value, encoding)?;
        self.timed(self.store.set(key.as_str(), stored, ttl))
            .await
            .inspect_err(|e| self.log_write_failure("set", key.as_str(), e))
    }

    /// Remove an entry. Removing a missing entry succeeds.
    pub async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.timed(self.store.remove(key.as_str()))
            .await
            .inspect_err(|e| self.log_write_failure("delete", key.as_str(), e))
    }

    /// Whether an entry exists, without fetching it.
    pub async fn exists(&self, key: &CacheKey) -> bool {
        match self.timed(self.store.exists(key.as_str())).await {
            Ok(exists) => exists,
            Err(e) => {
                self.log_read_failure("exists", key.as_str(), &e);
                false
            }
        }
    }

    /// Store several obfuscated values in one round trip.
    pub async fn set_many<T: Serialize>(
        &self,
        entries: &[(CacheKey, T)],
        ttl_seconds: Option<u64>,
    ) -> Result<(), CacheError> {
        let ttl = self.resolve_ttl(ttl_seconds)?;
        let encoded = entries
            .iter()
            .map(|(key, value)| {
                self.obfuscator
                    .encode(value, Encoding::Obfuscated)
                    .map(|stored| (key.as_str().to_string(), stored))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.timed(self.store.set_many(encoded, ttl))
            .await
            .inspect_err(|e| self.log_write_failure("set_many", "<batch>", e))
    }

    /// Fetch several values in one round trip.
    ///
    /// The result has one slot per input key, in input order; missing or
    /// unreadable entries are `None`.
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[CacheKey]) -> Vec<Option<T>> {
        let raw_keys: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
        let stored = match self.timed(self.store.get_many(&raw_keys)).await {
            Ok(stored) if stored.len() == keys.len() => stored,
            Ok(stored) => {
                tracing::warn!(
                    expected = keys.len(),
                    received = stored.len(),
                    backend = self.backend_name(),
                    "Cache get_many returned a mismatched number of values"
                );
                return keys.iter().map(|_| None).collect();
            }
            Err(e) => {
                self.log_read_failure("get_many", "<batch>", &e);
                return keys.iter().map(|_| None).collect();
            }
        };

        stored
            .into_iter()
            .zip(keys)
            .map(|(value, key)| {
                let value = value?;
                self.obfuscator
                    .decode(&value)
                    .inspect_err(|e| self.log_read_failure("decode", key.as_str(), e))
                    .ok()
            })
            .collect()
    }

    /// Atomically increment a counter and refresh its TTL.
    pub async fn increment(
        &self,
        key: &CacheKey,
        ttl_seconds: Option<u64>,
    ) -> Result<i64, CacheError> {
        let ttl = self.resolve_ttl(ttl_seconds)?;
        self.timed(self.store.increment(key.as_str(), ttl))
            .await
            .inspect_err(|e| self.log_write_failure("increment", key.as_str(), e))
    }

    /// Write `value` only if the entry's lock can be taken.
    ///
    /// Returns `Ok(false)` without touching anything when another writer
    /// holds the lock. The lock is released right after the write, and only
    /// if it still carries this call's token.
    ///
    /// This is a best-effort hint, not a fenced distributed lock: if the
    /// write outlives `lock_ttl_seconds`, another writer may take the lock
    /// and both writes land.
    pub async fn set_with_lock<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl_seconds: Option<u64>,
        lock_ttl_seconds: Option<u64>,
    ) -> Result<bool, CacheError> {
        let lock_ttl = lock_ttl_seconds.unwrap_or(self.lock_ttl);
        if lock_ttl == 0 || lock_ttl > MAX_LOCK_TTL_SECONDS {
            return Err(CacheError::invalid_argument(
                "lock_ttl_seconds",
                format!("must be between 1 and {}", MAX_LOCK_TTL_SECONDS),
            ));
        }

        let ttl = self.resolve_ttl(ttl_seconds)?;
        let lock_key = key.lock_key();
        let token = lock_token();
        let acquired = self
            .timed(self.store.set_if_absent(&lock_key, token.clone(), lock_ttl))
            .await
            .inspect_err(|e| self.log_write_failure("lock", &lock_key, e))?;

        if !acquired {
            tracing::debug!(key = %key, "Cache lock held by another writer");
            return Ok(false);
        }

        let written = self.set(key, value, Some(ttl)).await;
        self.release_lock(&lock_key, &token).await;
        written.map(|_| true)
    }

    /// Check that the backend answers.
    pub async fn ping(&self) -> Result<(), CacheError> {
        self.timed(self.store.ping()).await
    }

    async fn release_lock(&self, lock_key: &str, token: &str) {
        match self
            .timed(self.store.remove_if_equals(lock_key, token))
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                key = lock_key,
                "Cache lock expired before release; another writer may have taken it"
            ),
            Err(e) => self.log_write_failure("unlock", lock_key, &e),
        }
    }

    fn resolve_ttl(&self, ttl_seconds: Option<u64>) -> Result<u64, CacheError> {
        match ttl_seconds.unwrap_or(self.default_ttl) {
            ttl @ 1..=MAX_TTL_SECONDS => Ok(ttl),
            _ => Err(CacheError::invalid_argument(
                "ttl_seconds",
                format!("must be between 1 and {}", MAX_TTL_SECONDS),
            )),
        }
    }

    async fn timed<T, F>(&self, operation: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.op_timeout, operation)
            .await
            .map_err(|_| CacheError::Timeout(self.op_timeout.as_millis() as u64))?
    }

    fn log_read_failure(&self, operation: &str, key: &str, error: &CacheError) {
        tracing::warn!(
            operation,
            key,
            backend = self.backend_name(),
            error = %error,
            "Cache read failed, treating entry as absent"
        );
    }

    fn log_write_failure(&self, operation: &str, key: &str, error: &CacheError) {
        tracing::error!(
            operation,
            key,
            backend = self.backend_name(),
            error = %error,
            "Cache write failed"
        );
    }
}

fn lock_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}-{}", millis, Uuid::new_v4())
}
