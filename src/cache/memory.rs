//! In-process cache store with per-entry TTL, backed by DashMap.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;

use crate::cache::{CacheError, CacheStore};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn new(value: String, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Deadline `ttl_seconds` from now; errors instead of overflowing `Instant`.
fn expiry(ttl_seconds: u64) -> Result<Instant, CacheError> {
    Instant::now()
        .checked_add(Duration::from_secs(ttl_seconds))
        .ok_or_else(|| CacheError::invalid_argument("ttl_seconds", "too large"))
}

/// Memory store. Expired entries are invisible immediately and physically
/// dropped on access or by [`MemoryStore::purge_expired`].
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a task that purges expired entries every `interval`.
    ///
    /// The task holds only a weak reference and stops once the store is
    /// dropped.
    pub fn spawn_sweeper(store: &Arc<Self>, interval: Duration) {
        let weak: Weak<Self> = Arc::downgrade(store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Purged expired memory cache entries");
                }
            }
        });
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        None
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.live_value(key))
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), CacheError> {
        let expires_at = expiry(ttl_seconds)?;
        self.entries
            .insert(key.to_string(), Entry::new(value, expires_at));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl_seconds: u64,
    ) -> Result<bool, CacheError> {
        let expires_at = expiry(ttl_seconds)?;
        let now = Instant::now();
        match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(Entry::new(value, expires_at));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new(value, expires_at));
                Ok(true)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_if_equals(&self, key: &str, expected: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove_if(key, |_, entry| !entry.is_expired(now) && entry.value == expected)
            .is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_value(key).is_some())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<String>>, CacheError> {
        Ok(keys.iter().map(|key| self.live_value(key)).collect())
    }

    async fn set_many(
        &self,
        entries: Vec<(String, String)>,
        ttl_seconds: u64,
    ) -> Result<(), CacheError> {
        let expires_at = expiry(ttl_seconds)?;
        for (key, value) in entries {
            self.entries.insert(key, Entry::new(value, expires_at));
        }
        Ok(())
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> Result<i64, CacheError> {
        let expires_at = expiry(ttl_seconds)?;
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new("0".to_string(), expires_at));

        let current = if entry.is_expired(now) {
            0
        } else {
            entry.value.parse::<i64>().map_err(|_| {
                CacheError::invalid_argument("value", format!("'{}' does not hold an integer", key))
            })?
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| CacheError::Operation(format!("counter '{}' overflowed", key)))?;

        *entry = Entry::new(next.to_string(), expires_at);
        Ok(next)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
