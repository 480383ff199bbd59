//! Tenant-scoped cache with pluggable storage backends.
//!
//! Entries are addressed by a `(tenant, namespace, parts...)` key, stored as
//! text (obfuscated JSON by default) and expire on their own. Backends:
//! - Memory store (in-process, for development and tests)
//! - Redis store (shared between processes, pooled with bb8)
//!
//! # Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"  # or "memory"
//! default_ttl_seconds = 300
//! lock_ttl_seconds = 10
//! operation_timeout_ms = 2000
//! obfuscation_key = "change-me"
//!
//! [cache.redis]
//! url = "redis://127.0.0.1:6379"
//! pool_size = 8
//! connection_timeout = 5
//! key_prefix = "intellecty"
//! ```
//!
//! # Usage
//!
//! Use the `tenant_cached` attribute for cache-aside service methods:
//!
//! ```ignore
//! #[tenant_cached(namespace = "forecast", ttl = 300, tenant = tenant, key = product_id)]
//! pub async fn forecast(&self, tenant: &str, product_id: &str) -> AppResult<Forecast> {
//!     compute(product_id)
//! }
//! ```

mod codec;
mod error;
mod key;
mod memory;
mod patterns;
mod redis;
mod tenant;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use codec::{Encoding, Obfuscator};
pub use error::CacheError;
pub use key::{CacheKey, KEY_SEPARATOR, validate_segment};
pub use macros::tenant_cached;
pub use memory::MemoryStore;
pub use self::redis::RedisStore;
pub use tenant::TenantCache;
pub use traits::CacheStore;

// Re-export config types
pub use crate::config::settings::{CacheBackend, CacheConfig, MemoryCacheConfig, RedisCacheConfig};
