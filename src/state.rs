//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::cache::TenantCache;
use crate::services::Services;

/// Application state shared by every handler.
///
/// Cloning is cheap since the cache and the services only hold `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the tenant cache, used by the cache and health endpoints
    pub cache: TenantCache,
}

impl AppState {
    /// Creates the state from the process-wide cache.
    ///
    /// # Example
    /// ```ignore
    /// let cache = TenantCache::from_config(&settings.cache).await?;
    /// let state = AppState::new(cache);
    /// ```
    pub fn new(cache: TenantCache) -> Self {
        Self {
            services: Services::new(cache.clone()),
            cache,
        }
    }
}
