//! Service layer for business logic operations.

mod analytics;

pub use analytics::AnalyticsService;

use crate::cache::TenantCache;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap; every service only holds the shared cache handle.
#[derive(Clone)]
pub struct Services {
    pub analytics: AnalyticsService,
}

impl Services {
    pub fn new(cache: TenantCache) -> Self {
        Self {
            analytics: AnalyticsService::new(cache),
        }
    }
}
