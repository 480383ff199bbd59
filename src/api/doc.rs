use utoipa::OpenApi;

pub const HEALTH_TAG: &str = "Health";
pub const CACHE_TAG: &str = "Cache";
pub const ANALYTICS_TAG: &str = "Analytics";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Intellecty Retail",
        description = "Tenant-scoped cache and inventory analytics API",
    ),
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = CACHE_TAG, description = "Tenant cache endpoints"),
        (name = ANALYTICS_TAG, description = "Inventory analytics endpoints"),
    )
)]
pub struct ApiDoc;
