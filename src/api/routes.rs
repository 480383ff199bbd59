//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, header},
    middleware,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{
    REQUEST_ID_HEADER, TENANT_HEADER, fallback_handler, global_error_handler, logging_middleware,
    request_id_middleware,
};
use crate::config::settings::ServerConfig;
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. CORS
/// 2. Compression - negotiated through `Accept-Encoding`
/// 3. Request ID - generates/propagates request IDs
/// 4. Logging - logs requests with request IDs
/// 5. Error envelope - rewrites non-JSON error responses
/// 6. Timeout - answers 408 after `server.request_timeout` seconds
///
/// # Routes
/// - `/api/health` - Health checks
/// - `/api/cache` - Tenant cache operations
/// - `/api/analytics` - ABC analysis and forecasting
/// - `/swagger-ui`, `/api-docs/openapi.json` - API documentation
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = OpenApiRouter::new()
        .merge(handlers::health::health_routes())
        .nest("/cache", handlers::cache::cache_routes())
        .nest("/analytics", handlers::analytics::analytics_routes());

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", api_routes)
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .fallback(fallback_handler)
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout)))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(TENANT_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
