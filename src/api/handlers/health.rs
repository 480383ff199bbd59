//! Health check endpoint handlers.
//!
//! Health checks ping the cache backend directly; the liveness probe
//! touches nothing.

use std::collections::HashMap;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::Json};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::HEALTH_TAG;
use crate::api::dto::{ApiResponse, ComponentHealth, HealthResponse, HealthStatus, ProbeResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Full report
/// - `GET /health/ready` - Readiness probe
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health_check))
        .routes(routes!(readiness_check))
        .routes(routes!(liveness_check))
}

/// Full health report including the cache backend.
///
/// Answers 503 with the report's failure message when the cache does not
/// respond.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = ApiResponse<HealthResponse>),
        (status = 503, description = "Cache backend unavailable")
    ),
    tag = HEALTH_TAG
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthResponse>>, (StatusCode, Json<ApiResponse<()>>)> {
    let cache_check = check_cache(&state).await;
    let status = cache_check.status;

    if status == HealthStatus::Unhealthy {
        let reason = cache_check.message.unwrap_or_default();
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::failure(format!("Cache check failed: {}", reason))),
        ));
    }

    let mut checks = HashMap::new();
    checks.insert("cache".to_string(), cache_check);

    Ok(Json(ApiResponse::ok(HealthResponse {
        status,
        version: crate::pkg_version().to_string(),
        timestamp: jiff::Timestamp::now().to_string(),
        checks,
    })))
}

/// Readiness probe: ready once the cache backend answers a ping.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready", body = ApiResponse<ProbeResponse>),
        (status = 503, description = "Service is not ready")
    ),
    tag = HEALTH_TAG
)]
pub async fn readiness_check(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProbeResponse>>> {
    state
        .cache
        .ping()
        .await
        .map_err(|e| AppError::cache("ping", e))?;

    Ok(Json(ApiResponse::ok(ProbeResponse {
        status: "ready".to_string(),
    })))
}

/// Liveness probe. Responds as long as the process serves requests.
#[utoipa::path(
    get,
    path = "/health/live",
    responses(
        (status = 200, description = "Service is alive", body = ApiResponse<ProbeResponse>)
    ),
    tag = HEALTH_TAG
)]
pub async fn liveness_check() -> Json<ApiResponse<ProbeResponse>> {
    Json(ApiResponse::ok(ProbeResponse {
        status: "alive".to_string(),
    }))
}

async fn check_cache(state: &AppState) -> ComponentHealth {
    let start_time = Instant::now();
    let backend = state.cache.backend_name();

    match state.cache.ping().await {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(format!("{} backend answered", backend)),
            response_time_ms: Some(start_time.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(backend, error = %e, "Cache health check failed");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
                response_time_ms: Some(start_time.elapsed().as_millis() as u64),
            }
        }
    }
}
