//! Analytics endpoints.

use axum::{Json, extract::State};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::ANALYTICS_TAG;
use crate::api::dto::{AbcRequest, ApiResponse, ForecastRequest};
use crate::api::middleware::Tenant;
use crate::error::AppResult;
use crate::models::{AbcReport, ForecastReport};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Register analytics routes.
pub fn analytics_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(abc_analysis))
        .routes(routes!(forecast))
}

/// POST /api/analytics/abc - Classify inventory by annual consumption value.
#[utoipa::path(
    post,
    path = "/abc",
    tag = ANALYTICS_TAG,
    params(("x-tenant-id" = String, Header, description = "Tenant identifier")),
    request_body = AbcRequest,
    responses(
        (status = 200, description = "ABC classification", body = ApiResponse<AbcReport>),
        (status = 400, description = "Invalid items or thresholds")
    )
)]
async fn abc_analysis(
    State(state): State<AppState>,
    tenant: Tenant,
    ValidatedJson(request): ValidatedJson<AbcRequest>,
) -> AppResult<Json<ApiResponse<AbcReport>>> {
    let report = state
        .services
        .analytics
        .abc_analysis(tenant.as_str(), request.into_input())
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/analytics/forecast - Exponential smoothing demand forecast.
#[utoipa::path(
    post,
    path = "/forecast",
    tag = ANALYTICS_TAG,
    params(("x-tenant-id" = String, Header, description = "Tenant identifier")),
    request_body = ForecastRequest,
    responses(
        (status = 200, description = "Forecast for the requested horizon", body = ApiResponse<ForecastReport>),
        (status = 400, description = "Invalid history, horizon or alpha")
    )
)]
async fn forecast(
    State(state): State<AppState>,
    tenant: Tenant,
    ValidatedJson(request): ValidatedJson<ForecastRequest>,
) -> AppResult<Json<ApiResponse<ForecastReport>>> {
    let input = request.into_input();
    let product_id = input.product_id.clone();
    let report = state
        .services
        .analytics
        .forecast(tenant.as_str(), &product_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}
