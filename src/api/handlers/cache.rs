//! Raw tenant cache endpoints.
//!
//! Every entry lives under `<tenant>:<namespace>:<id>`, with the tenant
//! taken from the `x-tenant-id` header.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::Value;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::CACHE_TAG;
use crate::api::dto::{
    ApiResponse, BatchGetRequest, BatchGetResponse, BatchSetRequest, BatchSetResponse,
    CounterResponse, DeletedResponse, ExistsResponse, IncrementRequest, KeyResponse,
    LockedPutRequest, LockedWriteResponse, PutEntryRequest,
};
use crate::api::middleware::Tenant;
use crate::cache::{CacheKey, Encoding};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::validate::ValidatedJson;

/// Register cache routes.
pub fn cache_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(get_entry, put_entry, delete_entry))
        .routes(routes!(entry_exists))
        .routes(routes!(increment_entry))
        .routes(routes!(put_entry_locked))
        .routes(routes!(batch_get))
        .routes(routes!(batch_set))
}

fn entry_key(tenant: &Tenant, namespace: &str, id: &str) -> AppResult<CacheKey> {
    CacheKey::new(tenant.as_str(), namespace, &[id]).map_err(|e| AppError::cache("key", e))
}

/// GET /api/cache/{namespace}/{id} - Read a stored value.
#[utoipa::path(
    get,
    path = "/{namespace}/{id}",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("id" = String, Path, description = "Entry id"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    responses(
        (status = 200, description = "Stored JSON value as `data`"),
        (status = 404, description = "No entry under this key")
    )
)]
async fn get_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((namespace, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let key = entry_key(&tenant, &namespace, &id)?;
    let value = state
        .cache
        .get::<Value>(&key)
        .await
        .ok_or_else(|| AppError::not_found("cache entry", "key", key.as_str()))?;
    Ok(Json(ApiResponse::ok(value)))
}

/// PUT /api/cache/{namespace}/{id} - Store a value.
#[utoipa::path(
    put,
    path = "/{namespace}/{id}",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("id" = String, Path, description = "Entry id"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    request_body = PutEntryRequest,
    responses(
        (status = 200, description = "Value stored", body = ApiResponse<KeyResponse>)
    )
)]
async fn put_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((namespace, id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<PutEntryRequest>,
) -> AppResult<Json<ApiResponse<KeyResponse>>> {
    let key = entry_key(&tenant, &namespace, &id)?;
    let encoding = if request.obfuscate.unwrap_or(true) {
        Encoding::Obfuscated
    } else {
        Encoding::Plain
    };

    state
        .cache
        .set_with(&key, &request.value, request.ttl_seconds, encoding)
        .await
        .map_err(|e| AppError::cache("set", e))?;

    Ok(Json(ApiResponse::ok(KeyResponse {
        key: key.to_string(),
    })))
}

/// DELETE /api/cache/{namespace}/{id} - Remove a value. Idempotent.
#[utoipa::path(
    delete,
    path = "/{namespace}/{id}",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("id" = String, Path, description = "Entry id"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    responses(
        (status = 200, description = "Entry removed", body = ApiResponse<DeletedResponse>)
    )
)]
async fn delete_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((namespace, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<DeletedResponse>>> {
    let key = entry_key(&tenant, &namespace, &id)?;
    state
        .cache
        .delete(&key)
        .await
        .map_err(|e| AppError::cache("delete", e))?;
    Ok(Json(ApiResponse::ok(DeletedResponse { deleted: true })))
}

/// GET /api/cache/{namespace}/{id}/exists - Check for an entry.
#[utoipa::path(
    get,
    path = "/{namespace}/{id}/exists",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("id" = String, Path, description = "Entry id"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    responses(
        (status = 200, description = "Whether the entry exists", body = ApiResponse<ExistsResponse>)
    )
)]
async fn entry_exists(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((namespace, id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<ExistsResponse>>> {
    let key = entry_key(&tenant, &namespace, &id)?;
    let exists = state.cache.exists(&key).await;
    Ok(Json(ApiResponse::ok(ExistsResponse { exists })))
}

/// POST /api/cache/{namespace}/{id}/increment - Bump a counter.
#[utoipa::path(
    post,
    path = "/{namespace}/{id}/increment",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("id" = String, Path, description = "Counter id"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    request_body = IncrementRequest,
    responses(
        (status = 200, description = "Value after the increment", body = ApiResponse<CounterResponse>)
    )
)]
async fn increment_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((namespace, id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<IncrementRequest>,
) -> AppResult<Json<ApiResponse<CounterResponse>>> {
    let key = entry_key(&tenant, &namespace, &id)?;
    let value = state
        .cache
        .increment(&key, request.ttl_seconds)
        .await
        .map_err(|e| AppError::cache("increment", e))?;
    Ok(Json(ApiResponse::ok(CounterResponse { value })))
}

/// PUT /api/cache/{namespace}/{id}/locked - Store a value under the entry's lock.
///
/// `acquired: false` means another writer held the lock and nothing changed.
#[utoipa::path(
    put,
    path = "/{namespace}/{id}/locked",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("id" = String, Path, description = "Entry id"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    request_body = LockedPutRequest,
    responses(
        (status = 200, description = "Whether the lock was taken", body = ApiResponse<LockedWriteResponse>)
    )
)]
async fn put_entry_locked(
    State(state): State<AppState>,
    tenant: Tenant,
    Path((namespace, id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<LockedPutRequest>,
) -> AppResult<Json<ApiResponse<LockedWriteResponse>>> {
    let key = entry_key(&tenant, &namespace, &id)?;
    let acquired = state
        .cache
        .set_with_lock(
            &key,
            &request.value,
            request.ttl_seconds,
            request.lock_ttl_seconds,
        )
        .await
        .map_err(|e| AppError::cache("set_with_lock", e))?;
    Ok(Json(ApiResponse::ok(LockedWriteResponse { acquired })))
}

/// POST /api/cache/{namespace}/batch/get - Read several entries at once.
#[utoipa::path(
    post,
    path = "/{namespace}/batch/get",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    request_body = BatchGetRequest,
    responses(
        (status = 200, description = "Values in request order", body = ApiResponse<BatchGetResponse>)
    )
)]
async fn batch_get(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(namespace): Path<String>,
    ValidatedJson(request): ValidatedJson<BatchGetRequest>,
) -> AppResult<Json<ApiResponse<BatchGetResponse>>> {
    let keys = request
        .ids
        .iter()
        .map(|id| entry_key(&tenant, &namespace, id))
        .collect::<AppResult<Vec<_>>>()?;
    let values = state.cache.get_many::<Value>(&keys).await;
    Ok(Json(ApiResponse::ok(BatchGetResponse { values })))
}

/// POST /api/cache/{namespace}/batch/set - Store several entries at once.
#[utoipa::path(
    post,
    path = "/{namespace}/batch/set",
    tag = CACHE_TAG,
    params(
        ("namespace" = String, Path, description = "Logical namespace"),
        ("x-tenant-id" = String, Header, description = "Tenant identifier")
    ),
    request_body = BatchSetRequest,
    responses(
        (status = 200, description = "Number of entries stored", body = ApiResponse<BatchSetResponse>)
    )
)]
async fn batch_set(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(namespace): Path<String>,
    ValidatedJson(request): ValidatedJson<BatchSetRequest>,
) -> AppResult<Json<ApiResponse<BatchSetResponse>>> {
    let entries = request
        .entries
        .into_iter()
        .map(|entry| -> AppResult<(CacheKey, Value)> {
            Ok((entry_key(&tenant, &namespace, &entry.id)?, entry.value))
        })
        .collect::<AppResult<Vec<_>>>()?;

    state
        .cache
        .set_many(&entries, request.ttl_seconds)
        .await
        .map_err(|e| AppError::cache("set_many", e))?;

    Ok(Json(ApiResponse::ok(BatchSetResponse {
        count: entries.len(),
    })))
}
