//! Error handler for converting AppError to HTTP responses.
//!
//! Every failure leaves the API as `{ "success": false, "error": "..." }`,
//! whether it came from a handler, an extractor or an outer layer.

use axum::{
    Json,
    body::Bytes,
    extract::Request,
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::dto::ApiResponse;
use crate::error::AppError;

/// Largest non-JSON error body read back by [`global_error_handler`].
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

impl IntoResponse for AppError {
    /// # Status Code Mapping
    /// - NotFound → 404
    /// - Validation, ValidationErrors, BadRequest → 400
    /// - Cache → 503 when the backend is unreachable or timed out, else 500
    /// - Configuration, Internal → 500
    ///
    /// Server-side failures are logged here and answered with a generic
    /// message; client errors echo their message.
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let message = match &self {
            AppError::NotFound { .. }
            | AppError::Validation { .. }
            | AppError::ValidationErrors { .. } => self.to_string(),
            AppError::BadRequest { message } => message.clone(),
            AppError::Cache { operation, source } => {
                tracing::error!(operation = %operation, error = %source, "Cache failure");
                if source.is_unavailable() {
                    "Cache backend unavailable".to_string()
                } else {
                    format!("Cache operation failed: {}", operation)
                }
            }
            AppError::Configuration { key, source } => {
                tracing::error!(key = %key, error = %source, "Configuration failure");
                format!("Configuration error: {}", key)
            }
            AppError::Internal { source } => {
                tracing::error!(error = ?source, "Internal failure");
                "An internal error occurred".to_string()
            }
        };

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

/// Maps an AppError variant to its HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Cache { source, .. } if source.is_unavailable() => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AppError::Cache { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Answer for requests that match no route.
pub async fn fallback_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("The requested resource was not found")),
    )
        .into_response()
}

/// Rewrites error responses that did not come from [`AppError`] (timeouts,
/// unmatched methods, framework rejections) into the error envelope.
pub async fn global_error_handler(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body = axum::body::to_bytes(body, MAX_ERROR_BODY_BYTES)
        .await
        .unwrap_or_else(|_| Bytes::new());
    let original = String::from_utf8_lossy(&body).trim().to_string();

    let message = if !original.is_empty() {
        original
    } else {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    let mut rewritten = (status, Json(ApiResponse::failure(message))).into_response();
    // keep x-request-id and friends
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rewritten.headers_mut().insert(name.clone(), value.clone());
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            error_to_status_code(&AppError::not_found("cache entry", "key", "k")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_to_status_code(&AppError::bad_request("broken")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_to_status_code(&CacheError::Timeout(2000).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_to_status_code(&CacheError::Connection("refused".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_to_status_code(&CacheError::Operation("WRONGTYPE".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_to_status_code(&CacheError::InvalidKey("empty".into()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_validation_renders_envelope() {
        let response = AppError::validation("horizon", "too large").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Validation failed for horizon: too large");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let response = AppError::from(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_fallback_is_not_found_envelope() {
        let response = fallback_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["success"], false);
    }
}
