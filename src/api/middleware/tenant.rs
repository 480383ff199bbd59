//! Tenant identification from the `x-tenant-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::cache::validate_segment;
use crate::error::AppError;

/// Header carrying the caller's tenant identifier.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenants starting with this prefix belong to the service itself.
const RESERVED_PREFIX: char = '_';

/// Validated tenant of the current request.
///
/// The value follows the same rules as a cache key segment, so it can be
/// used to build keys without further checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tenant(pub String);

impl Tenant {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(TENANT_HEADER)
            .ok_or_else(|| AppError::validation(TENANT_HEADER, "header is required"))?
            .to_str()
            .map_err(|_| AppError::validation(TENANT_HEADER, "header must be visible ASCII"))?;

        validate_segment("tenant", value)
            .map_err(|e| AppError::validation(TENANT_HEADER, e.to_string()))?;
        if value.starts_with(RESERVED_PREFIX) {
            return Err(AppError::validation(TENANT_HEADER, "tenant is reserved"));
        }
        Ok(Tenant(value.to_string()))
    }
}
