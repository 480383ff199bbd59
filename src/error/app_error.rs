use axum::extract::rejection::JsonRejection;
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;

/// Application-wide error type.
///
/// Every handler and service returns [`AppResult`]; the HTTP edge turns the
/// variant into a status code and an error envelope.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Several fields failed `validator` checks at once
    #[error("Validation failed: {}", format_field_errors(errors))]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Cache operation failed: {operation}")]
    Cache {
        operation: String,
        #[source]
        source: CacheError,
    },

    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

/// One failing field of a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

fn format_field_errors(errors: &[ValidationFieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn not_found(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
        }
    }

    /// Wrap a cache failure with the name of the operation that hit it.
    pub fn cache(operation: impl Into<String>, source: CacheError) -> Self {
        match source {
            CacheError::InvalidKey(reason) => AppError::validation("key", reason),
            CacheError::InvalidArgument { field, reason } => AppError::validation(field, reason),
            source => AppError::Cache {
                operation: operation.into(),
                source,
            },
        }
    }
}

impl From<CacheError> for AppError {
    fn from(error: CacheError) -> Self {
        AppError::cache("cache", error)
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Configuration {
            key: error.field().unwrap_or("config").to_string(),
            source: error.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut field_errors: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationFieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();
        // HashMap iteration order is random
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationErrors {
            errors: field_errors,
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct ForecastShape {
        #[validate(range(min = 1, max = 52, message = "horizon must be between 1 and 52"))]
        horizon: u32,
        #[validate(length(min = 1))]
        product_id: String,
    }

    #[test]
    fn test_invalid_key_becomes_validation_error() {
        let error: AppError = CacheError::InvalidKey("tenant must not be empty".into()).into();
        assert!(matches!(
            error,
            AppError::Validation { ref field, .. } if field == "key"
        ));
    }

    #[test]
    fn test_invalid_argument_becomes_validation_error() {
        let error = AppError::cache(
            "increment",
            CacheError::invalid_argument("value", "'acme:hits:x' does not hold an integer"),
        );
        assert!(matches!(
            error,
            AppError::Validation { ref field, .. } if field == "value"
        ));
        assert_eq!(crate::api::middleware::error_to_status_code(&error), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cache_error_keeps_operation() {
        let error = AppError::cache("increment", CacheError::Timeout(20));
        match error {
            AppError::Cache { operation, source } => {
                assert_eq!(operation, "increment");
                assert!(source.is_unavailable());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_validator_errors_are_sorted_and_messaged() {
        let shape = ForecastShape {
            horizon: 0,
            product_id: String::new(),
        };
        let error: AppError = shape.validate().unwrap_err().into();
        match error {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].field, "horizon");
                assert_eq!(errors[0].message, "horizon must be between 1 and 52");
                assert_eq!(errors[1].field, "product_id");
                assert_eq!(errors[1].message, "length");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_config_error_key() {
        let error: AppError =
            ConfigError::validation("cache.redis.url", "bad scheme").into();
        assert!(matches!(
            error,
            AppError::Configuration { ref key, .. } if key == "cache.redis.url"
        ));
    }
}
