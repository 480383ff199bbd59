//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::environment::Environment;
use crate::config::error::ConfigError;
use crate::config::settings::{
    CacheConfig, DEFAULT_OBFUSCATION_KEY, FileSettings, LoggerSettings, RedisCacheConfig,
    ServerConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Upper bound for lock TTLs, in seconds
pub const MAX_LOCK_TTL_SECONDS: u64 = 3600;

/// Upper bound for entry TTLs (30 days), in seconds
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 3600;

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl RedisCacheConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let secure = self.url.starts_with("rediss://");
        if !secure && !self.url.starts_with("redis://") {
            return Err(ConfigError::validation(
                "cache.redis.url",
                "Redis URL must start with redis:// or rediss://",
            ));
        }

        if self.tls_enabled && !secure {
            return Err(ConfigError::validation(
                "cache.redis.url",
                "TLS is enabled, so the Redis URL must use the rediss:// scheme",
            ));
        }

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "cache.redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "cache.redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        if self.key_prefix.contains(char::is_whitespace) {
            return Err(ConfigError::validation(
                "cache.redis.key_prefix",
                "Key prefix must not contain whitespace.",
            ));
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Validate cache configuration
    ///
    /// The Redis section is only checked when Redis is the selected backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ttl_seconds == 0 || self.default_ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::ValidationError {
                field: "cache.default_ttl_seconds".to_string(),
                message: format!(
                    "Default TTL must be between 1 and {} seconds.",
                    MAX_TTL_SECONDS
                ),
            });
        }

        if self.lock_ttl_seconds == 0 || self.lock_ttl_seconds > MAX_LOCK_TTL_SECONDS {
            return Err(ConfigError::ValidationError {
                field: "cache.lock_ttl_seconds".to_string(),
                message: format!(
                    "Lock TTL must be between 1 and {} seconds.",
                    MAX_LOCK_TTL_SECONDS
                ),
            });
        }

        if self.operation_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "cache.operation_timeout_ms",
                "Operation timeout must be greater than 0 milliseconds.",
            ));
        }

        if self.obfuscation_key.is_empty() {
            return Err(ConfigError::validation(
                "cache.obfuscation_key",
                "Obfuscation key must not be empty.",
            ));
        }

        if self.memory.sweep_interval_seconds == 0 {
            return Err(ConfigError::validation(
                "cache.memory.sweep_interval_seconds",
                "Sweep interval must be greater than 0 seconds.",
            ));
        }

        if self.backend == crate::config::settings::CacheBackend::Redis {
            self.redis.validate()?;
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// This method validates all sub-configurations and returns the first
    /// validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logger.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    /// Run [`Settings::validate`] plus the rules that depend on the environment.
    pub fn validate_for(&self, environment: Environment) -> Result<(), ConfigError> {
        self.validate()?;

        if environment == Environment::Production
            && self.cache.obfuscation_key == DEFAULT_OBFUSCATION_KEY
        {
            return Err(ConfigError::validation(
                "cache.obfuscation_key",
                "The built-in development obfuscation key cannot be used in production. Set INTELLECTY_CACHE__OBFUSCATION_KEY.",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::CacheBackend;

    fn field_of(err: ConfigError) -> String {
        match err {
            ConfigError::ValidationError { field, .. } => field,
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_server_config_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_server_config_invalid_port_zero() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate().unwrap_err()), "server.port");
    }

    #[test]
    fn test_server_config_valid_port_boundaries() {
        for port in [1, 65535] {
            let config = ServerConfig {
                port,
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_server_config_invalid_timeouts() {
        let config = ServerConfig {
            request_timeout: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "server.request_timeout"
        );

        let config = ServerConfig {
            keep_alive_timeout: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "server.keep_alive_timeout"
        );
    }

    #[test]
    fn test_logger_settings_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate().unwrap_err()), "logger.level");
    }

    #[test]
    fn test_logger_settings_level_case_insensitive() {
        let settings = LoggerSettings {
            level: "DEBUG".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_settings_enabled_empty_path() {
        let settings = LoggerSettings {
            file: FileSettings {
                enabled: true,
                path: "  ".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "logger.file.path"
        );
    }

    #[test]
    fn test_file_settings_invalid_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            field_of(settings.validate().unwrap_err()),
            "logger.file.format"
        );
    }

    #[test]
    fn test_cache_config_default_valid() {
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_cache_config_zero_ttls() {
        let config = CacheConfig {
            default_ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.default_ttl_seconds"
        );

        let config = CacheConfig {
            lock_ttl_seconds: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.lock_ttl_seconds"
        );
    }

    #[test]
    fn test_cache_config_lock_ttl_upper_bound() {
        let config = CacheConfig {
            lock_ttl_seconds: MAX_LOCK_TTL_SECONDS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = CacheConfig {
            lock_ttl_seconds: MAX_LOCK_TTL_SECONDS + 1,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.lock_ttl_seconds"
        );
    }

    #[test]
    fn test_cache_config_default_ttl_upper_bound() {
        let config = CacheConfig {
            default_ttl_seconds: MAX_TTL_SECONDS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = CacheConfig {
            default_ttl_seconds: MAX_TTL_SECONDS + 1,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.default_ttl_seconds"
        );
    }

    #[test]
    fn test_cache_config_empty_obfuscation_key() {
        let config = CacheConfig {
            obfuscation_key: String::new(),
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.obfuscation_key"
        );
    }

    #[test]
    fn test_cache_config_zero_operation_timeout() {
        let config = CacheConfig {
            operation_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.operation_timeout_ms"
        );
    }

    #[test]
    fn test_redis_url_scheme_only_checked_for_redis_backend() {
        let mut config = CacheConfig::default();
        config.redis.url = "http://localhost".to_string();
        assert!(config.validate().is_ok());

        config.backend = CacheBackend::Redis;
        assert_eq!(field_of(config.validate().unwrap_err()), "cache.redis.url");
    }

    #[test]
    fn test_redis_tls_requires_rediss_scheme() {
        let mut config = CacheConfig {
            backend: CacheBackend::Redis,
            ..Default::default()
        };
        config.redis.tls_enabled = true;
        assert_eq!(field_of(config.validate().unwrap_err()), "cache.redis.url");

        config.redis.url = "rediss://cache.internal:6380".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_redis_zero_pool_size() {
        let mut config = CacheConfig {
            backend: CacheBackend::Redis,
            ..Default::default()
        };
        config.redis.pool_size = 0;
        assert_eq!(
            field_of(config.validate().unwrap_err()),
            "cache.redis.pool_size"
        );
    }

    #[test]
    fn test_settings_validate_default() {
        assert!(Settings::default().validate().is_ok());
        assert!(
            Settings::default()
                .validate_for(Environment::Development)
                .is_ok()
        );
    }

    #[test]
    fn test_production_refuses_default_obfuscation_key() {
        let settings = Settings::default();
        assert_eq!(
            field_of(settings.validate_for(Environment::Production).unwrap_err()),
            "cache.obfuscation_key"
        );

        let mut settings = Settings::default();
        settings.cache.obfuscation_key = "a-real-deployment-key".to_string();
        assert!(settings.validate_for(Environment::Production).is_ok());
    }

    #[test]
    fn test_staging_accepts_default_obfuscation_key() {
        assert!(
            Settings::default()
                .validate_for(Environment::Staging)
                .is_ok()
        );
    }
}
