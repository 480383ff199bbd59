//! Serve command handler
//!
//! Only `--dry-run` is handled here; a real start is left to the caller so
//! the server owns the runtime for its whole lifetime.

use crate::config::{Environment, settings::Settings};
use crate::error::AppResult;

pub struct ServeCommandHandler {
    config: Settings,
    environment: Environment,
}

impl ServeCommandHandler {
    pub fn new(config: Settings, environment: Environment) -> Self {
        Self {
            config,
            environment,
        }
    }

    /// Validate the configuration and print what the server would do.
    ///
    /// No connection to the cache backend is attempted; `check-cache` does
    /// that.
    ///
    /// # Errors
    /// Returns the first configuration validation error.
    pub async fn dry_run(&self) -> AppResult<()> {
        self.config.validate_for(self.environment)?;

        println!("✓ Configuration is valid for {}", self.environment.as_str());
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!(
            "✓ Request timeout: {}s",
            self.config.server.request_timeout
        );
        println!(
            "✓ Cache backend: {} (default TTL {}s, lock TTL {}s)",
            self.config.cache.backend.as_str(),
            self.config.cache.default_ttl_seconds,
            self.config.cache.lock_ttl_seconds
        );
        println!("✓ Logger level: {}", self.config.logger.level);

        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
