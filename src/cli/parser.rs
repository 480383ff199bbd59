//! CLI argument parsing with clap
//!
//! Defines the command-line interface: global flags, the `serve` command
//! (the default) and `check-cache`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Multi-tenant retail analytics service with a shared tenant cache
#[derive(Parser, Debug)]
#[command(name = "intellecty-retail")]
#[command(about = "Multi-tenant retail analytics service with a shared tenant cache")]
#[command(long_about = "
Intellecty Retail serves inventory analytics (ABC classification and demand
forecasts) over a JSON API. Results are kept in a tenant-scoped cache backed
by Redis or process memory.

EXAMPLES:
    # Start the server with default configuration
    intellecty-retail serve

    # Start server on custom host and port
    intellecty-retail serve --host 0.0.0.0 --port 8080

    # Use a single configuration file
    intellecty-retail --config /etc/intellecty/production.toml serve

    # Load the staging layer with verbose logging
    intellecty-retail --env staging --verbose serve

    # Check configuration without starting the server
    intellecty-retail serve --dry-run

    # Verify the cache backend is reachable and writable
    intellecty-retail check-cache
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// Environment variables prefixed with `INTELLECTY_` still apply on top.
    ///
    /// Example: --config /etc/intellecty/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects the configuration layer and the validation rules applied to it.
    /// Takes precedence over `INTELLECTY_APP_ENV`.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Connects the tenant cache, binds to the configured address and serves
    /// the API until Ctrl+C or SIGTERM.
    ///
    /// Examples:
    ///   intellecty-retail serve                           # Start with defaults
    ///   intellecty-retail serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   intellecty-retail serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Use 127.0.0.1 for localhost only, or 0.0.0.0 to accept connections
        /// from any interface.
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on (1-65535)
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Takes precedence over the configuration file and over the global
        /// --verbose/--quiet flags.
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        ///
        /// Returns exit code 0 if the configuration is valid, non-zero otherwise.
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that the cache backend is reachable
    ///
    /// Connects with the configured backend, pings it and runs a
    /// write/read/delete round trip under the system tenant.
    CheckCache,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Hints printed after a configuration or argument error.
    pub fn get_validation_help() -> &'static str {
        r#"
Common validation errors and solutions:

Port validation:
  - Port must be between 1 and 65535
  - Ports below 1024 require root privileges on most systems
  - Example: --port 8080

Host validation:
  - Use 'localhost' or '127.0.0.1' for local access only
  - Use '0.0.0.0' to accept connections from any interface
  - Example: --host 0.0.0.0

Configuration file validation:
  - File must exist and be readable
  - File must be in TOML format
  - Example: --config /path/to/config.toml

Cache validation:
  - cache.backend must be 'memory' or 'redis'
  - production refuses the built-in cache.obfuscation_key
  - Example: INTELLECTY_CACHE__OBFUSCATION_KEY=... intellecty-retail serve

For more help, use: intellecty-retail help <subcommand>
"#
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
