//! Command-line interface
//!
//! Argument parsing, merging CLI overrides into the file configuration and
//! dispatching the `serve` and `check-cache` commands.

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::{Execution, execute_command};
pub use parser::{Cli, Commands, Environment, LogLevel};

use crate::config::{self, settings::Settings};
use crate::logger::{LogLevelHandle, init_logger};
use crate::server::Server;
use anyhow::Context;

/// Load the configuration selected by `cli` and apply its overrides.
///
/// # Errors
/// Returns error if loading, merging or validation fails
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<(Settings, config::Environment)> {
    let merger = ConfigurationMerger::from_cli(cli).context("Configuration error")?;
    let settings = merger
        .merge_cli_args(cli)
        .context("Configuration merge error")?;
    Ok((settings, merger.environment()))
}

/// Initialize the global logger from settings.
///
/// # Errors
/// Returns error if the logger configuration is invalid or a global
/// subscriber is already installed
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<LogLevelHandle> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .context("Logger configuration error")?;

    init_logger(logger_config).context("Logger initialization error")
}

/// Run the parsed command line to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let (settings, environment) = load_and_merge_config(&cli).inspect_err(|_| {
        eprintln!("{}", Cli::get_validation_help());
    })?;
    let _log_handle = init_logger_from_settings(&settings)?;

    match execute_command(&cli, settings, environment).await? {
        Execution::Completed => Ok(()),
        Execution::Serve(settings) => Server::new(settings, environment).run().await,
    }
}
