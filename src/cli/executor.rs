//! Command executor for dispatching CLI commands

use super::handlers::{CheckCacheCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, settings::Settings};
use crate::error::AppResult;

/// What the caller should do once a command has run.
#[derive(Debug, PartialEq)]
pub enum Execution {
    /// The command finished; exit.
    Completed,
    /// Start the HTTP server with these settings.
    Serve(Settings),
}

/// Dispatch the parsed command. No command means `serve`.
///
/// # Errors
/// Returns errors from the command handlers.
pub async fn execute_command(
    cli: &Cli,
    settings: Settings,
    environment: Environment,
) -> AppResult<Execution> {
    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings, environment)
                .dry_run()
                .await?;
            Ok(Execution::Completed)
        }
        Some(Commands::Serve { host, port, .. }) => {
            warn_privileged_bind(host.as_deref(), *port);
            Ok(Execution::Serve(settings))
        }
        None => Ok(Execution::Serve(settings)),
        Some(Commands::CheckCache) => {
            CheckCacheCommandHandler::new(settings).execute().await?;
            Ok(Execution::Completed)
        }
    }
}

fn warn_privileged_bind(host: Option<&str>, port: Option<u16>) {
    if let (Some(host), Some(port)) = (host, port)
        && port < 1024
        && host == "0.0.0.0"
    {
        tracing::warn!(host, port, "Binding to a privileged port usually requires root");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["intellecty-retail"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let result = execute_command(
            &parse(&["serve", "--dry-run"]),
            Settings::default(),
            Environment::Development,
        )
        .await;
        assert_eq!(result.unwrap(), Execution::Completed);
    }

    #[tokio::test]
    async fn test_execute_serve_hands_back_settings() {
        let mut settings = Settings::default();
        settings.server.port = 8080;

        let result = execute_command(&parse(&["serve"]), settings.clone(), Environment::Development)
            .await
            .unwrap();
        assert_eq!(result, Execution::Serve(settings));
    }

    #[tokio::test]
    async fn test_execute_defaults_to_serve() {
        let result = execute_command(&parse(&[]), Settings::default(), Environment::Development)
            .await
            .unwrap();
        assert!(matches!(result, Execution::Serve(_)));
    }

    #[tokio::test]
    async fn test_execute_check_cache_memory() {
        let result = execute_command(
            &parse(&["check-cache"]),
            Settings::default(),
            Environment::Development,
        )
        .await;
        assert_eq!(result.unwrap(), Execution::Completed);
    }

    #[tokio::test]
    async fn test_execute_dry_run_reports_invalid_config() {
        let mut settings = Settings::default();
        settings.cache.lock_ttl_seconds = 0;

        let result = execute_command(
            &parse(&["serve", "--dry-run"]),
            settings,
            Environment::Development,
        )
        .await;
        assert!(result.is_err());
    }
}
