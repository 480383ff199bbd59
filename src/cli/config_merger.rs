//! Configuration merger for CLI arguments and config files
//!
//! Precedence, lowest first: configuration files, `INTELLECTY_*` environment
//! variables, global CLI flags, command flags. Validation runs once, after
//! every layer has been applied.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Environment, settings::Settings};
use std::path::Path;

/// Applies CLI overrides on top of file and environment configuration.
pub struct ConfigurationMerger {
    base_config: Settings,
    environment: Environment,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings, environment: Environment) -> Self {
        Self {
            base_config,
            environment,
        }
    }

    /// Load the unvalidated base configuration.
    ///
    /// `config_path` replaces layered loading with a single file; `environment`
    /// overrides `INTELLECTY_APP_ENV`.
    ///
    /// # Errors
    /// Returns ConfigError if the loader cannot be built or the files cannot
    /// be read or parsed.
    pub fn load(
        config_path: Option<&Path>,
        environment: Option<Environment>,
    ) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(path) = config_path {
            loader = loader.with_config_file(path);
        }
        if let Some(environment) = environment {
            loader = loader.with_environment(environment);
        }

        let environment = loader.environment();
        Ok(Self::new(loader.load_unvalidated()?, environment))
    }

    /// Load the base configuration selected by the global CLI flags.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load(cli.config.as_deref(), cli.env.map(Environment::from))
    }

    /// Apply CLI overrides and validate the result for the active environment.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        Self::apply_global_overrides(&mut config, cli);
        if let Some(ref command) = cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate_for(self.environment)?;
        Ok(config)
    }

    fn apply_global_overrides(config: &mut Settings, cli: &Cli) {
        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                log_level,
                dry_run: _,
            } => {
                if let Some(host_addr) = host {
                    config.server.host = host_addr.clone();
                }
                if let Some(port_num) = port {
                    config.server.port = *port_num;
                }
                // Wins over --verbose/--quiet
                if let Some(level) = log_level {
                    config.logger.level = (*level).into();
                }
            }
            Commands::CheckCache => {}
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::tests::{EnvGuard, TEST_MUTEX};
    use crate::config::settings::CacheBackend;
    use clap::Parser;
    use std::io::Write;

    fn merger() -> ConfigurationMerger {
        ConfigurationMerger::new(Settings::default(), Environment::Development)
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["intellecty-retail"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn clear_loader_env(env: &mut EnvGuard) {
        env.remove("INTELLECTY_CONFIG_DIR");
        env.remove("INTELLECTY_CONFIG_FILE");
        env.remove("INTELLECTY_APP_ENV");
        env.remove("INTELLECTY_SERVER__PORT");
    }

    #[test]
    fn test_merge_without_overrides_keeps_base() {
        let merged = merger().merge_cli_args(&parse(&[])).unwrap();
        assert_eq!(&merged, merger().config());
    }

    #[test]
    fn test_merge_verbose_flag() {
        let merged = merger().merge_cli_args(&parse(&["--verbose"])).unwrap();
        assert_eq!(merged.logger.level, "debug");
    }

    #[test]
    fn test_merge_quiet_flag() {
        let merged = merger().merge_cli_args(&parse(&["--quiet"])).unwrap();
        assert_eq!(merged.logger.level, "error");
    }

    #[test]
    fn test_merge_serve_host_and_port() {
        let cli = parse(&["serve", "--host", "0.0.0.0", "--port", "8080"]);
        let merged = merger().merge_cli_args(&cli).unwrap();

        assert_eq!(merged.server.host, "0.0.0.0");
        assert_eq!(merged.server.port, 8080);
    }

    #[test]
    fn test_command_log_level_overrides_global() {
        let cli = parse(&["--verbose", "serve", "--log-level", "warn"]);
        let merged = merger().merge_cli_args(&cli).unwrap();
        assert_eq!(merged.logger.level, "warn");
    }

    #[test]
    fn test_check_cache_leaves_server_untouched() {
        let merged = merger().merge_cli_args(&parse(&["check-cache"])).unwrap();
        assert_eq!(merged.server, Settings::default().server);
    }

    #[test]
    fn test_merge_validates_for_environment() {
        let production = ConfigurationMerger::new(Settings::default(), Environment::Production);
        let err = production.merge_cli_args(&parse(&["serve"])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "cache.obfuscation_key"
        ));
    }

    #[test]
    fn test_merge_rejects_invalid_result() {
        let mut base = Settings::default();
        base.cache.default_ttl_seconds = 0;
        let merger = ConfigurationMerger::new(base, Environment::Development);

        assert!(merger.merge_cli_args(&parse(&[])).is_err());
    }

    #[test]
    fn test_load_from_single_file_with_env_override() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        clear_loader_env(&mut env);

        let file = config_file(
            r#"
[server]
port = 4100

[cache]
backend = "memory"
default_ttl_seconds = 120
"#,
        );

        let merger = ConfigurationMerger::load(Some(file.path()), Some(Environment::Staging))
            .expect("config file should load");
        assert_eq!(merger.environment(), Environment::Staging);
        assert_eq!(merger.config().server.port, 4100);
        assert_eq!(merger.config().cache.backend, CacheBackend::Memory);
        assert_eq!(merger.config().cache.default_ttl_seconds, 120);

        env.set("INTELLECTY_SERVER__PORT", "4200");
        let merger = ConfigurationMerger::load(Some(file.path()), None).unwrap();
        assert_eq!(merger.config().server.port, 4200);
        assert_eq!(merger.environment(), Environment::Development);

        let cli = parse(&["serve", "--port", "4300"]);
        assert_eq!(merger.merge_cli_args(&cli).unwrap().server.port, 4300);
    }

    #[test]
    fn test_load_fails_on_unparseable_file() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        clear_loader_env(&mut env);

        let file = config_file("[server\nport = ");
        assert!(ConfigurationMerger::load(Some(file.path()), None).is_err());
    }
}
