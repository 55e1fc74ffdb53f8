use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared across all query-assist commands
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Commands every query-assist binary understands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CommonCommands {
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};
    use tracing_subscriber::EnvFilter;

    /// Log level selected by the verbosity flags
    pub fn log_level(args: &CommonArgs) -> &'static str {
        if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        }
    }

    /// Initialize logging based on CLI arguments, an explicit `RUST_LOG` takes precedence
    pub fn init_logging(args: &CommonArgs) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level(args)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Load configuration with optional override from CLI.
    ///
    /// The result is not validated, commands that talk to Tempo call
    /// [`Configuration::validate`] themselves.
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")?
            }
            None => Configuration::load().context("Failed to load configuration")?,
        };
        Ok(config)
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("query-assist configuration:");
            println!("===========================");
            if config.tempo.enabled {
                println!("Tempo URL: {}", config.tempo.url);
                println!("Tempo timeout: {:?}", config.tempo.timeout);
            } else {
                println!("Tempo: disabled");
            }

            match config.completion.limit {
                Some(limit) => println!("Completion limit: {limit}"),
                None => println!("Completion limit: server default"),
            }
            if let Some(max_stale_values) = config.completion.max_stale_values {
                println!("Completion max stale values: {max_stale_values}");
            }
            println!("Completion lookback: {:?}", config.completion.lookback);

            println!("Pretty print: {}", config.format.pretty);
        }
        Ok(())
    }

    /// Run a common command; `version` is the calling binary's version line
    pub fn handle_common_command(
        command: &CommonCommands,
        config: &Configuration,
        version: &str,
    ) -> Result<()> {
        match command {
            CommonCommands::Config { json } => display_config(config, *json),
            CommonCommands::Validate => {
                config.validate().context("Invalid configuration")?;
                println!("Configuration is valid");
                Ok(())
            }
            CommonCommands::Version => {
                println!("{version}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_flags() {
        let mut args = CommonArgs::default();
        assert_eq!(utils::log_level(&args), "info");

        args.verbose = true;
        assert_eq!(utils::log_level(&args), "debug");

        // quiet wins over verbose
        args.quiet = true;
        assert_eq!(utils::log_level(&args), "warn");
    }

    #[test]
    fn test_load_config_leaves_validation_to_commands() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("QUERY_ASSIST__TEMPO__URL", "not a url");

            let config = utils::load_config(None).map_err(|e| e.to_string())?;
            assert_eq!(config.tempo.url, "not a url");
            assert!(config.validate().is_err());

            let err = utils::handle_common_command(&CommonCommands::Validate, &config, "test")
                .unwrap_err();
            assert!(format!("{err:#}").contains("Invalid Tempo URL"), "{err:#}");
            Ok(())
        });
    }
}
