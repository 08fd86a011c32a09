//! # Topoplan CLI
//!
//! Command-line interface for topoplan.
//! This crate provides the CLI structure, argument parsing, and command routing.

pub mod commands;
pub mod config;
pub mod display;

// Re-export common types
pub use config::Config;

use clap::{Parser, Subcommand};
use thiserror::Error;

/// Application-level errors for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Plan error: {0}")]
    Plan(#[from] topoplan_core::PlanError),

    #[error("API error: {0}")]
    Api(#[from] topoplan_api::ApiError),

    #[error("Utils error: {0}")]
    Utils(#[from] topoplan_utils::UtilsError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::OperationFailed(format!("Input error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Main CLI struct
#[derive(Parser, Debug)]
#[command(name = "topoplan")]
#[command(about = "Plan and provision multi-tenant deployments behind one load balancer")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive the topology for a deployment file
    Plan(commands::plan::PlanArgs),
    /// Check a deployment file without deriving anything
    Validate(commands::validate::ValidateArgs),
    /// Derive and provision the topology
    Apply(commands::apply::ApplyArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Get configuration value
    Get {
        /// Configuration key, e.g. backend.base_url
        key: String,
    },
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Show configuration file path
    Path,
}

/// Parse the command line and run the chosen command
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new()?;

    match cli.command {
        Commands::Plan(args) => commands::plan::handle(args, &config).await,
        Commands::Validate(args) => commands::validate::handle(args, &config).await,
        Commands::Apply(args) => commands::apply::handle(args, &config).await,
        Commands::Config { action } => commands::config::handle(action, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::plan::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn test_parse_plan() {
        let cli = Cli::try_parse_from(["topoplan", "plan", "-f", "env.toml", "--output", "json"])
            .unwrap();

        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.file, Some(PathBuf::from("env.toml")));
                assert_eq!(args.output, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_plan_defaults() {
        let cli = Cli::try_parse_from(["topoplan", "plan"]).unwrap();

        match cli.command {
            Commands::Plan(args) => {
                assert_eq!(args.file, None);
                assert_eq!(args.output, OutputFormat::Table);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::try_parse_from(["topoplan", "apply", "--dry-run", "-y"]).unwrap();

        match cli.command {
            Commands::Apply(args) => {
                assert!(args.dry_run);
                assert!(args.yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from([
            "topoplan",
            "config",
            "set",
            "backend.base_url",
            "https://provision.example.com",
        ])
        .unwrap();

        match cli.command {
            Commands::Config { action } => assert_eq!(
                action,
                ConfigCommands::Set {
                    key: "backend.base_url".to_string(),
                    value: "https://provision.example.com".to_string(),
                }
            ),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_output() {
        assert!(Cli::try_parse_from(["topoplan", "plan", "--output", "yaml"]).is_err());
    }

    #[test]
    fn test_error_layering() {
        let err: CliError =
            topoplan_core::PlanError::configuration("duplicate subdomain 'a'").into();
        assert_eq!(
            err.to_string(),
            "Plan error: Configuration error: duplicate subdomain 'a'"
        );
    }
}
