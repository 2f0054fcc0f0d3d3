// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Conductor Cascade CLI
//!
//! The `conductor-cascade` binary propagates screenplay soft deletes to
//! conversations and agent instances, and verifies the instance deletion API.
//!
//! ## Commands
//!
//! - `conductor-cascade run --dry-run|--execute [--json]` - Run the cascade
//! - `conductor-cascade verify [--base-url URL]` - End-to-end deletion API checks
//! - `conductor-cascade config show|validate` - Configuration management
//!
//! The nearest `.env.centralized` (falling back to `.env`) in the working
//! directory or one of its parents is loaded before arguments are parsed;
//! variables already present in the process environment are never
//! overwritten.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use conductor_cascade::commands::{self, ConfigCommand, RunArgs, VerifyArgs};
use conductor_cascade::env_files;

/// Conductor soft-delete cascade
#[derive(Parser)]
#[command(name = "conductor-cascade")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "CASCADE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "CASCADE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propagate screenplay soft deletes to conversations and agent instances
    #[command(name = "run")]
    Run(RunArgs),

    /// Verify the instance deletion API end-to-end
    #[command(name = "verify")]
    Verify(VerifyArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so env files feed RUST_LOG and the clap env fallbacks
    let env_file = std::env::current_dir()
        .ok()
        .and_then(|dir| env_files::load_nearest(&dir));

    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level)?;
    match env_file {
        Some(path) => info!("Loaded environment from {}", path.display()),
        None => debug!("No environment file found"),
    }

    match cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.config).await,
        Commands::Verify(args) => commands::verify::execute(args, cli.config).await,
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_requires_a_mode() {
        let err = Cli::try_parse_from(["conductor-cascade", "run"]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn run_rejects_both_modes() {
        let err = Cli::try_parse_from(["conductor-cascade", "run", "--dry-run", "--execute"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn run_accepts_dry_run_with_json() {
        let cli = Cli::try_parse_from(["conductor-cascade", "run", "--dry-run", "--json"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert!(args.dry_run);
                assert!(!args.execute);
                assert!(args.json);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn env_file_values_feed_clap_fallbacks() {
        let root = tempfile::tempdir().unwrap();
        let config_path = root.path().join("cascade.yaml");
        std::fs::write(
            root.path().join(".env.centralized"),
            format!("CASCADE_CONFIG_PATH={}\n", config_path.display()),
        )
        .unwrap();

        assert!(env_files::load_nearest(root.path()).is_some());
        let cli = Cli::try_parse_from(["conductor-cascade", "config", "show"]).unwrap();
        assert_eq!(cli.config, Some(config_path));
    }

    #[test]
    fn verify_takes_base_url_override() {
        let cli = Cli::try_parse_from([
            "conductor-cascade",
            "verify",
            "--base-url",
            "http://backend:8000",
        ])
        .unwrap();
        match cli.command {
            Commands::Verify(args) => {
                assert_eq!(args.base_url.as_deref(), Some("http://backend:8000"))
            }
            _ => panic!("expected verify command"),
        }
    }
}
