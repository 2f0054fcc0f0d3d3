// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use cascade_core::domain::cascade_config::{
    CascadeConfig, API_BASE_URL_VAR, CONFIG_PATH_VAR, CONNECTION_STRING_VARS, DATABASE_NAME_VAR,
};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration (credentials masked)
    Show {
        /// Show config file paths and environment variables checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = CascadeConfig::load(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_VAR,
            std::env::var(CONFIG_PATH_VAR)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./cascade-config.yaml");
        println!();
        println!("{}", "Environment overrides:".bold());
        println!("  Connection string: {}", CONNECTION_STRING_VARS.join(", "));
        println!("  Database name: {}", DATABASE_NAME_VAR);
        println!("  API base URL: {}", API_BASE_URL_VAR);
        println!();
    }

    println!("{}", render_config(&config));
    Ok(())
}

pub fn render_config(config: &CascadeConfig) -> String {
    let uri = config
        .masked_uri()
        .unwrap_or_else(|| "(not set)".to_string());

    [
        "Current configuration:".bold().to_string(),
        String::new(),
        "Database:".bold().to_string(),
        format!("  URI: {}", uri),
        format!("  Name: {}", config.database.name),
        format!("  Connect timeout: {}ms", config.database.connect_timeout_ms),
        String::new(),
        "Collections:".bold().to_string(),
        format!("  Screenplays: {}", config.collections.screenplays),
        format!("  Conversations: {}", config.collections.conversations),
        format!("  Agent instances: {}", config.collections.agent_instances),
        String::new(),
        "Deletion API:".bold().to_string(),
        format!("  Base URL: {}", config.api.base_url),
        format!("  Timeout: {}s", config.api.timeout_secs),
    ]
    .join("\n")
}

pub async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = CascadeConfig::load(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}
