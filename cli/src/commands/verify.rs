// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deletion API verification command

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use cascade_core::application::verification::{CheckOutcome, VerificationReport};
use cascade_core::application::VerificationHarness;
use cascade_core::domain::cascade_config::CascadeConfig;
use cascade_core::infrastructure::HttpInstanceApi;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Backend base URL (overrides api.base_url)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: VerifyArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut config = CascadeConfig::load(config_path).context("Failed to load configuration")?;
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    config.validate_api().context("Configuration validation failed")?;

    let api = HttpInstanceApi::new(&config.api)?;
    let report = VerificationHarness::new(Arc::new(api))
        .run()
        .await
        .with_context(|| {
            format!(
                "Cannot reach {}. Make sure the backend server is running",
                config.api.base_url
            )
        })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_report(&report));
    }

    if !report.all_passed() {
        anyhow::bail!(
            "{} of {} scenarios failed",
            report.total() - report.passed_count(),
            report.total()
        );
    }

    Ok(())
}

pub fn render_report(report: &VerificationReport) -> String {
    let rule = "=".repeat(60);
    let mut lines = Vec::new();

    for scenario in &report.scenarios {
        lines.push(String::new());
        lines.push(scenario.name.bold().to_string());
        for check in &scenario.checks {
            lines.push(match &check.outcome {
                CheckOutcome::Passed => format!("  {} - {}", "PASSED".green(), check.description),
                CheckOutcome::Failed(detail) => format!(
                    "  {} - {}\n    Details: {}",
                    "FAILED".red(),
                    check.description,
                    detail
                ),
                CheckOutcome::Skipped(reason) => format!(
                    "  {} - {} ({})",
                    "SKIPPED".yellow(),
                    check.description,
                    reason
                ),
            });
        }
    }

    lines.push(String::new());
    lines.push(rule.clone());
    lines.push(format!("  {}", report));
    lines.push(rule);

    lines.join("\n")
}
