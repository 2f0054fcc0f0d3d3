// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Cascade run command
//!
//! Exactly one of `--dry-run` or `--execute` is required; clap rejects
//! neither or both before any configuration is read.

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, warn};

use cascade_core::application::{create_repositories, CascadeOrchestrator};
use cascade_core::domain::cascade::{CascadeMode, CascadeStats};
use cascade_core::domain::cascade_config::CascadeConfig;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["dry_run", "execute"])))]
pub struct RunArgs {
    /// Simulate without modifying data (recommended first)
    #[arg(long)]
    pub dry_run: bool,

    /// Apply the changes
    #[arg(long)]
    pub execute: bool,

    /// Print the statistics as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn mode(&self) -> CascadeMode {
        CascadeMode::from_flags(self.dry_run)
    }
}

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = CascadeConfig::load(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let mode = args.mode();
    if mode.is_dry_run() {
        info!("[DRY RUN] Simulation mode, no changes will be made");
    } else {
        warn!("[EXECUTE] Execution mode, changes will be applied");
    }

    let backend = config.storage_backend()?;
    let repositories = create_repositories(&backend, &config.collections)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to MongoDB at {}",
                config.masked_uri().unwrap_or_default()
            )
        })?;

    let stats = CascadeOrchestrator::new(repositories)
        .run(mode)
        .await
        .context("Cascade aborted")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", render_summary(&stats, mode));
    }

    Ok(())
}

pub fn render_summary(stats: &CascadeStats, mode: CascadeMode) -> String {
    let rule = "=".repeat(60);
    let title = if mode.is_dry_run() {
        "OPERATION SUMMARY (DRY RUN)"
    } else {
        "OPERATION SUMMARY (EXECUTED)"
    };

    let mut lines = vec![
        rule.clone(),
        title.bold().to_string(),
        rule.clone(),
        format!("Deleted screenplays found:           {}", stats.screenplays_deleted),
        format!("Conversations marked deleted:        {}", stats.conversations_updated),
        format!(
            "Agent instances (via conversations): {}",
            stats.agent_instances_from_conversations
        ),
        format!(
            "Agent instances (via screenplay_id): {}",
            stats.agent_instances_from_screenplays
        ),
        rule,
        format!(
            "TOTAL agent instances affected: {}",
            stats.total_instances_affected().to_string().bold()
        ),
    ];

    if stats.documents_skipped > 0 {
        lines.push(
            format!("Documents skipped (unreadable): {}", stats.documents_skipped)
                .yellow()
                .to_string(),
        );
    }

    if mode.is_dry_run() {
        lines.push(
            "To apply these changes, run again with --execute"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_totals_and_dry_run_hint() {
        colored::control::set_override(false);
        let stats = CascadeStats {
            screenplays_deleted: 1,
            conversations_updated: 1,
            agent_instances_from_conversations: 2,
            agent_instances_from_screenplays: 1,
            documents_skipped: 0,
        };

        let summary = render_summary(&stats, CascadeMode::DryRun);

        assert!(summary.contains("(DRY RUN)"));
        assert!(summary.contains("TOTAL agent instances affected: 3"));
        assert!(summary.contains("--execute"));
        assert!(!summary.contains("skipped"));
    }

    #[test]
    fn summary_flags_skipped_documents() {
        colored::control::set_override(false);
        let stats = CascadeStats {
            documents_skipped: 2,
            ..CascadeStats::default()
        };

        let summary = render_summary(&stats, CascadeMode::Execute);

        assert!(summary.contains("(EXECUTED)"));
        assert!(summary.contains("Documents skipped (unreadable): 2"));
        assert!(!summary.contains("--execute"));
    }
}
