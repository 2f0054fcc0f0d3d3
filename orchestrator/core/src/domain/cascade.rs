// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Cascade Value Objects
//!
//! Audit record, run mode and run statistics shared by the cascaders and the
//! orchestrator.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a document was marked deleted by the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeReason {
    ScreenplayDeleted,
    ConversationDeleted,
}

impl CascadeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CascadeReason::ScreenplayDeleted => "screenplay_deleted",
            CascadeReason::ConversationDeleted => "conversation_deleted",
        }
    }
}

impl fmt::Display for CascadeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `_cascadeDelete` sub-document written next to `isDeleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeAudit {
    pub reason: CascadeReason,
    #[serde(rename = "deletedAt")]
    pub deleted_at: String,
}

impl CascadeAudit {
    pub fn new(reason: CascadeReason, at: DateTime<Utc>) -> Self {
        Self {
            reason,
            deleted_at: iso_timestamp(at),
        }
    }

    pub fn now(reason: CascadeReason) -> Self {
        Self::new(reason, Utc::now())
    }
}

/// ISO-8601 UTC with microsecond precision, e.g. `2025-01-10T12:00:00.000000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Run every read query and report, issue no writes
    DryRun,
    Execute,
}

impl CascadeMode {
    pub fn from_flags(dry_run: bool) -> Self {
        if dry_run {
            CascadeMode::DryRun
        } else {
            CascadeMode::Execute
        }
    }

    pub fn is_dry_run(self) -> bool {
        matches!(self, CascadeMode::DryRun)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CascadeMode::DryRun => "dry_run",
            CascadeMode::Execute => "execute",
        }
    }
}

/// The routes by which an agent instance can be reached from a deleted screenplay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancePath {
    ViaConversations,
    ViaScreenplayLink,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeStats {
    pub screenplays_deleted: u64,
    pub conversations_updated: u64,
    pub agent_instances_from_conversations: u64,
    pub agent_instances_from_screenplays: u64,
    #[serde(default)]
    pub documents_skipped: u64,
}

impl CascadeStats {
    pub fn record_instances(&mut self, path: InstancePath, count: u64) {
        match path {
            InstancePath::ViaConversations => self.agent_instances_from_conversations += count,
            InstancePath::ViaScreenplayLink => self.agent_instances_from_screenplays += count,
        }
    }

    pub fn total_instances_affected(&self) -> u64 {
        self.agent_instances_from_conversations + self.agent_instances_from_screenplays
    }

    /// True when a run found nothing left to mark.
    pub fn is_noop(&self) -> bool {
        self.conversations_updated == 0 && self.total_instances_affected() == 0
    }
}
