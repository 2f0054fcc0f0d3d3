// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Instance Cascader
//!
//! Marks live agent instances deleted. Two entry points share a single
//! marking primitive:
//!
//! - by instance id, for instances reached through conversation participants
//!   (`reason = conversation_deleted`)
//! - by screenplay id, for instances linked directly to a deleted screenplay
//!   (`reason = screenplay_deleted`)
//!
//! Each reach path is also exposed as an [`InstanceCascadeStrategy`] so the
//! orchestrator can run them as an ordered list.
//!
//! A cascader is scoped to one orchestrator run: it remembers which documents
//! it already claimed, so an instance reachable by both paths is counted
//! once in dry runs exactly as it is marked once in execute runs.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Conversation/Screenplay → AgentInstance propagation

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use crate::domain::cascade::{CascadeAudit, CascadeMode, CascadeReason, InstancePath};
use crate::domain::entity::{AgentInstance, DocumentKey, InstanceId, ScreenplayId};
use crate::domain::repository::{AgentInstanceRepository, DocumentBatch, RepositoryError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceCascadeOutcome {
    pub affected: u64,
    pub skipped: u64,
}

pub struct InstanceCascader {
    instances: Arc<dyn AgentInstanceRepository>,
    claimed: Mutex<HashSet<DocumentKey>>,
}

impl InstanceCascader {
    pub fn new(instances: Arc<dyn AgentInstanceRepository>) -> Self {
        Self {
            instances,
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Drop instances an earlier entry point of this run already claimed.
    fn claim(&self, mut batch: DocumentBatch<AgentInstance>) -> DocumentBatch<AgentInstance> {
        let mut claimed = self.claimed.lock();
        batch.items.retain(|instance| claimed.insert(instance.key.clone()));
        batch
    }

    pub async fn cascade_by_instance_ids(
        &self,
        instance_ids: &[InstanceId],
        mode: CascadeMode,
    ) -> Result<InstanceCascadeOutcome, RepositoryError> {
        if instance_ids.is_empty() {
            info!("No agent instances to update");
            return Ok(InstanceCascadeOutcome::default());
        }

        let batch = self.claim(
            self.instances
                .find_undeleted_by_instance_ids(instance_ids)
                .await?,
        );
        info!(instance_count = batch.len(), "Found agent instances to mark as deleted");

        self.mark(batch, CascadeReason::ConversationDeleted, mode).await
    }

    pub async fn cascade_by_screenplay_ids(
        &self,
        screenplay_ids: &[ScreenplayId],
        mode: CascadeMode,
    ) -> Result<InstanceCascadeOutcome, RepositoryError> {
        if screenplay_ids.is_empty() {
            return Ok(InstanceCascadeOutcome::default());
        }

        let batch = self.claim(
            self.instances
                .find_undeleted_by_screenplays(screenplay_ids)
                .await?,
        );
        info!(
            instance_count = batch.len(),
            "Found agent instances linked directly to deleted screenplays"
        );

        self.mark(batch, CascadeReason::ScreenplayDeleted, mode).await
    }

    /// The count reported is the number of live instances matched, so dry
    /// runs and execute runs report the same figure.
    async fn mark(
        &self,
        batch: DocumentBatch<AgentInstance>,
        reason: CascadeReason,
        mode: CascadeMode,
    ) -> Result<InstanceCascadeOutcome, RepositoryError> {
        let outcome = InstanceCascadeOutcome {
            affected: batch.len() as u64,
            skipped: batch.skipped,
        };

        if mode.is_dry_run() {
            for instance in &batch.items {
                info!(
                    instance_id = ?instance.instance_id,
                    agent_id = ?instance.agent_id,
                    screenplay_id = ?instance.screenplay_id,
                    reason = %reason,
                    "[DRY RUN] Agent instance"
                );
            }
            return Ok(outcome);
        }

        if batch.is_empty() {
            return Ok(outcome);
        }

        let keys: Vec<_> = batch.items.iter().map(|i| i.key.clone()).collect();
        let audit = CascadeAudit::now(reason);
        let modified = self.instances.mark_deleted(&keys, &audit).await?;

        metrics::counter!(
            "cascade_documents_marked_total",
            "collection" => "agent_instances",
            "reason" => reason.as_str()
        )
        .increment(modified);
        info!(modified, reason = %reason, "Agent instances updated");

        Ok(outcome)
    }
}

/// Inputs available to every instance strategy after the conversation step.
#[derive(Debug, Clone, Default)]
pub struct CascadeContext {
    pub screenplay_ids: Vec<ScreenplayId>,
    /// Participant instance ids harvested from cascaded conversations
    pub instance_ids: Vec<InstanceId>,
}

/// One rule by which an agent instance is reached from a deleted screenplay.
#[async_trait]
pub trait InstanceCascadeStrategy: Send + Sync {
    fn path(&self) -> InstancePath;

    async fn apply(
        &self,
        cascader: &InstanceCascader,
        context: &CascadeContext,
        mode: CascadeMode,
    ) -> Result<InstanceCascadeOutcome, RepositoryError>;
}

/// Instances that took part in a cascaded conversation.
pub struct ViaConversationParticipants;

#[async_trait]
impl InstanceCascadeStrategy for ViaConversationParticipants {
    fn path(&self) -> InstancePath {
        InstancePath::ViaConversations
    }

    async fn apply(
        &self,
        cascader: &InstanceCascader,
        context: &CascadeContext,
        mode: CascadeMode,
    ) -> Result<InstanceCascadeOutcome, RepositoryError> {
        cascader.cascade_by_instance_ids(&context.instance_ids, mode).await
    }
}

/// Instances whose own `screenplay_id` points at a deleted screenplay,
/// whether or not they appear in any conversation.
pub struct ViaScreenplayLink;

#[async_trait]
impl InstanceCascadeStrategy for ViaScreenplayLink {
    fn path(&self) -> InstancePath {
        InstancePath::ViaScreenplayLink
    }

    async fn apply(
        &self,
        cascader: &InstanceCascader,
        context: &CascadeContext,
        mode: CascadeMode,
    ) -> Result<InstanceCascadeOutcome, RepositoryError> {
        cascader.cascade_by_screenplay_ids(&context.screenplay_ids, mode).await
    }
}

/// Strategies in the order the orchestrator runs them.
pub fn default_strategies() -> Vec<Box<dyn InstanceCascadeStrategy>> {
    vec![Box::new(ViaConversationParticipants), Box::new(ViaScreenplayLink)]
}
