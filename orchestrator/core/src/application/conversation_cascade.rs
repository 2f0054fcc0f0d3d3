// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Conversation Cascader
//!
//! Marks the live conversations of deleted screenplays and harvests the
//! instance ids of their participants for the next cascade step.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Screenplay → Conversation propagation

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::domain::cascade::{CascadeAudit, CascadeMode, CascadeReason};
use crate::domain::entity::{InstanceId, ScreenplayId};
use crate::domain::repository::{ConversationRepository, RepositoryError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationCascadeOutcome {
    /// Conversations matched (and, in execute mode, marked)
    pub conversation_count: u64,
    /// Union of participant instance ids across all matched conversations
    pub instance_ids: BTreeSet<InstanceId>,
    pub skipped: u64,
}

pub struct ConversationCascader {
    conversations: Arc<dyn ConversationRepository>,
}

impl ConversationCascader {
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self { conversations }
    }

    pub async fn cascade(
        &self,
        screenplay_ids: &[ScreenplayId],
        mode: CascadeMode,
    ) -> Result<ConversationCascadeOutcome, RepositoryError> {
        if screenplay_ids.is_empty() {
            return Ok(ConversationCascadeOutcome::default());
        }

        let batch = self
            .conversations
            .find_undeleted_by_screenplays(screenplay_ids)
            .await?;
        info!(conversation_count = batch.len(), "Found conversations to mark as deleted");

        let mut instance_ids = BTreeSet::new();
        for conversation in &batch.items {
            instance_ids.extend(conversation.participant_instance_ids().cloned());

            if mode.is_dry_run() {
                info!(
                    conversation_id = ?conversation.conversation_id,
                    screenplay_id = ?conversation.screenplay_id,
                    participants = conversation.participants.len(),
                    "[DRY RUN] Conversation"
                );
            }
        }

        if !mode.is_dry_run() && !batch.is_empty() {
            let keys: Vec<_> = batch.items.iter().map(|c| c.key.clone()).collect();
            let audit = CascadeAudit::now(CascadeReason::ScreenplayDeleted);
            let modified = self.conversations.mark_deleted(&keys, &audit).await?;

            metrics::counter!(
                "cascade_documents_marked_total",
                "collection" => "conversations",
                "reason" => audit.reason.as_str()
            )
            .increment(modified);
            info!(modified, "Conversations updated");
        }

        Ok(ConversationCascadeOutcome {
            conversation_count: batch.len() as u64,
            instance_ids,
            skipped: batch.skipped,
        })
    }
}
