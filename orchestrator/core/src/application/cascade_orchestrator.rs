// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Cascade Orchestrator
//!
//! Runs one linear soft-delete propagation pass:
//!
//! 1. scan screenplays with `isDeleted = true` (none found: all-zero stats)
//! 2. cascade conversations of those screenplays
//! 3. run every registered [`InstanceCascadeStrategy`] in order
//! 4. aggregate [`CascadeStats`]
//!
//! There is no transaction around the steps and no retry. The first store
//! error aborts the run and is returned to the caller; re-running converges
//! to the same final state because every query only matches live documents.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates the Screenplay → Conversation → AgentInstance cascade
//! - **Related:** `conversation_cascade`, `instance_cascade`, `repository_factory`

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::conversation_cascade::ConversationCascader;
use crate::application::instance_cascade::{
    default_strategies, CascadeContext, InstanceCascadeStrategy, InstanceCascader,
};
use crate::application::repository_factory::CascadeRepositories;
use crate::domain::cascade::{CascadeMode, CascadeStats};
use crate::domain::entity::ScreenplayId;
use crate::domain::repository::{AgentInstanceRepository, RepositoryError, ScreenplayRepository};

pub struct CascadeOrchestrator {
    screenplays: Arc<dyn ScreenplayRepository>,
    instances: Arc<dyn AgentInstanceRepository>,
    conversation_cascader: ConversationCascader,
    strategies: Vec<Box<dyn InstanceCascadeStrategy>>,
}

impl CascadeOrchestrator {
    pub fn new(repositories: CascadeRepositories) -> Self {
        Self {
            screenplays: repositories.screenplays,
            instances: repositories.instances,
            conversation_cascader: ConversationCascader::new(repositories.conversations),
            strategies: default_strategies(),
        }
    }

    /// Replace the instance strategies. They run in the given order.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn InstanceCascadeStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub async fn run(&self, mode: CascadeMode) -> Result<CascadeStats, RepositoryError> {
        metrics::counter!("cascade_runs_total", "mode" => mode.as_str()).increment(1);
        info!(mode = mode.as_str(), "Starting soft-delete cascade");

        let mut stats = CascadeStats::default();

        let screenplays = self.screenplays.find_deleted().await?;
        stats.documents_skipped += screenplays.skipped;
        info!(screenplay_count = screenplays.len(), "Found deleted screenplays");

        if screenplays.is_empty() {
            info!("No deleted screenplays found, nothing to cascade");
            log_summary(&stats, mode);
            return Ok(stats);
        }

        let screenplay_ids: Vec<ScreenplayId> =
            screenplays.items.into_iter().map(|s| s.id).collect();
        stats.screenplays_deleted = screenplay_ids.len() as u64;
        info!(screenplay_ids = ?screenplay_ids, "Deleted screenplay ids");

        let conversations = self
            .conversation_cascader
            .cascade(&screenplay_ids, mode)
            .await?;
        stats.conversations_updated = conversations.conversation_count;
        stats.documents_skipped += conversations.skipped;

        let context = CascadeContext {
            screenplay_ids,
            instance_ids: conversations.instance_ids.into_iter().collect(),
        };

        // Fresh per run so claimed-instance tracking never leaks across runs.
        let instance_cascader = InstanceCascader::new(self.instances.clone());
        for strategy in &self.strategies {
            let outcome = strategy.apply(&instance_cascader, &context, mode).await?;
            stats.record_instances(strategy.path(), outcome.affected);
            stats.documents_skipped += outcome.skipped;
        }

        log_summary(&stats, mode);
        Ok(stats)
    }
}

pub fn log_summary(stats: &CascadeStats, mode: CascadeMode) {
    info!(
        mode = mode.as_str(),
        screenplays_deleted = stats.screenplays_deleted,
        conversations_updated = stats.conversations_updated,
        agent_instances_from_conversations = stats.agent_instances_from_conversations,
        agent_instances_from_screenplays = stats.agent_instances_from_screenplays,
        total_instances_affected = stats.total_instances_affected(),
        "Cascade summary"
    );

    if stats.documents_skipped > 0 {
        warn!(
            documents_skipped = stats.documents_skipped,
            "Some stored documents could not be interpreted and were skipped"
        );
    }

    if mode.is_dry_run() {
        info!("[DRY RUN] No changes were made. Run with --execute to apply changes.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::domain::cascade::{CascadeReason, InstancePath};
    use crate::domain::entity::{
        AgentInstance, Conversation, DocumentKey, InstanceId, Participant, Screenplay,
        SoftDeleteFlag,
    };
    use crate::application::instance_cascade::InstanceCascadeOutcome;
    use crate::domain::repository::DocumentBatch;
    use crate::infrastructure::repositories::InMemoryRepositories;

    fn fixture() -> InMemoryRepositories {
        let repos = InMemoryRepositories::default();
        repos.screenplays.insert(Screenplay {
            key: DocumentKey::text("s1"),
            id: ScreenplayId::from("S1"),
            is_deleted: SoftDeleteFlag::DELETED,
        });
        repos.conversations.insert(Conversation {
            key: DocumentKey::text("c1"),
            conversation_id: None,
            screenplay_id: Some(ScreenplayId::from("S1")),
            participants: vec![Participant::instance("I1")],
            is_deleted: SoftDeleteFlag::ABSENT,
            deleted_at: None,
            cascade_delete: None,
        });
        repos.instances.insert(AgentInstance {
            key: DocumentKey::text("i1"),
            instance_id: Some(InstanceId::from("I1")),
            agent_id: None,
            screenplay_id: None,
            is_deleted: SoftDeleteFlag::ABSENT,
            deleted_at: None,
            cascade_delete: None,
        });
        repos
    }

    #[tokio::test]
    async fn no_deleted_screenplays_is_a_noop() {
        let orchestrator = CascadeOrchestrator::new(CascadeRepositories::in_memory());
        let stats = orchestrator.run(CascadeMode::Execute).await.unwrap();
        assert_eq!(stats, CascadeStats::default());
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    struct UndecodableScreenplays;

    #[async_trait]
    impl ScreenplayRepository for UndecodableScreenplays {
        async fn find_deleted(&self) -> Result<DocumentBatch<Screenplay>, RepositoryError> {
            Ok(DocumentBatch {
                items: Vec::new(),
                skipped: 2,
            })
        }
    }

    #[tokio::test]
    async fn noop_run_still_logs_summary_and_skipped_documents() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut wiring = CascadeRepositories::in_memory();
        wiring.screenplays = Arc::new(UndecodableScreenplays);
        let stats = CascadeOrchestrator::new(wiring)
            .run(CascadeMode::DryRun)
            .await
            .unwrap();

        assert_eq!(stats.screenplays_deleted, 0);
        assert_eq!(stats.documents_skipped, 2);

        let output = logs.contents();
        assert!(output.contains("Cascade summary"), "{}", output);
        assert!(output.contains("documents_skipped=2"), "{}", output);
        assert!(output.contains("[DRY RUN]"), "{}", output);
    }

    #[tokio::test]
    async fn runs_every_registered_strategy() {
        struct CountingStrategy;

        #[async_trait]
        impl InstanceCascadeStrategy for CountingStrategy {
            fn path(&self) -> InstancePath {
                InstancePath::ViaScreenplayLink
            }

            async fn apply(
                &self,
                _cascader: &InstanceCascader,
                context: &CascadeContext,
                _mode: CascadeMode,
            ) -> Result<InstanceCascadeOutcome, RepositoryError> {
                Ok(InstanceCascadeOutcome {
                    affected: context.screenplay_ids.len() as u64 * 10,
                    skipped: 1,
                })
            }
        }

        let orchestrator = CascadeOrchestrator::new(CascadeRepositories::from(&fixture()))
            .with_strategies(vec![Box::new(CountingStrategy), Box::new(CountingStrategy)]);
        let stats = orchestrator.run(CascadeMode::DryRun).await.unwrap();

        assert_eq!(stats.screenplays_deleted, 1);
        assert_eq!(stats.conversations_updated, 1);
        assert_eq!(stats.agent_instances_from_conversations, 0);
        assert_eq!(stats.agent_instances_from_screenplays, 20);
        assert_eq!(stats.documents_skipped, 2);
    }

    #[tokio::test]
    async fn execute_marks_participant_with_conversation_reason() {
        let repos = fixture();
        let orchestrator = CascadeOrchestrator::new(CascadeRepositories::from(&repos));

        let stats = orchestrator.run(CascadeMode::Execute).await.unwrap();
        assert_eq!(stats.agent_instances_from_conversations, 1);

        let instance = repos.instances.get(&DocumentKey::text("i1")).unwrap();
        assert_eq!(
            instance.cascade_delete.map(|a| a.reason),
            Some(CascadeReason::ConversationDeleted)
        );
    }
}
