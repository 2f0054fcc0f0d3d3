// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! This module provides infrastructure implementations of the repository
//! abstractions defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Read and soft-delete screenplays, conversations and agent instances
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## MongoDB Repositories
//!
//! - **MongoScreenplayRepository** - deleted-screenplay scan
//! - **MongoConversationRepository** - conversation lookup and bulk marking
//! - **MongoAgentInstanceRepository** - instance lookup by id or screenplay, bulk marking
//!
//! ## In-Memory Repositories
//!
//! Lightweight implementations for testing and development. They apply the
//! same absent-or-false predicate through `SoftDeleteFlag::is_live` and
//! write the same audit record as the MongoDB implementations.
//!
//! # Usage
//!
//! ```ignore
//! use cascade_core::infrastructure::db::Database;
//! use cascade_core::infrastructure::repositories::mongo_conversation::MongoConversationRepository;
//!
//! let database = Database::connect(&mongo_config).await?;
//! let repo = MongoConversationRepository::new(&database, "conversations");
//! let batch = repo.find_undeleted_by_screenplays(&screenplay_ids).await?;
//! ```

pub mod mongo;
pub mod mongo_screenplay;
pub mod mongo_conversation;
pub mod mongo_agent_instance;

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::cascade::CascadeAudit;
use crate::domain::entity::{
    AgentInstance, Conversation, DocumentKey, InstanceId, Screenplay, ScreenplayId,
    SoftDeleteFlag,
};
use crate::domain::repository::{
    AgentInstanceRepository, ConversationRepository, DocumentBatch, RepositoryError,
    ScreenplayRepository,
};

#[derive(Clone, Default)]
pub struct InMemoryScreenplayRepository {
    screenplays: Arc<RwLock<BTreeMap<DocumentKey, Screenplay>>>,
}

impl InMemoryScreenplayRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, screenplay: Screenplay) {
        self.screenplays.write().insert(screenplay.key.clone(), screenplay);
    }
}

#[async_trait]
impl ScreenplayRepository for InMemoryScreenplayRepository {
    async fn find_deleted(&self) -> Result<DocumentBatch<Screenplay>, RepositoryError> {
        let screenplays = self.screenplays.read();
        Ok(DocumentBatch::new(
            screenplays
                .values()
                .filter(|s| s.is_deleted == SoftDeleteFlag::DELETED)
                .cloned()
                .collect(),
        ))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<BTreeMap<DocumentKey, Conversation>>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conversation: Conversation) {
        self.conversations
            .write()
            .insert(conversation.key.clone(), conversation);
    }

    pub fn get(&self, key: &DocumentKey) -> Option<Conversation> {
        self.conversations.read().get(key).cloned()
    }

    pub fn all(&self) -> Vec<Conversation> {
        self.conversations.read().values().cloned().collect()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn find_undeleted_by_screenplays(
        &self,
        screenplay_ids: &[ScreenplayId],
    ) -> Result<DocumentBatch<Conversation>, RepositoryError> {
        let wanted: HashSet<&ScreenplayId> = screenplay_ids.iter().collect();
        let conversations = self.conversations.read();
        Ok(DocumentBatch::new(
            conversations
                .values()
                .filter(|c| c.is_deleted.is_live())
                .filter(|c| c.screenplay_id.as_ref().is_some_and(|id| wanted.contains(id)))
                .cloned()
                .collect(),
        ))
    }

    async fn mark_deleted(
        &self,
        keys: &[DocumentKey],
        audit: &CascadeAudit,
    ) -> Result<u64, RepositoryError> {
        let mut conversations = self.conversations.write();
        let mut modified = 0;
        for key in keys {
            if let Some(conversation) = conversations.get_mut(key) {
                conversation.is_deleted = SoftDeleteFlag::DELETED;
                conversation.deleted_at = Some(audit.deleted_at.clone());
                conversation.cascade_delete = Some(audit.clone());
                modified += 1;
            }
        }
        Ok(modified)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAgentInstanceRepository {
    instances: Arc<RwLock<BTreeMap<DocumentKey, AgentInstance>>>,
}

impl InMemoryAgentInstanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, instance: AgentInstance) {
        self.instances.write().insert(instance.key.clone(), instance);
    }

    pub fn get(&self, key: &DocumentKey) -> Option<AgentInstance> {
        self.instances.read().get(key).cloned()
    }

    pub fn all(&self) -> Vec<AgentInstance> {
        self.instances.read().values().cloned().collect()
    }

    fn find_live<P>(&self, predicate: P) -> DocumentBatch<AgentInstance>
    where
        P: Fn(&AgentInstance) -> bool,
    {
        let instances = self.instances.read();
        DocumentBatch::new(
            instances
                .values()
                .filter(|i| i.is_deleted.is_live())
                .filter(|i| predicate(i))
                .cloned()
                .collect(),
        )
    }
}

#[async_trait]
impl AgentInstanceRepository for InMemoryAgentInstanceRepository {
    async fn find_undeleted_by_instance_ids(
        &self,
        instance_ids: &[InstanceId],
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError> {
        let wanted: HashSet<&InstanceId> = instance_ids.iter().collect();
        Ok(self.find_live(|i| i.instance_id.as_ref().is_some_and(|id| wanted.contains(id))))
    }

    async fn find_undeleted_by_screenplays(
        &self,
        screenplay_ids: &[ScreenplayId],
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError> {
        let wanted: HashSet<&ScreenplayId> = screenplay_ids.iter().collect();
        Ok(self.find_live(|i| i.screenplay_id.as_ref().is_some_and(|id| wanted.contains(id))))
    }

    async fn mark_deleted(
        &self,
        keys: &[DocumentKey],
        audit: &CascadeAudit,
    ) -> Result<u64, RepositoryError> {
        let mut instances = self.instances.write();
        let mut modified = 0;
        for key in keys {
            if let Some(instance) = instances.get_mut(key) {
                instance.is_deleted = SoftDeleteFlag::DELETED;
                instance.deleted_at = Some(audit.deleted_at.clone());
                instance.cascade_delete = Some(audit.clone());
                modified += 1;
            }
        }
        Ok(modified)
    }
}

/// One in-memory repository per collection. Clones share the same stores,
/// so a test can keep a handle for seeding and inspection while the
/// orchestrator owns another.
#[derive(Clone, Default)]
pub struct InMemoryRepositories {
    pub screenplays: InMemoryScreenplayRepository,
    pub conversations: InMemoryConversationRepository,
    pub instances: InMemoryAgentInstanceRepository,
}
