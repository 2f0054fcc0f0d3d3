// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend configuration.
//! The domain layer only defines the repository traits; this factory picks the
//! infrastructure implementation for the configured backend.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wires the three cascade repositories for a `StorageBackend`

use std::sync::Arc;

use tracing::info;

use crate::domain::cascade_config::CollectionNames;
use crate::domain::repository::{
    AgentInstanceRepository, ConversationRepository, RepositoryError, ScreenplayRepository,
    StorageBackend,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::mongo_agent_instance::MongoAgentInstanceRepository;
use crate::infrastructure::repositories::mongo_conversation::MongoConversationRepository;
use crate::infrastructure::repositories::mongo_screenplay::MongoScreenplayRepository;
use crate::infrastructure::repositories::InMemoryRepositories;

/// The repositories one orchestrator run reads and writes.
#[derive(Clone)]
pub struct CascadeRepositories {
    pub screenplays: Arc<dyn ScreenplayRepository>,
    pub conversations: Arc<dyn ConversationRepository>,
    pub instances: Arc<dyn AgentInstanceRepository>,
}

impl CascadeRepositories {
    /// Fresh, empty in-memory stores.
    pub fn in_memory() -> Self {
        Self::from(&InMemoryRepositories::default())
    }
}

impl From<&InMemoryRepositories> for CascadeRepositories {
    fn from(memory: &InMemoryRepositories) -> Self {
        Self {
            screenplays: Arc::new(memory.screenplays.clone()),
            conversations: Arc::new(memory.conversations.clone()),
            instances: Arc::new(memory.instances.clone()),
        }
    }
}

/// Creates the cascade repositories for the configured backend.
///
/// For MongoDB this opens the connection and pings the server, so an
/// unreachable store fails here before any collection is read.
pub async fn create_repositories(
    backend: &StorageBackend,
    collections: &CollectionNames,
) -> Result<CascadeRepositories, RepositoryError> {
    match backend {
        StorageBackend::InMemory => Ok(CascadeRepositories::in_memory()),
        StorageBackend::MongoDb(config) => {
            let database = Database::connect(config).await?;
            info!(
                screenplays = %collections.screenplays,
                conversations = %collections.conversations,
                agent_instances = %collections.agent_instances,
                "Using MongoDB collections"
            );

            Ok(CascadeRepositories {
                screenplays: Arc::new(MongoScreenplayRepository::new(
                    &database,
                    &collections.screenplays,
                )),
                conversations: Arc::new(MongoConversationRepository::new(
                    &database,
                    &collections.conversations,
                )),
                instances: Arc::new(MongoAgentInstanceRepository::new(
                    &database,
                    &collections.agent_instances,
                )),
            })
        }
    }
}
