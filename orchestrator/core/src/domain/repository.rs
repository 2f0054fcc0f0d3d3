// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for the three collections touched by the cascade,
//! one repository per entity. Interfaces live in the domain layer and are
//! implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Entity | Implementations |
//! |-------|--------|----------------|
//! | `ScreenplayRepository` | `Screenplay` | `InMemoryScreenplayRepository`, `MongoScreenplayRepository` |
//! | `ConversationRepository` | `Conversation` | `InMemoryConversationRepository`, `MongoConversationRepository` |
//! | `AgentInstanceRepository` | `AgentInstance` | `InMemoryAgentInstanceRepository`, `MongoAgentInstanceRepository` |
//!
//! Every `find_undeleted_*` query applies the absent-or-false predicate on
//! `isDeleted`. Every `mark_deleted` call is one bulk update filtered by
//! primary key that sets `isDeleted = true`, the deletion timestamp and the
//! `_cascadeDelete` audit record; it returns the number of documents modified.

use async_trait::async_trait;
use crate::domain::cascade::CascadeAudit;
use crate::domain::entity::{
    AgentInstance, Conversation, DocumentKey, InstanceId, Screenplay, ScreenplayId,
};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    MongoDb(MongoConfig),
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub connection_string: String,
    pub database: String,
    pub connect_timeout_ms: u64,
}

/// Documents returned by a scan, plus the number of stored documents that
/// could not be interpreted and were left out.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBatch<T> {
    pub items: Vec<T>,
    pub skipped: u64,
}

impl<T> DocumentBatch<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, skipped: 0 }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
pub trait ScreenplayRepository: Send + Sync {
    /// All screenplays with `isDeleted = true`
    async fn find_deleted(&self) -> Result<DocumentBatch<Screenplay>, RepositoryError>;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Not-yet-deleted conversations whose `screenplay_id` is in the set
    async fn find_undeleted_by_screenplays(
        &self,
        screenplay_ids: &[ScreenplayId],
    ) -> Result<DocumentBatch<Conversation>, RepositoryError>;

    async fn mark_deleted(
        &self,
        keys: &[DocumentKey],
        audit: &CascadeAudit,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait AgentInstanceRepository: Send + Sync {
    /// Not-yet-deleted instances whose `instance_id` is in the set
    async fn find_undeleted_by_instance_ids(
        &self,
        instance_ids: &[InstanceId],
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError>;

    /// Not-yet-deleted instances directly linked to one of the screenplays
    async fn find_undeleted_by_screenplays(
        &self,
        screenplay_ids: &[ScreenplayId],
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError>;

    async fn mark_deleted(
        &self,
        keys: &[DocumentKey],
        audit: &CascadeAudit,
    ) -> Result<u64, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        match *err.kind {
            mongodb::error::ErrorKind::ServerSelection { .. }
            | mongodb::error::ErrorKind::DnsResolve { .. }
            | mongodb::error::ErrorKind::Authentication { .. } => {
                RepositoryError::Connection(err.to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<mongodb::bson::de::Error> for RepositoryError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for RepositoryError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
