// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # MongoDB Agent Instance Repository
//!
//! `AgentInstanceRepository` backed by the `agent_instances` collection.
//! Instances are reachable by their own `instance_id` (from conversation
//! participants) and by an optional direct `screenplay_id` link. The deletion
//! timestamp on this collection is stored as `deleted_at`.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use mongodb::Collection;

use crate::domain::cascade::CascadeAudit;
use crate::domain::entity::{AgentInstance, DocumentKey, InstanceId, ScreenplayId};
use crate::domain::repository::{AgentInstanceRepository, DocumentBatch, RepositoryError};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::mongo::{
    cascade_audit, deletion_flag, find_decoded, key_from_document, keys_filter,
    live_where_in, mark_deleted_update, string_field,
};

const DELETED_AT_FIELD: &str = "deleted_at";

pub struct MongoAgentInstanceRepository {
    collection: Collection<Document>,
}

impl MongoAgentInstanceRepository {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }

    async fn find_live_where_in(
        &self,
        field: &str,
        values: Vec<Bson>,
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError> {
        find_decoded(&self.collection, live_where_in(field, values), decode_instance).await
    }
}

fn decode_instance(document: &Document) -> Option<AgentInstance> {
    Some(AgentInstance {
        key: key_from_document(document)?,
        instance_id: string_field(document, "instance_id").map(InstanceId),
        agent_id: string_field(document, "agent_id"),
        screenplay_id: string_field(document, "screenplay_id").map(ScreenplayId),
        is_deleted: deletion_flag(document),
        deleted_at: string_field(document, DELETED_AT_FIELD),
        cascade_delete: cascade_audit(document),
    })
}

#[async_trait]
impl AgentInstanceRepository for MongoAgentInstanceRepository {
    async fn find_undeleted_by_instance_ids(
        &self,
        instance_ids: &[InstanceId],
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError> {
        let values = instance_ids
            .iter()
            .map(|id| Bson::String(id.0.clone()))
            .collect();
        self.find_live_where_in("instance_id", values).await
    }

    async fn find_undeleted_by_screenplays(
        &self,
        screenplay_ids: &[ScreenplayId],
    ) -> Result<DocumentBatch<AgentInstance>, RepositoryError> {
        let values = screenplay_ids
            .iter()
            .map(|id| Bson::String(id.0.clone()))
            .collect();
        self.find_live_where_in("screenplay_id", values).await
    }

    async fn mark_deleted(
        &self,
        keys: &[DocumentKey],
        audit: &CascadeAudit,
    ) -> Result<u64, RepositoryError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let result = self
            .collection
            .update_many(keys_filter(keys)?, mark_deleted_update(DELETED_AT_FIELD, audit))
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to mark agent instances deleted: {}", e)))?;

        Ok(result.modified_count)
    }
}
