// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # MongoDB Conversation Repository
//!
//! `ConversationRepository` backed by the `conversations` collection.
//! Conversations reference their screenplay by `screenplay_id` and list the
//! agent instances that took part under `participants[].instance_id`.

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use mongodb::Collection;

use crate::domain::cascade::CascadeAudit;
use crate::domain::entity::{
    Conversation, ConversationId, DocumentKey, InstanceId, Participant, ScreenplayId,
};
use crate::domain::repository::{ConversationRepository, DocumentBatch, RepositoryError};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::mongo::{
    cascade_audit, deletion_flag, find_decoded, key_from_document, keys_filter,
    live_where_in, mark_deleted_update, string_field,
};

const DELETED_AT_FIELD: &str = "deletedAt";

pub struct MongoConversationRepository {
    collection: Collection<Document>,
}

impl MongoConversationRepository {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }
}

fn decode_participants(document: &Document) -> Vec<Participant> {
    let Ok(participants) = document.get_array("participants") else {
        return Vec::new();
    };

    participants
        .iter()
        .filter_map(|p| match p {
            Bson::Document(participant) => Some(Participant {
                instance_id: string_field(participant, "instance_id").map(InstanceId),
                agent_id: string_field(participant, "agent_id"),
            }),
            _ => None,
        })
        .collect()
}

fn decode_conversation(document: &Document) -> Option<Conversation> {
    Some(Conversation {
        key: key_from_document(document)?,
        conversation_id: string_field(document, "conversation_id").map(ConversationId),
        screenplay_id: string_field(document, "screenplay_id").map(ScreenplayId),
        participants: decode_participants(document),
        is_deleted: deletion_flag(document),
        deleted_at: string_field(document, DELETED_AT_FIELD),
        cascade_delete: cascade_audit(document),
    })
}

#[async_trait]
impl ConversationRepository for MongoConversationRepository {
    async fn find_undeleted_by_screenplays(
        &self,
        screenplay_ids: &[ScreenplayId],
    ) -> Result<DocumentBatch<Conversation>, RepositoryError> {
        let values = screenplay_ids
            .iter()
            .map(|id| Bson::String(id.0.clone()))
            .collect();

        find_decoded(
            &self.collection,
            live_where_in("screenplay_id", values),
            decode_conversation,
        )
        .await
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
            .map_err(|e| RepositoryError::Database(format!("Failed to mark conversations deleted: {}", e)))?;

        Ok(result.modified_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn decodes_participants_leniently() {
        let document = doc! {
            "_id": "c-1",
            "conversation_id": "C1",
            "screenplay_id": "S1",
            "participants": [
                { "instance_id": "I1", "agent_id": "writer" },
                { "agent_id": "observer" },
                { "instance_id": 7 },
                "not-a-participant",
            ],
        };

        let conversation = decode_conversation(&document).unwrap();
        assert_eq!(conversation.participants.len(), 3);
        let ids: Vec<_> = conversation.participant_instance_ids().cloned().collect();
        assert_eq!(ids, vec![InstanceId::from("I1")]);
        assert!(conversation.is_deleted.is_live());
    }

    #[test]
    fn missing_participants_field_is_empty() {
        let conversation = decode_conversation(&doc! { "_id": "c-2", "screenplay_id": "S1" }).unwrap();
        assert!(conversation.participants.is_empty());
    }

    #[test]
    fn decodes_integer_and_uuid_primary_keys() {
        use mongodb::bson::{Binary, Uuid};

        let int_keyed = decode_conversation(&doc! {
            "_id": 42,
            "screenplay_id": "S1",
            "participants": [{ "instance_id": "I1" }],
        })
        .unwrap();
        assert_eq!(int_keyed.key, DocumentKey::Int(42));

        let uuid = Uuid::new();
        let uuid_keyed = decode_conversation(&doc! {
            "_id": Binary::from_uuid(uuid),
            "screenplay_id": "S1",
        })
        .unwrap();
        assert_eq!(uuid_keyed.key, DocumentKey::Uuid(uuid.to_string()));

        let filter = keys_filter(&[int_keyed.key, uuid_keyed.key]).unwrap();
        assert_eq!(
            filter,
            doc! { "_id": { "$in": [Bson::Int64(42), Bson::Binary(Binary::from_uuid(uuid))] } }
        );
    }
}
