// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # MongoDB Screenplay Repository
//!
//! Read-only view of the `screenplays` collection. The cascade never writes
//! screenplays; it only collects those already marked `isDeleted = true` by
//! the screenplay API.

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::Collection;

use crate::domain::entity::Screenplay;
use crate::domain::repository::{DocumentBatch, RepositoryError, ScreenplayRepository};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::mongo::{
    deletion_flag, find_decoded, key_from_document, string_field, IS_DELETED_FIELD,
};

pub struct MongoScreenplayRepository {
    collection: Collection<Document>,
}

impl MongoScreenplayRepository {
    pub fn new(database: &Database, collection: &str) -> Self {
        Self {
            collection: database.collection(collection),
        }
    }
}

/// The logical id is the explicit `id` field when present, otherwise the
/// string form of `_id`.
fn decode_screenplay(document: &Document) -> Option<Screenplay> {
    let key = key_from_document(document)?;
    let explicit_id = string_field(document, "id");
    Some(Screenplay {
        id: Screenplay::resolve_id(explicit_id.as_deref(), &key),
        key,
        is_deleted: deletion_flag(document),
    })
}

#[async_trait]
impl ScreenplayRepository for MongoScreenplayRepository {
    async fn find_deleted(&self) -> Result<DocumentBatch<Screenplay>, RepositoryError> {
        find_decoded(
            &self.collection,
            doc! { IS_DELETED_FIELD: true },
            decode_screenplay,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::DocumentKey;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn decodes_explicit_and_native_ids() {
        let oid = ObjectId::new();
        let with_id = decode_screenplay(&doc! { "_id": oid, "id": "S1", "isDeleted": true }).unwrap();
        assert_eq!(with_id.id.as_str(), "S1");
        assert_eq!(with_id.key, DocumentKey::ObjectId(oid.to_hex()));
        assert!(with_id.is_deleted.is_deleted());

        let native = decode_screenplay(&doc! { "_id": oid, "isDeleted": true }).unwrap();
        assert_eq!(native.id.as_str(), oid.to_hex());
    }

    #[test]
    fn native_id_falls_back_to_string_form() {
        use mongodb::bson::{Binary, Uuid};

        let int_keyed = decode_screenplay(&doc! { "_id": 42, "isDeleted": true }).unwrap();
        assert_eq!(int_keyed.id.as_str(), "42");

        let uuid = Uuid::new();
        let uuid_keyed =
            decode_screenplay(&doc! { "_id": Binary::from_uuid(uuid), "isDeleted": true }).unwrap();
        assert_eq!(uuid_keyed.id.as_str(), uuid.to_string());
    }

    #[test]
    fn rejects_documents_without_usable_key() {
        assert!(decode_screenplay(&doc! { "id": "S1", "isDeleted": true }).is_none());
    }
}
