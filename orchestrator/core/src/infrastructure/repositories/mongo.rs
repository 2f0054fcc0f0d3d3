// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Shared MongoDB query and decoding helpers
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** One definition of the live-document predicate and of the
//!   cascade update document, reused by every Mongo repository

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{doc, Binary, Bson, Document, Uuid};
use mongodb::Collection;
use tracing::warn;

use crate::domain::cascade::{CascadeAudit, CascadeReason};
use crate::domain::entity::{DocumentKey, SoftDeleteFlag};
use crate::domain::repository::{DocumentBatch, RepositoryError};

pub const ID_FIELD: &str = "_id";
pub const IS_DELETED_FIELD: &str = "isDeleted";
pub const CASCADE_DELETE_FIELD: &str = "_cascadeDelete";

/// `isDeleted` absent OR false.
pub fn live_predicate() -> Document {
    doc! {
        "$or": [
            { IS_DELETED_FIELD: { "$exists": false } },
            { IS_DELETED_FIELD: false },
        ]
    }
}

/// Live documents whose `field` is one of `values`.
pub fn live_where_in(field: &str, values: Vec<Bson>) -> Document {
    let mut filter = Document::new();
    filter.insert(field, doc! { "$in": values });
    for (key, value) in live_predicate() {
        filter.insert(key, value);
    }
    filter
}

pub fn keys_filter(keys: &[DocumentKey]) -> Result<Document, RepositoryError> {
    let ids = keys
        .iter()
        .map(key_to_bson)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(doc! { ID_FIELD: { "$in": ids } })
}

/// `$set` document marking a document deleted by the cascade.
///
/// `timestamp_field` is `deletedAt` on conversations and `deleted_at` on
/// agent instances.
pub fn mark_deleted_update(timestamp_field: &str, audit: &CascadeAudit) -> Document {
    let mut set = doc! { IS_DELETED_FIELD: true };
    set.insert(timestamp_field, audit.deleted_at.clone());
    set.insert(
        CASCADE_DELETE_FIELD,
        doc! {
            "reason": audit.reason.as_str(),
            "deletedAt": audit.deleted_at.clone(),
        },
    );
    doc! { "$set": set }
}

fn invalid_key(kind: &str, value: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Serialization(format!("Invalid {} key '{}': {}", kind, value, err))
}

pub fn key_to_bson(key: &DocumentKey) -> Result<Bson, RepositoryError> {
    match key {
        DocumentKey::ObjectId(hex) => ObjectId::parse_str(hex)
            .map(Bson::ObjectId)
            .map_err(|e| invalid_key("ObjectId", hex, e)),
        DocumentKey::Text(text) => Ok(Bson::String(text.clone())),
        DocumentKey::Int(value) => Ok(Bson::Int64(*value)),
        DocumentKey::Uuid(text) => Uuid::parse_str(text)
            .map(|uuid| Bson::Binary(Binary::from_uuid(uuid)))
            .map_err(|e| invalid_key("UUID", text, e)),
        DocumentKey::Extended(json) => {
            let value: serde_json::Value =
                serde_json::from_str(json).map_err(|e| invalid_key("extended JSON", json, e))?;
            Bson::try_from(value).map_err(|e| invalid_key("extended JSON", json, e))
        }
    }
}

/// Key of `document`, or `None` when it has no `_id` at all.
///
/// Numeric keys compare by value in MongoDB, so int32 and int64 ids both map
/// to [`DocumentKey::Int`].
pub fn key_from_document(document: &Document) -> Option<DocumentKey> {
    let key = match document.get(ID_FIELD)? {
        Bson::ObjectId(oid) => DocumentKey::ObjectId(oid.to_hex()),
        Bson::String(text) => DocumentKey::Text(text.clone()),
        Bson::Int32(value) => DocumentKey::Int(i64::from(*value)),
        Bson::Int64(value) => DocumentKey::Int(*value),
        Bson::Binary(binary) if binary.subtype == BinarySubtype::Uuid => {
            match <[u8; 16]>::try_from(binary.bytes.as_slice()) {
                Ok(bytes) => DocumentKey::Uuid(Uuid::from_bytes(bytes).to_string()),
                Err(_) => extended_key(&Bson::Binary(binary.clone())),
            }
        }
        other => extended_key(other),
    };
    Some(key)
}

fn extended_key(value: &Bson) -> DocumentKey {
    DocumentKey::Extended(value.clone().into_canonical_extjson().to_string())
}

pub fn string_field(document: &Document, field: &str) -> Option<String> {
    match document.get(field) {
        Some(Bson::String(value)) => Some(value.clone()),
        _ => None,
    }
}

pub fn deletion_flag(document: &Document) -> SoftDeleteFlag {
    SoftDeleteFlag(document.get_bool(IS_DELETED_FIELD).ok())
}

pub fn cascade_audit(document: &Document) -> Option<CascadeAudit> {
    let audit = document.get_document(CASCADE_DELETE_FIELD).ok()?;
    let reason = match audit.get_str("reason").ok()? {
        "screenplay_deleted" => CascadeReason::ScreenplayDeleted,
        "conversation_deleted" => CascadeReason::ConversationDeleted,
        _ => return None,
    };
    Some(CascadeAudit {
        reason,
        deleted_at: string_field(audit, "deletedAt").unwrap_or_default(),
    })
}

/// Run `filter` against `collection` and decode every document with `decode`.
///
/// Documents `decode` rejects are logged and counted in `skipped` instead of
/// failing the scan.
pub async fn find_decoded<T, F>(
    collection: &Collection<Document>,
    filter: Document,
    decode: F,
) -> Result<DocumentBatch<T>, RepositoryError>
where
    F: Fn(&Document) -> Option<T>,
{
    let documents: Vec<Document> = collection.find(filter).await?.try_collect().await?;

    let mut batch = DocumentBatch::empty();
    for document in &documents {
        match decode(document) {
            Some(item) => batch.items.push(item),
            None => {
                warn!(
                    collection = collection.name(),
                    id = ?document.get(ID_FIELD),
                    "Skipping document that could not be decoded"
                );
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}
