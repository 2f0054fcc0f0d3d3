// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Cascade Entities
//!
//! The three document kinds the cascade reasons about. They are linked only by
//! identifier; nothing in the store enforces the references, so the cascade is
//! the sole keeper of cross-entity consistency.
//!
//! | Entity | Collection | Deletion timestamp field |
//! |--------|------------|--------------------------|
//! | `Screenplay` | `screenplays` | (read only) |
//! | `Conversation` | `conversations` | `deletedAt` |
//! | `AgentInstance` | `agent_instances` | `deleted_at` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical screenplay identifier (explicit `id` field or stringified `_id`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenplayId(pub String);

impl ScreenplayId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScreenplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScreenplayId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Value of a conversation's `conversation_id` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Value of an agent instance's `instance_id` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Store-native primary key of a document.
///
/// Bulk updates filter on this key rather than on the logical identifiers,
/// so a document is addressed exactly even when logical ids collide. Every
/// variant converts back to the exact stored `_id` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKey {
    /// 24-character hex form of a MongoDB ObjectId
    ObjectId(String),
    Text(String),
    Int(i64),
    /// Hyphenated form of a standard (subtype 4) binary UUID
    Uuid(String),
    /// Canonical extended JSON of any other `_id` type
    Extended(String),
}

impl DocumentKey {
    pub fn text(value: impl Into<String>) -> Self {
        DocumentKey::Text(value.into())
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKey::ObjectId(value)
            | DocumentKey::Text(value)
            | DocumentKey::Uuid(value)
            | DocumentKey::Extended(value) => f.write_str(value),
            DocumentKey::Int(value) => write!(f, "{}", value),
        }
    }
}

/// Stored deletion flag.
///
/// The schema drifted over time: older documents carry no `isDeleted` field
/// at all. Absent is equivalent to `false`, and every "not yet deleted"
/// query goes through [`SoftDeleteFlag::is_live`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoftDeleteFlag(pub Option<bool>);

impl SoftDeleteFlag {
    pub const ABSENT: SoftDeleteFlag = SoftDeleteFlag(None);
    pub const DELETED: SoftDeleteFlag = SoftDeleteFlag(Some(true));

    pub fn is_deleted(self) -> bool {
        self.0.unwrap_or(false)
    }

    pub fn is_live(self) -> bool {
        !self.is_deleted()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenplay {
    pub key: DocumentKey,
    pub id: ScreenplayId,
    pub is_deleted: SoftDeleteFlag,
}

impl Screenplay {
    /// Resolve the logical identifier: a non-empty explicit `id` wins,
    /// otherwise the string form of the primary key.
    pub fn resolve_id(explicit_id: Option<&str>, key: &DocumentKey) -> ScreenplayId {
        match explicit_id {
            Some(id) if !id.is_empty() => ScreenplayId::new(id),
            _ => ScreenplayId::new(key.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Participant {
    pub instance_id: Option<InstanceId>,
    pub agent_id: Option<String>,
}

impl Participant {
    pub fn instance(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(InstanceId::new(instance_id)),
            agent_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub key: DocumentKey,
    pub conversation_id: Option<ConversationId>,
    pub screenplay_id: Option<ScreenplayId>,
    pub participants: Vec<Participant>,
    pub is_deleted: SoftDeleteFlag,
    pub deleted_at: Option<String>,
    pub cascade_delete: Option<crate::domain::cascade::CascadeAudit>,
}

impl Conversation {
    /// Instance ids referenced by participants; empty ids are ignored.
    pub fn participant_instance_ids(&self) -> impl Iterator<Item = &InstanceId> {
        self.participants
            .iter()
            .filter_map(|p| p.instance_id.as_ref())
            .filter(|id| !id.as_str().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub key: DocumentKey,
    pub instance_id: Option<InstanceId>,
    pub agent_id: Option<String>,
    pub screenplay_id: Option<ScreenplayId>,
    pub is_deleted: SoftDeleteFlag,
    pub deleted_at: Option<String>,
    pub cascade_delete: Option<crate::domain::cascade::CascadeAudit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_flag_is_live() {
        assert!(SoftDeleteFlag::ABSENT.is_live());
        assert!(SoftDeleteFlag(Some(false)).is_live());
        assert!(!SoftDeleteFlag::DELETED.is_live());
    }

    #[test]
    fn screenplay_id_prefers_explicit_field() {
        let key = DocumentKey::ObjectId("65a1f0c2e4b0a1b2c3d4e5f6".to_string());
        assert_eq!(Screenplay::resolve_id(Some("S1"), &key).as_str(), "S1");
        assert_eq!(
            Screenplay::resolve_id(None, &key).as_str(),
            "65a1f0c2e4b0a1b2c3d4e5f6"
        );
        assert_eq!(
            Screenplay::resolve_id(Some(""), &key).as_str(),
            "65a1f0c2e4b0a1b2c3d4e5f6"
        );
    }

    #[test]
    fn screenplay_id_falls_back_to_string_form_of_any_key() {
        assert_eq!(Screenplay::resolve_id(None, &DocumentKey::Int(42)).as_str(), "42");

        let uuid = DocumentKey::Uuid("0b6f4c8e-1d2a-4f3b-9c5d-7e8f9a0b1c2d".to_string());
        assert_eq!(
            Screenplay::resolve_id(None, &uuid).as_str(),
            "0b6f4c8e-1d2a-4f3b-9c5d-7e8f9a0b1c2d"
        );
    }

    #[test]
    fn participants_without_instance_are_ignored() {
        let conversation = Conversation {
            key: DocumentKey::text("c1"),
            conversation_id: Some(ConversationId::from("C1")),
            screenplay_id: Some(ScreenplayId::from("S1")),
            participants: vec![
                Participant::instance("I1"),
                Participant::default(),
                Participant::instance(""),
            ],
            is_deleted: SoftDeleteFlag::ABSENT,
            deleted_at: None,
            cascade_delete: None,
        };

        let ids: Vec<_> = conversation.participant_instance_ids().collect();
        assert_eq!(ids, vec![&InstanceId::from("I1")]);
    }
}
