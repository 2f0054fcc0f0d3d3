// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Instance Deletion API Contract
//!
//! The backend that owns agent instances exposes create / get / delete
//! endpoints under `/api/agents/instances`. The cascade core never calls
//! them; the verification harness drives them end-to-end and checks the
//! observable effects of soft and hard deletion.
//!
//! Implemented by `crate::infrastructure::instance_api_client::HttpInstanceApi`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of `GET /api/agents/instances/{id}`. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: Option<bool>,
}

impl InstanceRecord {
    pub fn is_deleted(&self) -> bool {
        self.is_deleted.unwrap_or(false)
    }
}

/// Body of `DELETE /api/agents/instances/{id}`, soft or hard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub deletion_type: Option<String>,
    #[serde(rename = "isDeleted", default)]
    pub is_deleted: Option<bool>,
    /// History messages newly marked by this call; 0 on a repeated soft delete
    #[serde(default)]
    pub history_messages_affected: Option<u64>,
    /// Per-collection counts removed by a cascading hard delete
    #[serde(default)]
    pub cascade_deleted: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// `GET /health`; any non-success status is an error.
    async fn health(&self) -> Result<(), ApiError>;

    /// Create an instance of `agent_id` and return its `instance_id`.
    async fn create_instance(&self, agent_id: &str) -> Result<String, ApiError>;

    /// `None` when the backend answers 404.
    async fn get_instance(&self, instance_id: &str) -> Result<Option<InstanceRecord>, ApiError>;

    async fn soft_delete(&self, instance_id: &str) -> Result<DeletionResponse, ApiError>;

    async fn hard_delete(
        &self,
        instance_id: &str,
        cascade: bool,
    ) -> Result<DeletionResponse, ApiError>;
}

/// Inserts history messages for an instance so deletion counts can be
/// checked. The backend exposes no endpoint for this, so a seeder is
/// optional and deployment specific.
#[async_trait]
pub trait HistorySeeder: Send + Sync {
    /// Returns the number of messages inserted.
    async fn seed_messages(&self, instance_id: &str, count: u32) -> Result<u64, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_delete_body_decodes_with_camel_case_flag() {
        let body = r#"{
            "success": true,
            "deletion_type": "soft",
            "isDeleted": true,
            "history_messages_affected": 4
        }"#;

        let response: DeletionResponse = serde_json::from_str(body).unwrap();
        assert!(response.success);
        assert_eq!(response.deletion_type.as_deref(), Some("soft"));
        assert_eq!(response.is_deleted, Some(true));
        assert_eq!(response.history_messages_affected, Some(4));
        assert!(response.cascade_deleted.is_none());
    }

    #[test]
    fn instance_record_ignores_unknown_fields() {
        let body = r#"{"instance_id": "I1", "agent_id": "a", "config": {"test": true}}"#;
        let record: InstanceRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.instance_id, "I1");
        assert!(!record.is_deleted());
    }
}
