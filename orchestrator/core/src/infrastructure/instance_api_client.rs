// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for the agent instance deletion API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::cascade_config::ApiConfig;
use crate::domain::instance_api::{ApiError, DeletionResponse, InstanceApi, InstanceRecord};

#[derive(Debug, Clone)]
pub struct HttpInstanceApi {
    client: Client,
    base_url: String,
}

impl HttpInstanceApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn instance_url(&self, instance_id: &str) -> String {
        format!("{}/api/agents/instances/{}", self.base_url, instance_id)
    }

    async fn ensure_success(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn transport(context: &str, err: reqwest::Error) -> ApiError {
    ApiError::Transport(format!("{}: {}", context, err))
}

#[async_trait]
impl InstanceApi for HttpInstanceApi {
    async fn health(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| transport("Failed to reach backend", e))?;

        Self::ensure_success(response).await.map(|_| ())
    }

    async fn create_instance(&self, agent_id: &str) -> Result<String, ApiError> {
        #[derive(Serialize)]
        struct CreateRequest<'a> {
            agent_id: &'a str,
            config: serde_json::Value,
        }

        #[derive(Deserialize)]
        struct CreateResponse {
            instance_id: Option<String>,
        }

        let response = self
            .client
            .post(format!("{}/api/agents/instances", self.base_url))
            .json(&CreateRequest {
                agent_id,
                config: serde_json::json!({ "test": true }),
            })
            .send()
            .await
            .map_err(|e| transport("Failed to create instance", e))?;

        let created: CreateResponse = Self::decode(Self::ensure_success(response).await?).await?;
        created
            .instance_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::Decode("create response carried no instance_id".to_string()))
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Option<InstanceRecord>, ApiError> {
        let response = self
            .client
            .get(self.instance_url(instance_id))
            .send()
            .await
            .map_err(|e| transport("Failed to get instance", e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::decode(Self::ensure_success(response).await?).await.map(Some)
    }

    async fn soft_delete(&self, instance_id: &str) -> Result<DeletionResponse, ApiError> {
        let response = self
            .client
            .delete(self.instance_url(instance_id))
            .send()
            .await
            .map_err(|e| transport("Failed to soft delete instance", e))?;

        Self::decode(Self::ensure_success(response).await?).await
    }

    async fn hard_delete(
        &self,
        instance_id: &str,
        cascade: bool,
    ) -> Result<DeletionResponse, ApiError> {
        let mut params = vec![("hard", "true")];
        if cascade {
            params.push(("cascade", "true"));
        }

        let response = self
            .client
            .delete(self.instance_url(instance_id))
            .query(&params)
            .send()
            .await
            .map_err(|e| transport("Failed to hard delete instance", e))?;

        Self::decode(Self::ensure_success(response).await?).await
    }
}
