// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # MongoDB Database Handle
//!
//! Wraps `mongodb::Database` in a thin `Database` newtype that is injected
//! into all MongoDB repository implementations.
//!
//! `connect` pings the server before returning, so an unreachable store is
//! reported as `RepositoryError::Connection` before any collection is read.

use std::time::Duration;

use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::info;

use crate::domain::repository::{MongoConfig, RepositoryError};

#[derive(Clone)]
pub struct Database {
    database: mongodb::Database,
}

impl Database {
    pub async fn connect(config: &MongoConfig) -> Result<Self, RepositoryError> {
        let mut options = ClientOptions::parse(&config.connection_string)
            .await
            .map_err(|e| RepositoryError::Connection(format!("Invalid connection string: {}", e)))?;
        options.server_selection_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.app_name = Some("conductor-cascade".to_string());

        let client = Client::with_options(options)
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| RepositoryError::Connection(format!("Ping failed: {}", e)))?;

        info!(database = %config.database, "Connected to MongoDB");

        Ok(Self {
            database: client.database(&config.database),
        })
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}
