// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects and persistence contracts of the soft-delete
//! cascade.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and repository interfaces

pub mod entity;
pub mod cascade;
pub mod cascade_config;
pub mod repository;
pub mod instance_api;
