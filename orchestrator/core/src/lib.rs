// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Conductor Cascade Core
//!
//! Soft-delete propagation across screenplays, conversations and agent
//! instances stored in MongoDB, plus an end-to-end harness for the instance
//! deletion API.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, cascade use cases and storage adapters

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
