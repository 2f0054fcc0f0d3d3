// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repositories;
pub mod db;
pub mod instance_api_client;

pub use instance_api_client::HttpInstanceApi;
