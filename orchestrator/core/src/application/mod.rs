// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod conversation_cascade;
pub mod instance_cascade;
pub mod cascade_orchestrator;
pub mod repository_factory;
pub mod verification;

// Re-export use cases for convenience
pub use cascade_orchestrator::CascadeOrchestrator;
pub use repository_factory::{create_repositories, CascadeRepositories};
pub use verification::{VerificationHarness, VerificationReport};
