// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Verification Harness
//!
//! Drives the instance deletion API end-to-end and checks the observable
//! effects of soft-delete propagation: response shape, history-message
//! counts, idempotency, hard-delete removal and isolation between sibling
//! instances of the same agent.
//!
//! Checks that depend on seeded history messages are reported as skipped
//! when no [`HistorySeeder`] is configured.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** End-to-end verification of the deletion API

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::instance_api::{ApiError, DeletionResponse, HistorySeeder, InstanceApi};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed(String),
    Skipped(String),
}

impl CheckOutcome {
    fn from_bool(passed: bool, detail: impl FnOnce() -> String) -> Self {
        if passed {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed(detail())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub description: String,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub checks: Vec<CheckResult>,
}

impl ScenarioReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            checks: Vec::new(),
        }
    }

    fn check(&mut self, description: &str, outcome: CheckOutcome) {
        match &outcome {
            CheckOutcome::Passed => info!(scenario = %self.name, "PASSED - {}", description),
            CheckOutcome::Failed(detail) => {
                warn!(scenario = %self.name, detail = %detail, "FAILED - {}", description)
            }
            CheckOutcome::Skipped(reason) => {
                info!(scenario = %self.name, reason = %reason, "SKIPPED - {}", description)
            }
        }
        self.checks.push(CheckResult {
            description: description.to_string(),
            outcome,
        });
    }

    fn expect(&mut self, description: &str, passed: bool, detail: impl FnOnce() -> String) {
        self.check(description, CheckOutcome::from_bool(passed, detail));
    }

    /// A scenario passes when none of its checks failed.
    pub fn passed(&self) -> bool {
        !self
            .checks
            .iter()
            .any(|c| matches!(c.outcome, CheckOutcome::Failed(_)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub scenarios: Vec<ScenarioReport>,
}

impl VerificationReport {
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_count() == self.total()
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RESULTS: {}/{} tests passed", self.passed_count(), self.total())
    }
}

const NO_SEEDER: &str = "no history seeder configured";

pub struct VerificationHarness {
    api: Arc<dyn InstanceApi>,
    seeder: Option<Arc<dyn HistorySeeder>>,
    run_tag: String,
}

impl VerificationHarness {
    pub fn new(api: Arc<dyn InstanceApi>) -> Self {
        let run_tag = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            api,
            seeder: None,
            run_tag,
        }
    }

    pub fn with_seeder(mut self, seeder: Arc<dyn HistorySeeder>) -> Self {
        self.seeder = Some(seeder);
        self
    }

    /// Probes `/health`, then runs every scenario. An unreachable backend is
    /// an error; scenario failures are reported, not returned.
    pub async fn run(&self) -> Result<VerificationReport, ApiError> {
        self.api.health().await?;
        info!(run_tag = %self.run_tag, "Backend healthy, running deletion scenarios");

        let scenarios = vec![
            self.guard("Soft-Delete with Messages", self.soft_delete_with_messages().await),
            self.guard("Soft-Delete without Messages", self.soft_delete_without_messages().await),
            self.guard("Hard-Delete with Cascade", self.hard_delete_with_cascade().await),
            self.guard("Idempotent Soft-Delete", self.idempotent_soft_delete().await),
            self.guard("Instance Isolation", self.instance_isolation().await),
        ];

        Ok(VerificationReport { scenarios })
    }

    /// An API error inside a scenario fails that scenario only.
    fn guard(&self, name: &str, result: Result<ScenarioReport, ApiError>) -> ScenarioReport {
        result.unwrap_or_else(|e| {
            let mut report = ScenarioReport::new(name);
            report.check("Scenario completed", CheckOutcome::Failed(e.to_string()));
            report
        })
    }

    fn agent_id(&self, n: u32) -> String {
        format!("test-agent-{:03}-{}", n, self.run_tag)
    }

    /// Seed `count` messages; `None` when no seeder is configured.
    async fn seed(&self, instance_id: &str, count: u32) -> Result<Option<u64>, ApiError> {
        match &self.seeder {
            Some(seeder) => seeder.seed_messages(instance_id, count).await.map(Some),
            None => {
                info!(instance_id, count, "No history seeder, messages not added");
                Ok(None)
            }
        }
    }

    fn check_success(report: &mut ScenarioReport, description: &str, response: &DeletionResponse) {
        report.expect(description, response.success, || format!("{:?}", response));
    }

    async fn soft_delete_with_messages(&self) -> Result<ScenarioReport, ApiError> {
        let mut report = ScenarioReport::new("Soft-Delete with Messages");
        let instance_id = self.api.create_instance(&self.agent_id(1)).await?;
        let seeded = self.seed(&instance_id, 5).await?;

        let response = self.api.soft_delete(&instance_id).await?;
        Self::check_success(&mut report, "success flag is True", &response);
        report.expect(
            "deletion_type is 'soft'",
            response.deletion_type.as_deref() == Some("soft"),
            || format!("deletion_type = {:?}", response.deletion_type),
        );
        report.expect("isDeleted flag is True", response.is_deleted == Some(true), || {
            format!("isDeleted = {:?}", response.is_deleted)
        });
        report.expect(
            "history_messages_affected is present",
            response.history_messages_affected.is_some(),
            || "field missing".to_string(),
        );

        match seeded {
            Some(_) => report.expect(
                "history messages were marked",
                response.history_messages_affected.unwrap_or(0) > 0,
                || format!("affected = {:?}", response.history_messages_affected),
            ),
            None => report.check(
                "history messages were marked",
                CheckOutcome::Skipped(NO_SEEDER.to_string()),
            ),
        }

        Ok(report)
    }

    async fn soft_delete_without_messages(&self) -> Result<ScenarioReport, ApiError> {
        let mut report = ScenarioReport::new("Soft-Delete without Messages");
        let instance_id = self.api.create_instance(&self.agent_id(2)).await?;

        let response = self.api.soft_delete(&instance_id).await?;
        Self::check_success(&mut report, "success flag is True", &response);
        report.expect(
            "history_messages_affected is 0",
            response.history_messages_affected == Some(0),
            || format!("affected = {:?}", response.history_messages_affected),
        );

        Ok(report)
    }

    async fn hard_delete_with_cascade(&self) -> Result<ScenarioReport, ApiError> {
        let mut report = ScenarioReport::new("Hard-Delete with Cascade");
        let instance_id = self.api.create_instance(&self.agent_id(3)).await?;
        self.seed(&instance_id, 3).await?;

        let response = self.api.hard_delete(&instance_id, true).await?;
        Self::check_success(&mut report, "success flag is True", &response);
        report.expect(
            "deletion_type is 'hard'",
            response.deletion_type.as_deref() == Some("hard"),
            || format!("deletion_type = {:?}", response.deletion_type),
        );
        report.expect(
            "cascade_deleted info present",
            response.cascade_deleted.is_some(),
            || "field missing".to_string(),
        );

        let remaining = self.api.get_instance(&instance_id).await?;
        report.expect("Instance permanently deleted", remaining.is_none(), || {
            format!("instance still returned: {:?}", remaining)
        });

        Ok(report)
    }

    async fn idempotent_soft_delete(&self) -> Result<ScenarioReport, ApiError> {
        let mut report = ScenarioReport::new("Idempotent Soft-Delete");
        let instance_id = self.api.create_instance(&self.agent_id(4)).await?;
        let seeded = self.seed(&instance_id, 2).await?;

        let first = self.api.soft_delete(&instance_id).await?;
        let second = self.api.soft_delete(&instance_id).await?;
        info!(
            first = ?first.history_messages_affected,
            second = ?second.history_messages_affected,
            "Messages affected by repeated soft delete"
        );

        Self::check_success(&mut report, "First deletion succeeded", &first);
        Self::check_success(&mut report, "Second deletion succeeded", &second);
        match seeded {
            Some(_) => report.expect(
                "First deletion affected messages",
                first.history_messages_affected.unwrap_or(0) > 0,
                || format!("affected = {:?}", first.history_messages_affected),
            ),
            None => report.check(
                "First deletion affected messages",
                CheckOutcome::Skipped(NO_SEEDER.to_string()),
            ),
        }
        report.expect(
            "Second deletion affected 0 messages (idempotent)",
            second.history_messages_affected.unwrap_or(0) == 0,
            || format!("affected = {:?}", second.history_messages_affected),
        );

        Ok(report)
    }

    async fn instance_isolation(&self) -> Result<ScenarioReport, ApiError> {
        let mut report = ScenarioReport::new("Instance Isolation");
        let agent_id = self.agent_id(5);
        let instance_a = self.api.create_instance(&agent_id).await?;
        let instance_b = self.api.create_instance(&agent_id).await?;
        self.seed(&instance_a, 3).await?;
        self.seed(&instance_b, 3).await?;

        let response = self.api.soft_delete(&instance_a).await?;
        let sibling = self.api.get_instance(&instance_b).await?;

        Self::check_success(&mut report, "Instance A deleted successfully", &response);
        report.expect("Instance B still exists", sibling.is_some(), || {
            format!("{} not found", instance_b)
        });
        report.expect(
            "Instance B not marked as deleted",
            sibling.as_ref().is_some_and(|b| !b.is_deleted()),
            || format!("{:?}", sibling),
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    use crate::domain::instance_api::InstanceRecord;

    #[derive(Default)]
    struct FakeInstance {
        agent_id: String,
        deleted: bool,
        messages: u64,
        live_messages: u64,
    }

    /// Behaves like a correct backend: soft delete marks live messages once.
    #[derive(Default)]
    struct FakeApi {
        instances: Mutex<HashMap<String, FakeInstance>>,
        healthy: bool,
        leak_deletion_to_siblings: bool,
    }

    impl FakeApi {
        fn healthy() -> Self {
            Self {
                healthy: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl InstanceApi for FakeApi {
        async fn health(&self) -> Result<(), ApiError> {
            if self.healthy {
                Ok(())
            } else {
                Err(ApiError::Transport("connection refused".to_string()))
            }
        }

        async fn create_instance(&self, agent_id: &str) -> Result<String, ApiError> {
            let mut instances = self.instances.lock();
            let id = format!("inst-{}", instances.len() + 1);
            instances.insert(
                id.clone(),
                FakeInstance {
                    agent_id: agent_id.to_string(),
                    ..FakeInstance::default()
                },
            );
            Ok(id)
        }

        async fn get_instance(&self, instance_id: &str) -> Result<Option<InstanceRecord>, ApiError> {
            Ok(self.instances.lock().get(instance_id).map(|i| InstanceRecord {
                instance_id: instance_id.to_string(),
                agent_id: Some(i.agent_id.clone()),
                is_deleted: Some(i.deleted),
            }))
        }

        async fn soft_delete(&self, instance_id: &str) -> Result<DeletionResponse, ApiError> {
            let mut instances = self.instances.lock();
            let agent_id = match instances.get(instance_id) {
                Some(instance) => instance.agent_id.clone(),
                None => {
                    return Err(ApiError::Status {
                        status: 404,
                        body: "not found".to_string(),
                    })
                }
            };

            if self.leak_deletion_to_siblings {
                for instance in instances.values_mut().filter(|i| i.agent_id == agent_id) {
                    instance.deleted = true;
                }
            }

            let instance = instances
                .get_mut(instance_id)
                .ok_or_else(|| ApiError::Decode("vanished".to_string()))?;
            instance.deleted = true;
            let affected = instance.live_messages;
            instance.live_messages = 0;

            Ok(DeletionResponse {
                success: true,
                deletion_type: Some("soft".to_string()),
                is_deleted: Some(true),
                history_messages_affected: Some(affected),
                cascade_deleted: None,
            })
        }

        async fn hard_delete(
            &self,
            instance_id: &str,
            _cascade: bool,
        ) -> Result<DeletionResponse, ApiError> {
            let removed = self.instances.lock().remove(instance_id);
            Ok(DeletionResponse {
                success: removed.is_some(),
                deletion_type: Some("hard".to_string()),
                is_deleted: None,
                history_messages_affected: None,
                cascade_deleted: Some(serde_json::json!({
                    "history": removed.map(|i| i.messages).unwrap_or(0)
                })),
            })
        }
    }

    struct FakeSeeder(Arc<FakeApi>);

    #[async_trait]
    impl HistorySeeder for FakeSeeder {
        async fn seed_messages(&self, instance_id: &str, count: u32) -> Result<u64, ApiError> {
            let mut instances = self.0.instances.lock();
            let instance = instances
                .get_mut(instance_id)
                .ok_or_else(|| ApiError::Decode("unknown instance".to_string()))?;
            instance.messages += u64::from(count);
            instance.live_messages += u64::from(count);
            Ok(u64::from(count))
        }
    }

    fn outcomes(report: &VerificationReport, scenario: &str) -> Vec<CheckOutcome> {
        report
            .scenarios
            .iter()
            .find(|s| s.name == scenario)
            .map(|s| s.checks.iter().map(|c| c.outcome.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn correct_backend_passes_every_scenario_with_seeder() {
        let api = Arc::new(FakeApi::healthy());
        let harness = VerificationHarness::new(api.clone()).with_seeder(Arc::new(FakeSeeder(api)));

        let report = harness.run().await.unwrap();

        assert_eq!(report.total(), 5);
        assert!(report.all_passed(), "{:#?}", report);
        assert!(report
            .scenarios
            .iter()
            .flat_map(|s| &s.checks)
            .all(|c| c.outcome == CheckOutcome::Passed));
    }

    #[tokio::test]
    async fn message_checks_skip_without_seeder() {
        let harness = VerificationHarness::new(Arc::new(FakeApi::healthy()));

        let report = harness.run().await.unwrap();

        assert!(report.all_passed());
        assert!(outcomes(&report, "Idempotent Soft-Delete")
            .contains(&CheckOutcome::Skipped(NO_SEEDER.to_string())));
    }

    #[tokio::test]
    async fn unhealthy_backend_is_an_error() {
        let harness = VerificationHarness::new(Arc::new(FakeApi::default()));
        assert!(matches!(harness.run().await, Err(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn leaking_deletion_fails_isolation_only() {
        let api = Arc::new(FakeApi {
            healthy: true,
            leak_deletion_to_siblings: true,
            ..FakeApi::default()
        });

        let report = VerificationHarness::new(api).run().await.unwrap();

        assert_eq!(report.passed_count(), 4);
        let isolation = outcomes(&report, "Instance Isolation");
        assert!(matches!(isolation.last(), Some(CheckOutcome::Failed(_))));
        assert_eq!(report.to_string(), "RESULTS: 4/5 tests passed");
    }
}
