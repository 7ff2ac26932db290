//! Scenario runner: isolated session per scenario, bounded concurrency, JSON report

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{E2eError, E2eResult, FailureKind};
use crate::scenarios::{self, Scenario};
use crate::session::SessionFactory;

/// Why a scenario failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&E2eError> for FailureReport {
    fn from(err: &E2eError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub persona: Option<String>,
    pub success: bool,
    pub duration_ms: u64,
    pub failure: Option<FailureReport>,
}

/// Result of running a batch of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl ScenarioSuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn result(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

pub struct ScenarioRunner {
    sessions: SessionFactory,
    /// Scenarios in flight at once
    concurrency: usize,
    output_dir: PathBuf,
}

impl ScenarioRunner {
    pub fn new(sessions: SessionFactory) -> Self {
        Self {
            sessions,
            concurrency: 1,
            output_dir: PathBuf::from("test-results"),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Run every built-in scenario
    pub async fn run_all(&self) -> ScenarioSuiteResult {
        self.run_scenarios(&scenarios::catalog()).await
    }

    /// Run the built-in scenarios carrying `tag`
    pub async fn run_tagged(&self, tag: &str) -> ScenarioSuiteResult {
        self.run_scenarios(&scenarios::tagged(tag)).await
    }

    /// Run one built-in scenario by name
    pub async fn run_named(&self, name: &str) -> E2eResult<ScenarioResult> {
        let scenario = scenarios::find(name)
            .ok_or_else(|| E2eError::Config(format!("Scenario not found: {}", name)))?;
        Ok(self.run_scenario(&scenario).await)
    }

    /// Run `scenarios`, keeping their order in the report
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> ScenarioSuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(
            "Running {} scenario(s), {} at a time...",
            scenarios.len(),
            self.concurrency
        );

        let results: Vec<ScenarioResult> = stream::iter(scenarios)
            .map(|scenario| self.run_scenario(scenario))
            .buffered(self.concurrency)
            .collect()
            .await;

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, 0 skipped ({} ms)",
            passed, failed, duration_ms
        );

        ScenarioSuiteResult {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            skipped: 0,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario in its own session
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!(scenario = scenario.name, "Running scenario");

        let credential = scenario.persona.map(|p| p.credential());
        let outcome = self
            .sessions
            .scoped(scenario.name, credential.as_ref(), scenario.body)
            .await;

        let duration_ms = start.elapsed().as_millis() as u64;
        let failure = match &outcome {
            Ok(()) => {
                info!("✓ {} ({} ms)", scenario.name, duration_ms);
                None
            }
            Err(err) => {
                error!("✗ {} - {}", scenario.name, err);
                Some(FailureReport::from(err))
            }
        };

        ScenarioResult {
            name: scenario.name.to_string(),
            persona: scenario.persona.map(|p| p.identifier().to_string()),
            success: failure.is_none(),
            duration_ms,
            failure,
        }
    }

    /// Write `results` to `scenario-results.json` in the output directory
    pub fn write_results(&self, results: &ScenarioSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::session::SessionSettings;
    use crate::testing::FakeStorefrontFactory;
    use crate::wait::WaitBudget;

    fn runner(fake: &FakeStorefrontFactory) -> ScenarioRunner {
        let settings = SessionSettings {
            base_url: storefront_common::DEFAULT_BASE_URL.to_string(),
            budget: WaitBudget::new(Duration::from_secs(2), Duration::from_millis(10)),
            scenario_timeout: Duration::from_secs(10),
        };
        ScenarioRunner::new(SessionFactory::new(Arc::new(fake.clone()), settings))
    }

    #[tokio::test]
    async fn catalog_passes_against_the_fake() {
        let fake = FakeStorefrontFactory::default().with_glitch_delay(Duration::from_millis(50));
        let suite = runner(&fake).with_concurrency(4).run_all().await;

        let failures: Vec<_> = suite.results.iter().filter(|r| !r.success).collect();
        assert!(failures.is_empty(), "failed: {:?}", failures);
        assert_eq!(suite.total, scenarios::catalog().len());
        assert_eq!(fake.opened(), suite.total);
        assert_eq!(fake.live(), 0);
    }

    #[tokio::test]
    async fn results_keep_catalog_order() {
        let fake = FakeStorefrontFactory::default();
        let suite = runner(&fake).with_concurrency(3).run_tagged("sort").await;
        let names: Vec<_> = suite.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["sort-price-ascending", "sort-price-descending", "sort-name-descending"]
        );
    }

    #[tokio::test]
    async fn pricing_defect_is_reported_as_derived_value() {
        let fake = FakeStorefrontFactory::default().with_total_skew(1);
        let result = runner(&fake).run_named("checkout-purchase").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.failure.map(|f| f.kind), Some(FailureKind::DerivedValue));
        assert_eq!(fake.live(), 0);
    }

    #[tokio::test]
    async fn unknown_scenario_is_a_config_error() {
        let fake = FakeStorefrontFactory::default();
        let err = runner(&fake).run_named("nope").await.unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
        assert_eq!(fake.opened(), 0);
    }

    #[tokio::test]
    async fn writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeStorefrontFactory::default();
        let runner = runner(&fake).with_output_dir(dir.path());
        let suite = runner.run_tagged("negative").await;

        let path = runner.write_results(&suite).unwrap();
        assert_eq!(path.file_name().unwrap(), "scenario-results.json");
        let parsed: ScenarioSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.total, suite.total);
        assert_eq!(parsed.passed, suite.passed);
    }
}
