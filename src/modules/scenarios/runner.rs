use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::HarnessConfig;
use crate::core::Result;
use crate::modules::flow::{DonationFlowClient, FlowOutcome};

use super::models::{RunSummary, Scenario, ScenarioResult};

/// Executes a named battery of flow runs and aggregates the verdicts
///
/// Flow runs are independent end-to-end, so adjacent scenarios marked
/// concurrent execute as one bounded-concurrency batch. The runner owns
/// retry policy; the transport below it never retries.
pub struct ScenarioRunner {
    client: DonationFlowClient,
    concurrency: usize,
}

impl ScenarioRunner {
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let concurrency = config.concurrency;
        let client = DonationFlowClient::new(config)?;
        Ok(Self {
            client,
            concurrency,
        })
    }

    /// Override the concurrency limit, e.g. from a scenario file
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Run every scenario and return results in declaration order
    ///
    /// Completion order of a concurrent batch never affects the returned
    /// order or the summary.
    pub async fn run(&self, scenarios: &[Scenario]) -> Vec<ScenarioResult> {
        let mut indexed: Vec<(usize, ScenarioResult)> = Vec::with_capacity(scenarios.len());

        let mut i = 0;
        while i < scenarios.len() {
            if scenarios[i].concurrent {
                let mut j = i;
                while j < scenarios.len() && scenarios[j].concurrent {
                    j += 1;
                }
                let limit = self.concurrency.min(j - i).max(1);
                info!(batch = j - i, limit, "running concurrent scenario batch");

                let batch: Vec<(usize, ScenarioResult)> =
                    stream::iter(scenarios[i..j].iter().enumerate().map(|(offset, scenario)| {
                        let fut = self.run_one(scenario);
                        async move { (i + offset, fut.await) }
                    }))
                    .buffer_unordered(limit)
                    .collect()
                    .await;
                indexed.extend(batch);
                i = j;
            } else {
                indexed.push((i, self.run_one(&scenarios[i]).await));
                i += 1;
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    async fn run_one(&self, scenario: &Scenario) -> ScenarioResult {
        info!(scenario = %scenario.name, "running scenario");
        let mut attempts = 0;
        loop {
            attempts += 1;
            let report = self
                .client
                .run(
                    &scenario.donation,
                    scenario.customer.as_ref(),
                    scenario.check_status,
                )
                .await;

            if report.outcome == FlowOutcome::NetworkFailed && attempts <= scenario.retries {
                warn!(
                    scenario = %scenario.name,
                    attempt = attempts,
                    "network failure, retrying"
                );
                continue;
            }

            let passed = match scenario.expect {
                Some(expected) => report.outcome == expected,
                None => report.outcome.is_gateway_terminal(),
            };

            return ScenarioResult {
                name: scenario.name.clone(),
                passed,
                expected: scenario.expect,
                outcome: report.outcome,
                reference: report.reference,
                observed_status: report.observed_status,
                checks: report.checks,
                backend_status: report.backend_status,
                detail: report.detail,
                elapsed_ms: report.elapsed_ms,
                attempts,
            };
        }
    }

    /// Fold results into a summary; commutative over result order
    pub fn summarize(results: &[ScenarioResult]) -> RunSummary {
        RunSummary {
            passed: results.iter().filter(|r| r.passed).count(),
            total: results.len(),
            failed_names: results
                .iter()
                .filter(|r| !r.passed)
                .map(|r| r.name.clone())
                .collect(),
        }
    }
}
