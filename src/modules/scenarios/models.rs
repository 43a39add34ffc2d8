use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{HarnessError, Result};
use crate::modules::flow::FlowOutcome;
use crate::modules::payment::{CustomerInfo, DonationRequest};

/// One named probe against the backend and gateway
///
/// Scenario variation is data, not control flow: every scenario runs the
/// same flow with a different donation, customer and expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    pub donation: DonationRequest,

    /// Customer fields for the gateway payload; derived from the donation's
    /// donor information when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerInfo>,

    /// Expected terminal outcome; scenarios without one pass whenever the
    /// flow reaches a gateway classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<FlowOutcome>,

    /// Concurrent scenarios adjacent in the list run as one batch
    #[serde(default)]
    pub concurrent: bool,

    /// Re-runs on network failure; retry is runner policy, never transport
    #[serde(default)]
    pub retries: u32,

    /// Poll the backend's status endpoint after gateway submission
    #[serde(default)]
    pub check_status: bool,
}

impl Scenario {
    pub fn new(name: impl Into<String>, donation: DonationRequest) -> Self {
        Self {
            name: name.into(),
            donation,
            customer: None,
            expect: None,
            concurrent: false,
            retries: 0,
            check_status: false,
        }
    }

    pub fn expecting(mut self, outcome: FlowOutcome) -> Self {
        self.expect = Some(outcome);
        self
    }

    pub fn concurrent(mut self) -> Self {
        self.concurrent = true;
        self
    }
}

/// A scenario battery loaded from a definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Overrides the configured concurrency limit for this set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    pub scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Load a scenario battery from a YAML definition file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let set: ScenarioSet = serde_yaml::from_str(&text).map_err(|e| {
            HarnessError::scenario(format!("{} is not a valid scenario file: {}", path.display(), e))
        })?;
        set.validate()?;
        Ok(set)
    }

    /// Definition-level validation: names present and unique
    ///
    /// Donation contents are deliberately not validated here; malformed
    /// donations are themselves scenarios with a validation-error
    /// expectation.
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            return Err(HarnessError::scenario("scenario set is empty"));
        }
        if self.concurrency == Some(0) {
            return Err(HarnessError::scenario("concurrency must be greater than 0"));
        }
        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if scenario.name.trim().is_empty() {
                return Err(HarnessError::scenario("scenario with an empty name"));
            }
            if !seen.insert(scenario.name.as_str()) {
                return Err(HarnessError::scenario(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of one scenario execution; never mutated after creation
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub expected: Option<FlowOutcome>,
    pub outcome: FlowOutcome,
    pub reference: Option<String>,
    pub observed_status: Option<u16>,
    pub checks: BTreeMap<String, bool>,
    pub backend_status: Option<String>,
    pub detail: Option<String>,
    pub elapsed_ms: u64,
    pub attempts: u32,
}

/// Aggregate over a run; a commutative reduction, so completion order of
/// concurrent scenarios cannot change it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub passed: usize,
    pub total: usize,
    pub failed_names: Vec<String>,
}
