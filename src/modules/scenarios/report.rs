use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use uuid::Uuid;

use crate::core::Result;

use super::models::{RunSummary, ScenarioResult};
use super::runner::ScenarioRunner;

/// A complete run report: results in declaration order plus the summary
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn new(
        base_url: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        results: Vec<ScenarioResult>,
    ) -> Self {
        let summary = ScenarioRunner::summarize(&results);
        Self {
            run_id: Uuid::new_v4().to_string(),
            base_url: base_url.into(),
            started_at,
            duration_ms,
            results,
            summary,
        }
    }

    /// True iff every scenario with an explicit expectation passed
    ///
    /// This drives the process exit code; expectation-free scenarios are
    /// reported but cannot fail the run from a CI perspective.
    pub fn expectations_met(&self) -> bool {
        self.results
            .iter()
            .filter(|r| r.expected.is_some())
            .all(|r| r.passed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report for terminal output
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "OnePay gateway verification report ({})", self.run_id);
        let _ = writeln!(out, "Target: {}", self.base_url);
        let _ = writeln!(out);

        let name_width = self
            .results
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        for result in &self.results {
            let verdict = if result.passed { "PASS" } else { "FAIL" };
            let status = result
                .observed_status
                .map(|s| format!("({})", s))
                .unwrap_or_default();

            let _ = write!(
                out,
                "{} {:<width$} {:<16} {:<6} {:>6}ms",
                verdict,
                result.name,
                result.outcome.to_string(),
                status,
                result.elapsed_ms,
                width = name_width,
            );
            if let Some(expected) = result.expected {
                if !result.passed {
                    let _ = write!(out, "  expected {}", expected);
                }
            }
            if result.attempts > 1 {
                let _ = write!(out, "  ({} attempts)", result.attempts);
            }
            let _ = writeln!(out);

            if let Some(detail) = &result.detail {
                let _ = writeln!(out, "     {}", detail);
            }
            let failed_checks: Vec<&str> = result
                .checks
                .iter()
                .filter(|(_, ok)| !**ok)
                .map(|(name, _)| name.as_str())
                .collect();
            if !failed_checks.is_empty() {
                let _ = writeln!(out, "     failed checks: {}", failed_checks.join(", "));
            }
            if let Some(status) = &result.backend_status {
                let _ = writeln!(out, "     backend donation status: {}", status);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}/{} scenarios passed in {}ms",
            self.summary.passed, self.summary.total, self.duration_ms
        );
        if !self.summary.failed_names.is_empty() {
            let _ = writeln!(out, "Failed: {}", self.summary.failed_names.join(", "));
        }
        out
    }
}
