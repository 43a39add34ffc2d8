pub mod builtin;
pub mod models;
pub mod report;
pub mod runner;

pub use builtin::builtin_scenarios;
pub use models::{RunSummary, Scenario, ScenarioResult, ScenarioSet};
pub use report::RunReport;
pub use runner::ScenarioRunner;
