//! onepay-harness - OnePay donation-gateway verification harness
//!
//! Runs scripted donation flows against a backend deployment and reports
//! how the gateway handshake holds up.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onepay_harness::config::HarnessConfig;
use onepay_harness::core::AmountRule;
use onepay_harness::scenarios::{builtin_scenarios, RunReport, ScenarioRunner, ScenarioSet};

/// OnePay donation-gateway verification harness
#[derive(Parser, Debug)]
#[command(name = "onepay-harness")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scenario battery against a backend deployment
    Run {
        /// Scenario definition file (YAML); defaults to the built-in battery
        #[arg(long)]
        scenarios: Option<PathBuf>,

        /// Backend base URL (overrides HARNESS_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Concurrency limit for concurrent scenario batches
        #[arg(long)]
        concurrency: Option<usize>,

        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the built-in scenario battery
    Scenarios {
        /// Amount rule the battery should assume
        #[arg(long, default_value = "minor-to-major")]
        amount_rule: AmountRule,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onepay_harness=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenarios,
            base_url,
            concurrency,
            json,
        } => run(scenarios, base_url, concurrency, json).await,
        Commands::Scenarios { amount_rule } => {
            list_scenarios(amount_rule);
            Ok(())
        }
    }
}

async fn run(
    scenarios_file: Option<PathBuf>,
    base_url: Option<String>,
    concurrency: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(base_url) = base_url {
        config.base_url = base_url;
    }
    if let Some(concurrency) = concurrency {
        config.concurrency = concurrency;
    }
    config.validate()?;

    let (scenarios, set_concurrency) = match &scenarios_file {
        Some(path) => {
            let set = ScenarioSet::from_yaml_file(path)?;
            (set.scenarios, set.concurrency)
        }
        None => (builtin_scenarios(config.gateway.amount_rule), None),
    };

    tracing::info!(
        target_url = %config.base_url,
        scenarios = scenarios.len(),
        token_scheme = %config.gateway.token_scheme,
        amount_rule = %config.gateway.amount_rule,
        "starting verification run"
    );

    let base_url = config.base_url.clone();
    let mut runner = ScenarioRunner::new(config)?;
    if let Some(limit) = set_concurrency {
        runner = runner.with_concurrency(limit);
    }

    let started_at = Utc::now();
    let started = std::time::Instant::now();
    let results = runner.run(&scenarios).await;
    let report = RunReport::new(
        base_url,
        started_at,
        started.elapsed().as_millis() as u64,
        results,
    );

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    if !report.expectations_met() {
        std::process::exit(1);
    }
    Ok(())
}

fn list_scenarios(amount_rule: AmountRule) {
    for scenario in builtin_scenarios(amount_rule) {
        let expectation = scenario
            .expect
            .map(|o| format!(" (expect {})", o))
            .unwrap_or_default();
        let concurrent = if scenario.concurrent { " [concurrent]" } else { "" };
        println!(
            "{:<28} {} {}{}{}",
            scenario.name,
            scenario.donation.currency,
            scenario.donation.amount_minor,
            expectation,
            concurrent
        );
    }
}
