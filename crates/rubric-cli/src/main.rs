//! rubric CLI entry point
//!
//! Loads the config directory, wires the chat client and tracker, runs
//! the variant × case evaluation loop, and writes the local report.
//! Exits non-zero when any pair failed.

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use args::Cli;
use rubric_core::config::ConfigLoader;
use rubric_core::llm::OpenAiClient;
use rubric_core::runner::EvalRunner;
use rubric_core::tracking::MlflowTracker;
use rubric_core::{report, secrets, RubricResult};

#[tokio::main]
async fn main() -> ExitCode {
    // Set RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("rubric: {} pair(s) failed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("rubric: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the evaluation and return the number of failed pairs
async fn run(cli: Cli) -> RubricResult<usize> {
    let config = ConfigLoader::new(&cli.config_dir).load()?;
    let output_dir = config.settings.output_dir.clone();

    let api_key = secrets::resolve_api_key()?;
    let client = Arc::new(OpenAiClient::new(api_key));
    let tracker = Arc::new(MlflowTracker::connect(&config.settings.tracking).await?);

    let runner = EvalRunner::new(config, client, tracker);
    let run_report = runner.run().await;

    report::write_report(&run_report, &output_dir)?;

    println!(
        "evaluated {} pair(s): {} succeeded, {} failed",
        run_report.outcomes.len(),
        run_report.succeeded(),
        run_report.failed()
    );
    let mut means: Vec<_> = run_report.mean_aggregate_by_variant().into_iter().collect();
    means.sort_by(|a, b| a.0.cmp(&b.0));
    for (variant, mean) in means {
        println!("  {}: mean aggregate {:.2}", variant, mean);
    }

    Ok(run_report.failed())
}
