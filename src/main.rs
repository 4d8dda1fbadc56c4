use anyhow::{Context, Result};
use benchgate::cli::{Cli, OutputFormat};
use benchgate::engine::{Engine, HarnessOutput, RunInput};
use benchgate::error::BenchError;
use benchgate::regression::InMemoryHistory;
use benchgate::settings::RunFile;
use clap::Parser;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; warnings are always shown, --debug shows everything
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Load inputs, run the engine, print the report
///
/// Returns the run's verdict separately so the report is always printed
/// before a failing verdict becomes an exit status.
fn run(args: &Cli) -> Result<std::result::Result<(), BenchError>> {
    let text = std::fs::read_to_string(&args.measurements)
        .with_context(|| format!("Failed to read measurements {}", args.measurements.display()))?;
    let harness = HarnessOutput::from_json(&text)?;

    let run_file = match &args.config {
        Some(path) => RunFile::load(path)
            .with_context(|| format!("Failed to load run file {}", path.display()))?,
        None => RunFile::default(),
    };

    let history = match &args.history {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read history {}", path.display()))?;
            InMemoryHistory::from_json(&json).map_err(BenchError::from)?
        }
        None => InMemoryHistory::default(),
    };
    tracing::debug!("Loaded {} history records", history.len());

    let input = RunInput {
        measurements: harness.measurements,
        sources: harness.sources.into_iter().map(Into::into).collect(),
        annotations: harness.annotations,
        settings: run_file.run,
        comparison: run_file.comparison,
        started_at: args.started_at.unwrap_or_else(now_millis),
    };

    let outcome = Engine::new().run(input, &history);

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome.report)
                .context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", outcome.to_report_string()),
    }

    Ok(outcome.into_result().map(|_| ()))
}

fn main() {
    let args = Cli::parse();
    init_tracing(args.debug);

    let code = match run(&args) {
        Ok(Ok(())) => 0,
        Ok(Err(verdict)) => {
            eprintln!("Error: {}", verdict);
            verdict.exit_code()
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<BenchError>()
                .map(BenchError::exit_code)
                .unwrap_or(1)
        }
    };
    std::process::exit(code);
}
