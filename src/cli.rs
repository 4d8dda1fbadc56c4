//! CLI argument parsing for Benchgate

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the finished report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full report as pretty-printed JSON (default)
    Json,
    /// Human-readable summary
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "benchgate")]
#[command(version)]
#[command(
    about = "Benchmark fingerprinting, scoring and statistical regression gating",
    long_about = None
)]
pub struct Cli {
    /// Harness output: measurements, sources and annotations (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub measurements: PathBuf,

    /// Prior report scores to compare against (JSON array)
    #[arg(long, value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Run file with [run] and [comparison] tables (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run start in milliseconds since epoch (default: now)
    #[arg(long = "started-at", value_name = "MILLIS")]
    pub started_at: Option<u64>,

    /// Output format (json or text)
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
