use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use joinplot::{run, JobConfig, MessageLog, RunOutcome, StyleMode};

/// Command-line arguments for joinplot
#[derive(Parser, Debug)]
#[command(name = "joinplot")]
#[command(about = "Join a CSV table to GeoJSON features and plot a numeric field")]
#[command(version)]
struct Args {
    /// Attribute table (.csv, .json or .parquet)
    #[arg(short, long, env = "JOINPLOT_TABLE")]
    table: PathBuf,

    /// GeoJSON layer to join the table onto
    #[arg(short, long, env = "JOINPLOT_GEOMETRY")]
    geometry: Option<PathBuf>,

    /// Output workspace folder for the joined layer
    #[arg(short, long, default_value = ".", env = "JOINPLOT_WORKSPACE")]
    workspace: PathBuf,

    /// Join field present in both the table and the GeoJSON properties
    #[arg(short, long)]
    join_field: String,

    /// Numeric field of the table to plot
    #[arg(short, long)]
    numeric_field: String,

    /// Display option: "Single symbol", "Graduated colors" or "Unique values"
    #[arg(short, long, default_value = StyleMode::SINGLE_TOKEN)]
    style: String,

    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,

    /// Chart title (defaults to "<field> Distribution (<style>)")
    #[arg(long)]
    title: Option<String>,

    /// Fail instead of replacing existing outputs
    #[arg(long)]
    no_overwrite: bool,

    /// Give up reading the table after this many seconds
    #[arg(long, env = "JOINPLOT_SCAN_TIMEOUT")]
    scan_timeout_secs: Option<u64>,
}

impl From<Args> for JobConfig {
    fn from(args: Args) -> Self {
        JobConfig {
            table: args.table,
            geometry: args.geometry,
            workspace: args.workspace,
            join_field: args.join_field,
            numeric_field: args.numeric_field,
            style: args.style,
            output: args.output,
            title: args.title,
            overwrite: !args.no_overwrite,
            scan_timeout: args.scan_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = JobConfig::from(Args::parse());
    log::debug!("{config:?}");

    let mut messages = MessageLog::new();
    let outcome = run(&config, &mut messages)
        .with_context(|| format!("joinplot failed for {}", config.table.display()))?;

    Ok(match outcome {
        RunOutcome::Rendered { .. } | RunOutcome::NoData => ExitCode::SUCCESS,
        RunOutcome::Aborted => ExitCode::FAILURE,
    })
}
