//! Command-line front end: read a layout request, solve it, print the outcome.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use layout_core::{LayoutOutcome, LayoutRequest, LayoutSolver, OverlapMeasure};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "layout")]
#[command(about = "Place furniture in a room under relationship constraints")]
#[command(version)]
struct Cli {
    /// Request JSON file; reads stdin when omitted
    input: Option<PathBuf>,

    /// Write the outcome here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the iteration count
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Wall-clock limit in milliseconds
    #[arg(short, long)]
    time_limit: Option<u64>,

    /// Overlap measure used by the solver
    #[arg(long, value_enum)]
    overlap: Option<OverlapArg>,

    /// Pretty-print the outcome
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OverlapArg {
    /// Boolean polygon test
    Intersects,
    /// Clipped intersection area
    Area,
}

impl From<OverlapArg> for OverlapMeasure {
    fn from(arg: OverlapArg) -> Self {
        match arg {
            OverlapArg::Intersects => OverlapMeasure::Intersects,
            OverlapArg::Area => OverlapMeasure::ClippedArea,
        }
    }
}

fn read_request(input: Option<&PathBuf>) -> Result<LayoutRequest> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("parsing layout request")
}

fn apply_overrides(request: &mut LayoutRequest, cli: &Cli) {
    let mut config = request.config.take().unwrap_or_default();
    if let Some(iterations) = cli.iterations {
        config = config.with_iterations(iterations);
    }
    if let Some(ms) = cli.time_limit {
        config = config.with_time_limit(ms);
    }
    if let Some(measure) = cli.overlap {
        config = config.with_overlap_measure(measure.into());
    }
    request.config = Some(config);
}

fn write_outcome(outcome: &LayoutOutcome, cli: &Cli) -> Result<()> {
    let json = if cli.pretty {
        serde_json::to_string_pretty(outcome)?
    } else {
        serde_json::to_string(outcome)?
    };
    match &cli.output {
        Some(path) => std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut request = read_request(cli.input.as_ref())?;
    apply_overrides(&mut request, &cli);

    info!(
        entities = request.entities.len(),
        constraints = request.constraints.len(),
        "solving layout"
    );
    let outcome = LayoutSolver::solve(&request).context("invalid layout request")?;

    let rejected = outcome.transcript.iter().filter(|e| !e.decision.is_accepted()).count();
    if rejected > 0 {
        warn!(rejected, "some constraints were rejected");
    }

    write_outcome(&outcome, &cli)
}
