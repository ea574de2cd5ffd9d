use clap::{ArgGroup, Parser};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use te_sim::sim::{self, Builtin, DemandSpec, ScenarioError, ScenarioSpec};
use te_sim::te::{Report, StopReason, TeEngine};

#[derive(Debug, Parser)]
#[command(
    name = "te-sim",
    about = "Split commodity demand over k shortest paths with curvature-scaled traffic engineering"
)]
#[command(group(ArgGroup::new("input").required(true).args(["scenario", "builtin"])))]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Run a built-in scenario instead of a file
    #[arg(long, value_enum)]
    builtin: Option<Builtin>,

    /// Override the iteration budget
    #[arg(long)]
    iterations: Option<usize>,

    /// Override the gradient step size
    #[arg(long)]
    step_size: Option<f64>,

    /// Stop early once the max relative per-link flow change drops below this value
    #[arg(long)]
    tolerance: Option<f64>,

    /// Override the number of candidate paths per commodity
    #[arg(long)]
    k: Option<usize>,

    /// Override the demand sampling seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of most utilized links to print
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Write the per-iteration history as JSON
    #[arg(long)]
    history_json: Option<PathBuf>,
}

fn apply_overrides(spec: &mut ScenarioSpec, args: &Args) {
    if let Some(iterations) = args.iterations {
        spec.engine.iterations = iterations;
    }
    if let Some(step_size) = args.step_size {
        spec.engine.step_size = step_size;
    }
    if args.tolerance.is_some() {
        spec.engine.tolerance = args.tolerance;
    }
    if let Some(k) = args.k {
        spec.paths.k = k;
    }
    if let Some(new_seed) = args.seed {
        match &mut spec.demand {
            DemandSpec::Random { seed, .. } | DemandSpec::Strategic { seed, .. } => {
                *seed = Some(new_seed);
            }
            DemandSpec::Reference | DemandSpec::Explicit { .. } => {}
        }
    }
}

fn run(args: &Args) -> Result<(), ScenarioError> {
    let mut spec = match &args.scenario {
        Some(path) => sim::load(path)?,
        None => ScenarioSpec::builtin(args.builtin.unwrap_or(Builtin::Reference)),
    };
    apply_overrides(&mut spec, args);

    let name = spec
        .meta
        .as_ref()
        .and_then(|m| m.name.clone())
        .unwrap_or_else(|| "unnamed".to_string());

    let mut setup = sim::build(&spec)?;
    let engine = TeEngine::new(&setup.commodities, setup.engine)?;
    let outcome = engine.run(&mut setup.commodities)?;
    let report = Report::new(&setup.commodities, &outcome.history, args.top);

    let stop = match outcome.stop {
        StopReason::BudgetExhausted => "budget".to_string(),
        StopReason::Converged { iteration } => format!("converged@{iteration}"),
    };
    println!(
        "summary scenario={} commodities={} paths={} excluded={} links={} iterations={} stop={} all_satisfied={} degenerate={}",
        name,
        setup.commodities.len(),
        setup.commodities.total_paths(),
        setup.excluded.len(),
        outcome.history.links().len(),
        outcome.history.len(),
        stop,
        report.all_satisfied(),
        report.degenerate_updates
    );
    println!("{report}");

    if let Some(path) = &args.history_json {
        let json = serde_json::to_string_pretty(&outcome)?;
        fs::write(path, json).map_err(|source| ScenarioError::Io {
            path: path.clone(),
            source,
        })?;
        eprintln!("wrote history to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
