use anyhow::{bail, Context};
use clap::Parser;
use ra_sweep::{FailurePolicy, SweepConfig, SweepRunner, SweepState};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sweep simulated-annealing hyperparameters of the referee-assignment solver"
)]
struct Args {
    /// Sweep configuration (JSON). Built-in defaults are used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the solver command lines without running them
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Stop the sweep at the first failed trial
    #[arg(long, default_value_t = false)]
    halt_on_error: bool,

    /// Number of trials to run at once (overrides config)
    #[arg(long)]
    jobs: Option<usize>,

    /// Forward each trial's seed to the solver as --main::seed
    #[arg(long, default_value_t = false)]
    pass_seed: bool,

    /// Write the default configuration to PATH and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Some(path) = &args.write_default_config {
        SweepConfig::default()
            .save(path)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => SweepConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            tracing::info!("No --config given, using built-in sweep defaults");
            SweepConfig::default()
        }
    };
    if args.halt_on_error {
        config.failure_policy = FailurePolicy::Halt;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    if args.pass_seed {
        config.solver.pass_seed = true;
    }

    let mut runner = SweepRunner::from_config(config).context("invalid sweep configuration")?;

    if args.dry_run {
        let invocations = runner.planned_invocations()?;
        for invocation in &invocations {
            println!("{}", invocation.command_line());
        }
        println!("{} trial(s) planned", invocations.len());
        return Ok(());
    }

    let status = runner.run().context("sweep aborted")?;
    println!(
        "{} completed, {} failed, {} skipped; results in {}",
        status.completed,
        status.failed,
        status.skipped,
        runner.log().path().display()
    );
    if status.state == SweepState::Halted {
        bail!(
            "sweep halted: {}",
            status.error.as_deref().unwrap_or("trial failed")
        );
    }
    Ok(())
}
