//! Sweep execution: one solver run per grid cell, results appended to the log.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ra_types::{config_error, RunRecord, SweepError, SweepResult};
use rayon::prelude::*;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

use crate::config::{FailurePolicy, SweepConfig};
use crate::grid::{GridCell, GridPlan, ParameterGrid};
use crate::invoker::{InvocationBuilder, ProcessSolver, Solver, SolverInvocation};
use crate::logger::ExperimentLog;
use crate::parser::read_solution_file;
use crate::schedule::compute_schedule;
use crate::trial::{SweepStatus, TrialOutcome};

/// Upper bound (inclusive) of generated trial seeds.
pub const MAX_SEED: u64 = 100_000_000;

/// Drives a whole sweep against one solver.
pub struct SweepRunner<S: Solver> {
    config: SweepConfig,
    solver: S,
    builder: InvocationBuilder,
    log: ExperimentLog,
    last_status: Option<SweepStatus>,
}

impl SweepRunner<ProcessSolver> {
    /// Runner launching the configured solver program as a child process.
    pub fn from_config(config: SweepConfig) -> SweepResult<Self> {
        Self::new(config, ProcessSolver)
    }
}

impl<S: Solver> SweepRunner<S> {
    /// Validate the configuration and prepare a runner logging under today's date.
    pub fn new(config: SweepConfig, solver: S) -> SweepResult<Self> {
        config.validate()?;
        let builder = InvocationBuilder::from_config(&config.solver);
        let log = ExperimentLog::today(&config.log_dir);
        Ok(Self {
            config,
            solver,
            builder,
            log,
            last_status: None,
        })
    }

    pub fn with_log(mut self, log: ExperimentLog) -> Self {
        self.log = log;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn log(&self) -> &ExperimentLog {
        &self.log
    }

    /// Status of the most recent `run`, including one that ended in an error.
    pub fn last_status(&self) -> Option<&SweepStatus> {
        self.last_status.as_ref()
    }

    pub fn plan(&self) -> GridPlan {
        ParameterGrid::from_config(&self.config).plan()
    }

    /// Invocations the sweep would launch, without running anything.
    pub fn planned_invocations(&self) -> SweepResult<Vec<SolverInvocation>> {
        let plan = self.plan();
        let seeds = self.draw_seeds(plan.cells.len());
        plan.cells
            .iter()
            .zip(seeds)
            .map(|(cell, seed)| {
                let schedule =
                    compute_schedule(&cell.hyperparameters, self.config.total_iterations)?;
                Ok(self.builder.build(cell, &schedule, seed, &self.output_path(cell)))
            })
            .collect()
    }

    /// Run every cell of the grid.
    ///
    /// Cell-level failures are logged and, under [`FailurePolicy::Halt`],
    /// stop the sweep with a `Halted` status. Errors that are not local to a
    /// cell (log I/O, invalid configuration) abort the sweep and are returned.
    pub fn run(&mut self) -> SweepResult<SweepStatus> {
        fs::create_dir_all(&self.config.solution_dir)?;
        self.log.initialize()?;

        if !self.config.solver.pass_seed {
            warn!(
                "Per-trial seeds are recorded in the log but not passed to the solver; \
                 enable solver.pass_seed to forward them as --main::seed"
            );
        }

        let plan = self.plan();
        for instance in &plan.missing {
            warn!("Skipping missing instance {}", instance.path.display());
        }

        let mut status = SweepStatus::new(plan.cells.len(), plan.skipped_cells);
        status.mark_running();
        info!(
            "Starting sweep: {} cells, {} skipped, {} job(s), log {}",
            plan.cells.len(),
            plan.skipped_cells,
            self.config.jobs,
            self.log.path().display()
        );

        let seeds = self.draw_seeds(plan.cells.len());
        let result = if self.config.jobs <= 1 {
            self.run_sequential(&plan.cells, &seeds, &mut status)
        } else {
            self.run_parallel(&plan.cells, &seeds, &mut status)
        };

        match result {
            Ok(None) => status.mark_completed(),
            Ok(Some(reason)) => {
                warn!("Sweep halted: {reason}");
                status.mark_halted(reason);
            }
            Err(e) => {
                error!("Sweep aborted: {e}");
                status.mark_failed(e.to_string());
                self.last_status = Some(status);
                return Err(e);
            }
        }

        info!(
            "Sweep finished: {} completed, {} failed, {} skipped",
            status.completed, status.failed, status.skipped
        );
        if let Some(best) = &status.best {
            info!(
                "Best cost {} on {} (start {}, range {}, cooling {})",
                best.cost,
                best.instance,
                best.hyperparameters.start_temperature,
                best.hyperparameters.temperature_range,
                best.hyperparameters.cooling_rate
            );
        }
        self.last_status = Some(status.clone());
        Ok(status)
    }

    /// Invoke the solver for one cell and parse its solution file.
    pub fn run_cell(&self, cell: &GridCell, seed: u64) -> SweepResult<RunRecord> {
        if !cell.instance.exists() {
            return Err(SweepError::MissingInstance {
                path: cell.instance.path.clone(),
            });
        }
        let schedule = compute_schedule(&cell.hyperparameters, self.config.total_iterations)?;
        let output = self.output_path(cell);
        if output.exists() {
            // Never parse a file left over from an earlier sweep.
            fs::remove_file(&output)?;
        }

        let invocation = self.builder.build(cell, &schedule, seed, &output);
        info!("{}", invocation.command_line());
        self.solver.run(&invocation)?;

        let summary = read_solution_file(&output)?;
        Ok(RunRecord::new(
            cell.repetition,
            cell.instance.name.clone(),
            seed,
            summary,
            cell.hyperparameters,
        ))
    }

    fn output_path(&self, cell: &GridCell) -> std::path::PathBuf {
        self.config
            .solution_dir
            .join(cell.output_file_name(&self.config.solution_extension))
    }

    fn draw_seeds(&self, count: usize) -> Vec<u64> {
        let mut rng = match self.config.base_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        (0..count).map(|_| rng.random_range(0..=MAX_SEED)).collect()
    }

    fn execute(&self, cell: &GridCell, seed: u64) -> TrialOutcome {
        match self.run_cell(cell, seed) {
            Ok(record) => TrialOutcome::Completed(record),
            Err(error) => TrialOutcome::Failed {
                cell: cell.clone(),
                error,
            },
        }
    }

    /// Log one outcome. Returns a halt reason when the policy stops the sweep.
    fn record_outcome(
        &self,
        status: &mut SweepStatus,
        outcome: TrialOutcome,
    ) -> SweepResult<Option<String>> {
        match outcome {
            TrialOutcome::Completed(record) => {
                self.log.append(&record)?;
                info!(
                    "Trial {} {} done: cost {} time {}",
                    record.repetition, record.instance, record.cost, record.time
                );
                status.record_success(&record);
                Ok(None)
            }
            TrialOutcome::Failed { cell, error } if error.is_cell_local() => {
                error!("Trial {cell} failed: {error}");
                self.log.append_failure(&cell, &error)?;
                status.record_failure();
                match self.config.failure_policy {
                    FailurePolicy::Continue => Ok(None),
                    FailurePolicy::Halt => Ok(Some(format!("{cell}: {error}"))),
                }
            }
            TrialOutcome::Failed { error, .. } => Err(error),
        }
    }

    fn run_sequential(
        &self,
        cells: &[GridCell],
        seeds: &[u64],
        status: &mut SweepStatus,
    ) -> SweepResult<Option<String>> {
        for (cell, &seed) in cells.iter().zip(seeds) {
            if let Some(reason) = self.record_outcome(status, self.execute(cell, seed))? {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// Run cells on a bounded pool; a single writer thread owns all log appends.
    fn run_parallel(
        &self,
        cells: &[GridCell],
        seeds: &[u64],
        status: &mut SweepStatus,
    ) -> SweepResult<Option<String>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
            .map_err(|e| config_error!("cannot build worker pool: {e}"))?;
        let (tx, rx) = crossbeam_channel::bounded::<TrialOutcome>(self.config.jobs * 2);
        let stop_flag = AtomicBool::new(false);
        let stop = &stop_flag;

        std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> SweepResult<Option<String>> {
                let mut halt: Option<String> = None;
                for outcome in rx.iter() {
                    match self.record_outcome(status, outcome) {
                        Ok(None) => {}
                        Ok(Some(reason)) => {
                            stop.store(true, Ordering::Relaxed);
                            halt.get_or_insert(reason);
                        }
                        Err(e) => {
                            stop.store(true, Ordering::Relaxed);
                            return Err(e);
                        }
                    }
                }
                Ok(halt)
            });

            pool.install(|| {
                cells
                    .par_iter()
                    .zip(seeds.par_iter())
                    .for_each_with(tx, |tx, (cell, &seed)| {
                        if stop.load(Ordering::Relaxed) {
                            return;
                        }
                        // The writer only hangs up after a fatal error.
                        let _ = tx.send(self.execute(cell, seed));
                    });
            });

            writer
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    }
}
