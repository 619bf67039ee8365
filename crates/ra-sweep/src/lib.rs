//! # ra-sweep
//!
//! Hyperparameter sweep orchestration for the referee-assignment
//! simulated-annealing solver.
//!
//! Enumerates the instance × hyperparameter × repetition grid, derives each
//! cell's annealing schedule, launches the external solver once per cell,
//! parses its solution file and appends one row per completed trial to a
//! date-named log.

mod config;
mod grid;
mod invoker;
mod logger;
mod parser;
mod runner;
mod schedule;
mod trial;

pub use config::{ExtraArg, FailurePolicy, SolverConfig, SweepConfig};
pub use grid::{GridCell, GridIndex, GridPlan, ParameterGrid};
pub use invoker::{InvocationBuilder, ProcessSolver, Solver, SolverInvocation};
pub use logger::{format_row, ExperimentLog, LogState, LOG_HEADER};
pub use parser::{parse_solution, read_solution_file};
pub use runner::{SweepRunner, MAX_SEED};
pub use schedule::{
    compute_schedule, stage_count, validate_hyperparameters, Schedule, ACCEPTANCE_RATIO,
};
pub use trial::{SweepState, SweepStatus, TrialOutcome};
