//! Construction and execution of solver invocations.

use ra_types::{format_float, SolverMethod, SweepError, SweepResult};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{ExtraArg, SolverConfig};
use crate::grid::GridCell;
use crate::schedule::Schedule;

/// A fully resolved solver command: program plus ordered `--key value` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverInvocation {
    pub program: PathBuf,
    pub args: Vec<(String, String)>,
    pub output_path: PathBuf,
}

impl SolverInvocation {
    /// Value of the first argument with the given key.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Arguments as passed to the process.
    pub fn render_args(&self) -> Vec<String> {
        self.args
            .iter()
            .flat_map(|(key, value)| [format!("--{key}"), value.clone()])
            .collect()
    }

    /// Human-readable command line, for logs only.
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in self.render_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}

/// Builds invocations for grid cells.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationBuilder {
    program: PathBuf,
    method: SolverMethod,
    pass_seed: bool,
    extra_args: Vec<ExtraArg>,
}

impl InvocationBuilder {
    pub fn new(program: impl Into<PathBuf>, method: SolverMethod) -> Self {
        Self {
            program: program.into(),
            method,
            pass_seed: false,
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            program: config.program.clone(),
            method: config.method,
            pass_seed: config.pass_seed,
            extra_args: config.extra_args.clone(),
        }
    }

    pub fn with_seed_passthrough(mut self, enabled: bool) -> Self {
        self.pass_seed = enabled;
        self
    }

    pub fn with_extra_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_args.push(ExtraArg {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn build(
        &self,
        cell: &GridCell,
        schedule: &Schedule,
        seed: u64,
        output_path: &Path,
    ) -> SolverInvocation {
        let ns = self.method.parameter_namespace();
        let hp = &cell.hyperparameters;

        let mut args = vec![
            ("main::instance".to_string(), cell.instance.path.display().to_string()),
            ("main::method".to_string(), self.method.selector().to_string()),
            (format!("{ns}::start_temperature"), format_float(hp.start_temperature)),
            (format!("{ns}::min_temperature"), format_float(schedule.min_temperature)),
            (format!("{ns}::cooling_rate"), format_float(hp.cooling_rate)),
            (format!("{ns}::neighbors_sampled"), schedule.neighbors_sampled.to_string()),
            (format!("{ns}::neighbors_accepted"), schedule.neighbors_accepted.to_string()),
        ];
        if self.pass_seed {
            args.push(("main::seed".to_string(), seed.to_string()));
        }
        args.extend(
            self.extra_args
                .iter()
                .map(|a| (a.key.clone(), a.value.clone())),
        );
        args.push(("main::output_file".to_string(), output_path.display().to_string()));

        SolverInvocation {
            program: self.program.clone(),
            args,
            output_path: output_path.to_path_buf(),
        }
    }
}

/// Something that can run a solver invocation to completion.
pub trait Solver: Send + Sync {
    /// Run the solver and block until it finishes. On success the solution
    /// file exists at `invocation.output_path`.
    fn run(&self, invocation: &SolverInvocation) -> SweepResult<()>;
}

/// Runs the solver as a child process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSolver;

impl Solver for ProcessSolver {
    fn run(&self, invocation: &SolverInvocation) -> SweepResult<()> {
        let output = Command::new(&invocation.program)
            .args(invocation.render_args())
            .output()
            .map_err(|e| SweepError::SolverLaunch {
                program: invocation.program.display().to_string(),
                source: e,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!("solver stdout: {}", stdout.trim_end());
        }

        if !output.status.success() {
            return Err(SweepError::SolverExecution {
                command: invocation.command_line(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(())
    }
}
