//! Sweep configuration: instance list, directories, iteration budget and the
//! hyperparameter candidate arrays.

use ra_types::{config_error, HyperparameterSet, Instance, SolverMethod, SweepResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::schedule::compute_schedule;

/// What to do when a single grid cell fails to run or parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and move on to the next cell.
    #[default]
    Continue,
    /// Stop the sweep at the first failed cell.
    Halt,
}

/// An extra `--key value` pair forwarded verbatim to the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraArg {
    pub key: String,
    pub value: String,
}

/// How to launch the external solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub program: PathBuf,
    pub method: SolverMethod,
    /// Forward the per-trial seed as `--main::seed`.
    pub pass_seed: bool,
    /// Appended after the annealing parameters, in order.
    pub extra_args: Vec<ExtraArg>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("./TestRALocalSearch.exe"),
            method: SolverMethod::default(),
            pass_seed: false,
            extra_args: Vec::new(),
        }
    }
}

/// Top-level configuration for a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub instances: Vec<String>,
    pub repetitions: usize,
    pub instance_dir: PathBuf,
    pub solution_dir: PathBuf,
    pub solution_extension: String,
    /// Directory holding `Log_<date>.log` and `Errors_<date>.log`.
    pub log_dir: PathBuf,

    /// Iteration budget of every solver run, split across temperature stages.
    pub total_iterations: f64,

    pub start_temperatures: Vec<f64>,
    pub temperature_ranges: Vec<f64>,
    pub cooling_rates: Vec<f64>,

    pub solver: SolverConfig,
    pub failure_policy: FailurePolicy,

    /// Number of cells run at once. 1 keeps the sweep strictly sequential.
    pub jobs: usize,

    /// Seed for the per-trial seed stream; drawn from the OS when unset.
    pub base_seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            instances: [
                "RA-1-8.txt",
                "RA-1-10.txt",
                "RA-2-16.txt",
                "RA-2-20.txt",
                "RA-3-24.txt",
                "RA-3-30.txt",
                "RA-4-32.txt",
                "RA-4-40.txt",
                "RA-5-40.txt",
                "RA-5-50.txt",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            repetitions: 1,
            instance_dir: PathBuf::from("../../RefAssign-Instances/Instances"),
            solution_dir: PathBuf::from("Solutions"),
            solution_extension: "sol".to_string(),
            log_dir: PathBuf::from("."),
            total_iterations: 4e8,
            start_temperatures: vec![10.0, 100.0, 1000.0],
            temperature_ranges: vec![10.0, 30.0, 100.0],
            cooling_rates: vec![0.95, 0.99, 0.995, 0.999],
            solver: SolverConfig::default(),
            failure_policy: FailurePolicy::Continue,
            jobs: 1,
            base_seed: None,
        }
    }
}

impl SweepConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> SweepResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded sweep configuration from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SweepResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text + "\n")?;
        Ok(())
    }

    pub fn with_instances<I, S>(mut self, instances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instances = instances.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_directories(
        mut self,
        instance_dir: impl Into<PathBuf>,
        solution_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        self.instance_dir = instance_dir.into();
        self.solution_dir = solution_dir.into();
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_grid(mut self, starts: Vec<f64>, ranges: Vec<f64>, rates: Vec<f64>) -> Self {
        self.start_temperatures = starts;
        self.temperature_ranges = ranges;
        self.cooling_rates = rates;
        self
    }

    pub fn with_repetitions(mut self, n: usize) -> Self {
        self.repetitions = n;
        self
    }

    pub fn with_total_iterations(mut self, budget: f64) -> Self {
        self.total_iterations = budget;
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.solver.program = program.into();
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_jobs(mut self, n: usize) -> Self {
        self.jobs = n;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    pub fn instance_list(&self) -> Vec<Instance> {
        self.instances
            .iter()
            .map(|name| Instance::new(name.as_str(), &self.instance_dir))
            .collect()
    }

    /// Validate the whole grid before any trial runs.
    pub fn validate(&self) -> SweepResult<()> {
        if self.instances.is_empty() {
            return Err(config_error!("no instances configured"));
        }
        let mut seen = HashSet::new();
        for name in &self.instances {
            if name.trim().is_empty() {
                return Err(config_error!("blank instance name {name:?}"));
            }
            // Names end up in log rows and solution file names.
            if name.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\') {
                return Err(config_error!(
                    "instance name {name:?} must not contain whitespace or path separators"
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(config_error!("instance {name:?} listed more than once"));
            }
        }
        if self.repetitions == 0 {
            return Err(config_error!("repetitions must be at least 1"));
        }
        if self.jobs == 0 {
            return Err(config_error!("jobs must be at least 1"));
        }
        if self.solution_extension.is_empty() {
            return Err(config_error!("solution extension must not be empty"));
        }
        for (name, values) in [
            ("start_temperatures", &self.start_temperatures),
            ("temperature_ranges", &self.temperature_ranges),
            ("cooling_rates", &self.cooling_rates),
        ] {
            if values.is_empty() {
                return Err(config_error!("{name} must list at least one value"));
            }
        }
        if let Some(arg) = self
            .solver
            .extra_args
            .iter()
            .find(|a| a.key.trim().is_empty())
        {
            return Err(config_error!(
                "extra solver argument with empty key (value {:?})",
                arg.value
            ));
        }

        for &start in &self.start_temperatures {
            for &range in &self.temperature_ranges {
                for &rate in &self.cooling_rates {
                    compute_schedule(
                        &HyperparameterSet::new(start, range, rate),
                        self.total_iterations,
                    )?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ra_types::SweepError;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_reference_sweep() {
        let config = SweepConfig::default();
        assert_eq!(config.instances.len(), 10);
        assert_eq!(config.instances[0], "RA-1-8.txt");
        assert_eq!(config.total_iterations, 4e8);
        assert_eq!(config.cooling_rates, vec![0.95, 0.99, 0.995, 0.999]);
        assert_eq!(config.solver.method.selector(), "CAR_SA");
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert!(!config.solver.pass_seed);
        config.validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "instances": ["a.txt"],
            "cooling_rates": [0.9],
            "failure_policy": "halt",
            "solver": { "method": "ARR_SA", "pass_seed": true }
        }"#;
        let config: SweepConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.instances, vec!["a.txt".to_string()]);
        assert_eq!(config.cooling_rates, vec![0.9]);
        assert_eq!(config.start_temperatures, vec![10.0, 100.0, 1000.0]);
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
        assert_eq!(config.solver.method, SolverMethod::AddRemoveReferee);
        assert!(config.solver.pass_seed);
        assert_eq!(config.solver.program, PathBuf::from("./TestRALocalSearch.exe"));
    }

    #[test]
    fn save_then_load_preserves_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        let config = SweepConfig::default()
            .with_instances(["x.txt", "y.txt"])
            .with_repetitions(3)
            .with_base_seed(99);
        config.save(&path).unwrap();
        assert_eq!(SweepConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn invalid_cooling_rate_fails_validation() {
        let config = SweepConfig::default().with_grid(vec![10.0], vec![10.0], vec![0.95, 1.0]);
        assert!(matches!(config.validate(), Err(SweepError::Config(_))));
    }

    #[test]
    fn range_of_one_fails_validation() {
        let config = SweepConfig::default().with_grid(vec![10.0], vec![1.0], vec![0.95]);
        assert!(matches!(config.validate(), Err(SweepError::Config(_))));
    }

    #[test]
    fn empty_arrays_fail_validation() {
        let config = SweepConfig::default().with_grid(vec![], vec![10.0], vec![0.95]);
        match config.validate() {
            Err(SweepError::Config(msg)) => assert!(msg.contains("start_temperatures")),
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert!(SweepConfig::default().with_instances(Vec::<String>::new()).validate().is_err());
        assert!(SweepConfig::default().with_jobs(0).validate().is_err());
        assert!(SweepConfig::default().with_repetitions(0).validate().is_err());
    }

    #[test]
    fn repeated_instance_fails_validation() {
        let config = SweepConfig::default()
            .with_instances(["a.txt", "b.txt", "a.txt"])
            .with_grid(vec![10.0], vec![10.0], vec![0.95]);
        match config.validate() {
            Err(SweepError::Config(msg)) => assert!(msg.contains("more than once")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn instance_name_with_whitespace_fails_validation() {
        for name in ["my inst.txt", "tab\tname.txt", "trailing.txt "] {
            let config = SweepConfig::default().with_instances([name]);
            assert!(
                matches!(config.validate(), Err(SweepError::Config(_))),
                "{name:?} accepted"
            );
        }
    }

    #[test]
    fn instance_name_with_path_separator_fails_validation() {
        for name in ["sub/RA-1-8.txt", "..\\RA-1-8.txt"] {
            let config = SweepConfig::default().with_instances([name]);
            match config.validate() {
                Err(SweepError::Config(msg)) => assert!(msg.contains("path separators")),
                other => panic!("expected configuration error for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn tiny_budget_fails_validation() {
        let config = SweepConfig::default().with_total_iterations(10.0);
        assert!(matches!(config.validate(), Err(SweepError::Config(_))));
    }

    #[test]
    fn instance_list_joins_directory() {
        let config = SweepConfig::default()
            .with_instances(["a.txt"])
            .with_directories("/inst", "/sol", "/log");
        let list = config.instance_list();
        assert_eq!(list[0].path, PathBuf::from("/inst/a.txt"));
    }
}
