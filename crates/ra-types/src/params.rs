use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The three continuous simulated-annealing hyperparameters swept by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterSet {
    pub start_temperature: f64,
    /// Ratio between start and minimum temperature; must exceed 1.
    pub temperature_range: f64,
    /// Geometric cooling factor; must lie strictly inside (0, 1).
    pub cooling_rate: f64,
}

impl HyperparameterSet {
    pub fn new(start_temperature: f64, temperature_range: f64, cooling_rate: f64) -> Self {
        Self {
            start_temperature,
            temperature_range,
            cooling_rate,
        }
    }

    pub fn min_temperature(&self) -> f64 {
        self.start_temperature / self.temperature_range
    }
}

/// Named reference to a problem file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instance {
    pub name: String,
    pub path: PathBuf,
}

impl Instance {
    pub fn new(name: impl Into<String>, directory: &Path) -> Self {
        let name = name.into();
        let path = directory.join(&name);
        Self { name, path }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Solution method understood by the external solver.
///
/// Both methods run simulated annealing; they differ in the neighbourhood
/// explored, which also selects the parameter namespace on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SolverMethod {
    /// Change the referees assigned to a game.
    #[default]
    #[serde(rename = "CAR_SA")]
    ChangeAssignedReferees,
    /// Add or remove a single referee.
    #[serde(rename = "ARR_SA")]
    AddRemoveReferee,
}

impl SolverMethod {
    /// Value passed to `--main::method`.
    pub fn selector(&self) -> &'static str {
        match self {
            Self::ChangeAssignedReferees => "CAR_SA",
            Self::AddRemoveReferee => "ARR_SA",
        }
    }

    /// Parameter-box prefix for the annealing parameters.
    pub fn parameter_namespace(&self) -> &'static str {
        match self {
            Self::ChangeAssignedReferees => "ChangeAssignedReferees_SimulatedAnnealing",
            Self::AddRemoveReferee => "AddRemoveReferee_SimulatedAnnealing",
        }
    }
}

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_temperature_divides_by_range() {
        let hp = HyperparameterSet::new(100.0, 30.0, 0.99);
        assert!((hp.min_temperature() - 100.0 / 30.0).abs() < 1e-12);
        assert!(hp.min_temperature() < hp.start_temperature);
    }

    #[test]
    fn instance_path_joins_directory() {
        let inst = Instance::new("RA-1-8.txt", Path::new("/data/instances"));
        assert_eq!(inst.path, PathBuf::from("/data/instances/RA-1-8.txt"));
        assert_eq!(inst.to_string(), "RA-1-8.txt");
        assert!(!inst.exists());
    }

    #[test]
    fn method_serializes_as_selector() {
        let json = serde_json::to_string(&SolverMethod::AddRemoveReferee).unwrap();
        assert_eq!(json, "\"ARR_SA\"");
        let back: SolverMethod = serde_json::from_str("\"CAR_SA\"").unwrap();
        assert_eq!(back, SolverMethod::ChangeAssignedReferees);
        assert_eq!(
            back.parameter_namespace(),
            "ChangeAssignedReferees_SimulatedAnnealing"
        );
    }
}
