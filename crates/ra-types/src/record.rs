use serde::{Deserialize, Serialize};

use crate::params::HyperparameterSet;

/// Cost and elapsed time reported by one solver run.
///
/// Both values stay as the solver printed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionSummary {
    pub cost: String,
    pub time: String,
}

/// Summary of one completed trial, appended once to the experiment log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub repetition: usize,
    pub instance: String,
    pub seed: u64,
    pub cost: String,
    pub time: String,
    pub hyperparameters: HyperparameterSet,
}

impl RunRecord {
    pub fn new(
        repetition: usize,
        instance: impl Into<String>,
        seed: u64,
        summary: SolutionSummary,
        hyperparameters: HyperparameterSet,
    ) -> Self {
        Self {
            repetition,
            instance: instance.into(),
            seed,
            cost: summary.cost,
            time: summary.time,
            hyperparameters,
        }
    }

    /// Cost as a number, if the solver printed one.
    pub fn numeric_cost(&self) -> Option<f64> {
        self.cost.parse().ok()
    }
}

/// Render a float in shortest round-trip form, keeping a trailing `.0` on
/// integral values (`10.0`, `0.95`, `3.3333333333333335`).
pub fn format_float(value: f64) -> String {
    format!("{value:?}")
}
