//! Annealing-schedule math: temperature range and cooling rate to per-stage
//! iteration budgets.

use ra_types::{config_error, HyperparameterSet, SweepResult};
use serde::{Deserialize, Serialize};

/// Fraction of sampled neighbours that may be accepted per temperature stage.
pub const ACCEPTANCE_RATIO: f64 = 0.1;

/// Solver parameters derived from one hyperparameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub min_temperature: f64,
    /// Number of temperature levels visited between start and minimum temperature.
    pub stage_count: f64,
    pub neighbors_sampled: u64,
    pub neighbors_accepted: u64,
}

/// Number of geometric cooling steps needed to divide the temperature by `temperature_range`.
///
/// Only meaningful for `temperature_range > 1` and `0 < cooling_rate < 1`.
pub fn stage_count(temperature_range: f64, cooling_rate: f64) -> f64 {
    -temperature_range.ln() / cooling_rate.ln()
}

/// Check that a hyperparameter set lies in the domain where the schedule is defined.
pub fn validate_hyperparameters(hp: &HyperparameterSet) -> SweepResult<()> {
    if !(hp.start_temperature.is_finite() && hp.start_temperature > 0.0) {
        return Err(config_error!(
            "start temperature must be positive and finite, got {}",
            hp.start_temperature
        ));
    }
    if !(hp.temperature_range.is_finite() && hp.temperature_range > 1.0) {
        return Err(config_error!(
            "temperature range must be finite and greater than 1, got {}",
            hp.temperature_range
        ));
    }
    if !(hp.cooling_rate > 0.0 && hp.cooling_rate < 1.0) {
        return Err(config_error!(
            "cooling rate must lie strictly between 0 and 1, got {}",
            hp.cooling_rate
        ));
    }
    Ok(())
}

/// Derive the solver parameters for one grid cell.
///
/// `total_iterations` is the fixed budget shared by every run of the sweep;
/// it is split evenly across the temperature stages.
pub fn compute_schedule(hp: &HyperparameterSet, total_iterations: f64) -> SweepResult<Schedule> {
    validate_hyperparameters(hp)?;
    if !(total_iterations.is_finite() && total_iterations > 0.0) {
        return Err(config_error!(
            "total iteration budget must be positive and finite, got {total_iterations}"
        ));
    }

    let stages = stage_count(hp.temperature_range, hp.cooling_rate);
    let sampled = (total_iterations / stages).round();
    if !(sampled >= 1.0) {
        return Err(config_error!(
            "budget {total_iterations} over {stages:.2} stages leaves no neighbours per stage \
             (range {}, cooling rate {})",
            hp.temperature_range,
            hp.cooling_rate
        ));
    }
    if sampled > u64::MAX as f64 {
        return Err(config_error!(
            "neighbours per stage overflow: {sampled} (budget {total_iterations})"
        ));
    }

    let neighbors_sampled = sampled as u64;
    let neighbors_accepted = (neighbors_sampled as f64 * ACCEPTANCE_RATIO).floor() as u64;

    Ok(Schedule {
        min_temperature: hp.min_temperature(),
        stage_count: stages,
        neighbors_sampled,
        neighbors_accepted,
    })
}
