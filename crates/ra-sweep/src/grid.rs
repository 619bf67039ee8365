//! Exhaustive parameter grid over instances, hyperparameters and repetitions.

use ra_types::{HyperparameterSet, Instance};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SweepConfig;

/// Positions of a cell's hyperparameters inside the candidate arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub start: usize,
    pub range: usize,
    pub cooling: usize,
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.start, self.range, self.cooling)
    }
}

/// One fully specified combination of instance, hyperparameters and repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub repetition: usize,
    pub instance: Instance,
    pub index: GridIndex,
    pub hyperparameters: HyperparameterSet,
}

impl GridCell {
    /// Solution file name, unique across the grid:
    /// `sol-<instance>-<st>-<tr>-<cr>_<rep>.<ext>`.
    pub fn output_file_name(&self, extension: &str) -> String {
        format!(
            "sol-{}-{}_{}.{}",
            self.instance.name, self.index, self.repetition, extension
        )
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] rep {}", self.instance, self.index, self.repetition)
    }
}

/// Candidate values for every grid axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    pub instances: Vec<Instance>,
    pub start_temperatures: Vec<f64>,
    pub temperature_ranges: Vec<f64>,
    pub cooling_rates: Vec<f64>,
    pub repetitions: usize,
}

/// Cells to run plus the instances dropped because their file is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    pub cells: Vec<GridCell>,
    pub missing: Vec<Instance>,
    /// Cells that would have been generated for the missing instances.
    pub skipped_cells: usize,
}

impl ParameterGrid {
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            instances: config.instance_list(),
            start_temperatures: config.start_temperatures.clone(),
            temperature_ranges: config.temperature_ranges.clone(),
            cooling_rates: config.cooling_rates.clone(),
            repetitions: config.repetitions,
        }
    }

    /// Hyperparameter combinations per instance and repetition.
    pub fn cells_per_instance(&self) -> usize {
        self.start_temperatures.len() * self.temperature_ranges.len() * self.cooling_rates.len()
    }

    /// Cell count with every instance present.
    pub fn full_size(&self) -> usize {
        self.instances.len() * self.cells_per_instance() * self.repetitions
    }

    /// Enumerate cells in repetition → instance → start → range → cooling order,
    /// using `exists` to decide which instances are available.
    pub fn plan_with<F>(&self, mut exists: F) -> GridPlan
    where
        F: FnMut(&Instance) -> bool,
    {
        let (present, missing): (Vec<&Instance>, Vec<&Instance>) =
            self.instances.iter().partition(|inst| exists(inst));

        let mut cells =
            Vec::with_capacity(present.len() * self.cells_per_instance() * self.repetitions);
        for repetition in 0..self.repetitions {
            for instance in &present {
                for (st, &start) in self.start_temperatures.iter().enumerate() {
                    for (tr, &range) in self.temperature_ranges.iter().enumerate() {
                        for (cr, &rate) in self.cooling_rates.iter().enumerate() {
                            cells.push(GridCell {
                                repetition,
                                instance: (*instance).clone(),
                                index: GridIndex {
                                    start: st,
                                    range: tr,
                                    cooling: cr,
                                },
                                hyperparameters: HyperparameterSet::new(start, range, rate),
                            });
                        }
                    }
                }
            }
        }

        GridPlan {
            skipped_cells: missing.len() * self.cells_per_instance() * self.repetitions,
            missing: missing.into_iter().cloned().collect(),
            cells,
        }
    }

    /// Enumerate cells, skipping instances whose file does not exist on disk.
    pub fn plan(&self) -> GridPlan {
        self.plan_with(Instance::exists)
    }
}
