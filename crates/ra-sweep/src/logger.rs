//! Append-only experiment log.
//!
//! Every append opens the file, writes one line and closes it again, so rows
//! of completed trials survive a crash of the harness.

use chrono::NaiveDate;
use ra_types::{format_float, RunRecord, SweepError, SweepResult};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::grid::GridCell;

pub const LOG_HEADER: &str = "Trial Instance Cost Seed Time Start_temp Min_Temp Cooling_Rate";

/// Lifecycle of an [`ExperimentLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogState {
    /// Header not yet ensured; appends are rejected.
    Uninitialized,
    Active,
}

#[derive(Debug, Clone)]
pub struct ExperimentLog {
    path: PathBuf,
    error_path: PathBuf,
    state: LogState,
}

impl ExperimentLog {
    /// Log files for the given date: `Log_<date>.log` and `Errors_<date>.log`.
    pub fn for_date<P: AsRef<Path>>(dir: P, date: NaiveDate) -> Self {
        let dir = dir.as_ref();
        let stamp = date.format("%Y-%m-%d");
        Self {
            path: dir.join(format!("Log_{stamp}.log")),
            error_path: dir.join(format!("Errors_{stamp}.log")),
            state: LogState::Uninitialized,
        }
    }

    /// Log files for today's local date.
    pub fn today<P: AsRef<Path>>(dir: P) -> Self {
        Self::for_date(dir, chrono::Local::now().date_naive())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn error_path(&self) -> &Path {
        &self.error_path
    }

    pub fn state(&self) -> LogState {
        self.state
    }

    /// Write the header if the log is new and start accepting rows.
    ///
    /// An existing log keeps its header and rows; reruns on the same date
    /// append below them.
    pub fn initialize(&mut self) -> SweepResult<()> {
        if self.state == LogState::Active {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if file.metadata()?.len() == 0 {
            writeln!(file, "{LOG_HEADER}")?;
            tracing::info!("Created experiment log {}", self.path.display());
        } else {
            tracing::info!("Appending to existing experiment log {}", self.path.display());
        }

        self.state = LogState::Active;
        Ok(())
    }

    /// Append one completed trial.
    pub fn append(&self, record: &RunRecord) -> SweepResult<()> {
        self.ensure_active()?;
        append_line(&self.path, &format_row(record))
    }

    /// Record a failed cell in the companion error log.
    pub fn append_failure(&self, cell: &GridCell, error: &SweepError) -> SweepResult<()> {
        self.ensure_active()?;
        let reason = error.to_string().replace('\n', " ");
        let line = format!(
            "{} {} {} {} {}",
            cell.repetition,
            cell.instance.name,
            cell.index,
            error.kind(),
            reason
        );
        append_line(&self.error_path, &line)
    }

    fn ensure_active(&self) -> SweepResult<()> {
        match self.state {
            LogState::Active => Ok(()),
            LogState::Uninitialized => Err(SweepError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("experiment log {} used before initialization", self.path.display()),
            ))),
        }
    }
}

/// One space-delimited row in header column order.
pub fn format_row(record: &RunRecord) -> String {
    let hp = &record.hyperparameters;
    format!(
        "{} {} {} {} {} {} {} {}",
        record.repetition,
        record.instance,
        record.cost,
        record.seed,
        record.time,
        format_float(hp.start_temperature),
        format_float(hp.min_temperature()),
        format_float(hp.cooling_rate),
    )
}

fn append_line(path: &Path, line: &str) -> SweepResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridIndex;
    use ra_types::{format_error, HyperparameterSet, Instance, SolutionSummary};
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn record(rep: usize, cost: &str) -> RunRecord {
        RunRecord::new(
            rep,
            "RA-1-8.txt",
            31337,
            SolutionSummary {
                cost: cost.to_string(),
                time: "6.7".to_string(),
            },
            HyperparameterSet::new(100.0, 30.0, 0.99),
        )
    }

    #[test]
    fn file_names_carry_iso_date() {
        let log = ExperimentLog::for_date("logs", date());
        assert_eq!(log.path(), Path::new("logs/Log_2024-03-09.log"));
        assert_eq!(log.error_path(), Path::new("logs/Errors_2024-03-09.log"));
        assert_eq!(log.state(), LogState::Uninitialized);
    }

    #[test]
    fn row_matches_header_order() {
        let row = format_row(&record(2, "123.45"));
        assert_eq!(row, "2 RA-1-8.txt 123.45 31337 6.7 100.0 3.3333333333333335 0.99");
        assert_eq!(row.split(' ').count(), LOG_HEADER.split(' ').count());
    }

    #[test]
    fn header_plus_one_row_per_trial() {
        let dir = tempdir().unwrap();
        let mut log = ExperimentLog::for_date(dir.path(), date());
        log.initialize().unwrap();
        for i in 0..5 {
            log.append(&record(i, "10")).unwrap();
        }

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], LOG_HEADER);
        assert!(lines[1..].iter().all(|l| l.split(' ').count() == 8));
    }

    #[test]
    fn rerun_does_not_repeat_header() {
        let dir = tempdir().unwrap();

        let mut first = ExperimentLog::for_date(dir.path(), date());
        first.initialize().unwrap();
        first.append(&record(0, "1")).unwrap();

        let mut second = ExperimentLog::for_date(dir.path(), date());
        second.initialize().unwrap();
        second.initialize().unwrap();
        second.append(&record(0, "2")).unwrap();

        let text = fs::read_to_string(second.path()).unwrap();
        assert_eq!(text.matches(LOG_HEADER).count(), 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn append_before_initialize_is_rejected() {
        let dir = tempdir().unwrap();
        let log = ExperimentLog::for_date(dir.path(), date());
        assert!(log.append(&record(0, "1")).is_err());
        assert!(!log.path().exists());
    }

    #[test]
    fn failures_go_to_error_log() {
        let dir = tempdir().unwrap();
        let mut log = ExperimentLog::for_date(dir.path(), date());
        log.initialize().unwrap();

        let cell = GridCell {
            repetition: 1,
            instance: Instance::new("RA-2-16.txt", dir.path()),
            index: GridIndex { start: 2, range: 0, cooling: 3 },
            hyperparameters: HyperparameterSet::new(1000.0, 10.0, 0.999),
        };
        log.append_failure(&cell, &format_error!("x.sol", "expected at least 4 lines, found 1"))
            .unwrap();

        let errors = fs::read_to_string(log.error_path()).unwrap();
        assert!(errors.starts_with("1 RA-2-16.txt 2-0-3 result_format "));
        assert!(errors.contains("found 1"));

        // Result log holds only the header.
        assert_eq!(fs::read_to_string(log.path()).unwrap().lines().count(), 1);
    }
}
