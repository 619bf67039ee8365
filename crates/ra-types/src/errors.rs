use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the sweep harness
#[derive(Error, Debug)]
pub enum SweepError {
    /// Invalid hyperparameter domain or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Instance file not found: {}", path.display())]
    MissingInstance { path: PathBuf },

    #[error("Solver exited with {status}: {command}{}", stderr_suffix(stderr))]
    SolverExecution {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to launch solver {program}: {source}")]
    SolverLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed solution file {}: {message}", path.display())]
    ResultFormat { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(" (stderr: {trimmed})")
    }
}

impl SweepError {
    /// Whether the failure only concerns the grid cell that produced it.
    ///
    /// Cell-local errors abort the current trial; everything else stops the
    /// sweep.
    pub fn is_cell_local(&self) -> bool {
        matches!(
            self,
            Self::MissingInstance { .. }
                | Self::SolverExecution { .. }
                | Self::SolverLaunch { .. }
                | Self::ResultFormat { .. }
        )
    }

    /// Short tag used in the error log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::MissingInstance { .. } => "missing_instance",
            Self::SolverExecution { .. } => "solver_execution",
            Self::SolverLaunch { .. } => "solver_launch",
            Self::ResultFormat { .. } => "result_format",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Result type alias for sweep operations
pub type SweepResult<T> = Result<T, SweepError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::SweepError::Config(format!($($arg)*))
    };
}

/// Macro for creating result format errors
#[macro_export]
macro_rules! format_error {
    ($path:expr, $($arg:tt)*) => {
        $crate::SweepError::ResultFormat {
            path: ::std::path::PathBuf::from($path),
            message: format!($($arg)*),
        }
    };
}
