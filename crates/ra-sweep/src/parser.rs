//! Reader for the solver's solution file.
//!
//! The solver writes the solution on the first line, then `Cost: <n>`,
//! `Violations: <n>` and `Time: <t>s`. Only the cost and time lines are read.

use ra_types::{format_error, SolutionSummary, SweepResult};
use std::fs;
use std::path::Path;

const COST_LINE: usize = 1;
const TIME_LINE: usize = 3;
const REQUIRED_LINES: usize = 4;

/// Read and parse a solution file written by the solver.
pub fn read_solution_file<P: AsRef<Path>>(path: P) -> SweepResult<SolutionSummary> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        format_error!(path, "cannot read solution file: {e}")
    })?;
    parse_solution(&text, path)
}

/// Extract cost and time from the text of a solution file.
///
/// `path` only labels errors.
pub fn parse_solution(text: &str, path: &Path) -> SweepResult<SolutionSummary> {
    let lines: Vec<&str> = text.lines().take(REQUIRED_LINES).collect();
    if lines.len() < REQUIRED_LINES {
        return Err(format_error!(
            path,
            "expected at least {REQUIRED_LINES} lines, found {}",
            lines.len()
        ));
    }

    let cost = second_token(lines[COST_LINE], COST_LINE, path)?;
    let time = second_token(lines[TIME_LINE], TIME_LINE, path)?;
    Ok(SolutionSummary { cost, time })
}

fn second_token(line: &str, index: usize, path: &Path) -> SweepResult<String> {
    line.split_whitespace()
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| format_error!(path, "line {} has no value: {line:?}", index + 1))
}
