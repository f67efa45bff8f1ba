use std::fmt;
use std::path::PathBuf;

use crate::config::SolverKind;

/// Errors from solver interaction.
#[derive(Debug)]
pub enum SolverError {
    /// Solver binary not found at the specified path.
    NotFound(SolverKind, PathBuf),
    /// Process failed to start or crashed.
    ProcessError(String),
    /// Failed to parse solver output.
    ParseError(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::NotFound(kind, path) => {
                write!(f, "{kind} binary not found at: {}", path.display())
            }
            SolverError::ProcessError(msg) => write!(f, "Solver process error: {msg}"),
            SolverError::ParseError(msg) => write!(f, "Failed to parse solver output: {msg}"),
        }
    }
}

impl std::error::Error for SolverError {}

impl PartialEq for SolverError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SolverError::NotFound(k1, p1), SolverError::NotFound(k2, p2)) => k1 == k2 && p1 == p2,
            (SolverError::ProcessError(a), SolverError::ProcessError(b)) => a == b,
            (SolverError::ParseError(a), SolverError::ParseError(b)) => a == b,
            _ => false,
        }
    }
}
