use std::fmt;
use std::path::PathBuf;

use crate::error::SolverError;

/// Supported CHC solver backends.
///
/// All of them accept `(set-logic HORN)` SMT-LIB2 scripts on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// Z3 (Spacer engine) from Microsoft Research.
    Z3,
    /// Eldarica from Uppsala University.
    Eldarica,
    /// CVC5 from Stanford/Iowa.
    Cvc5,
}

impl SolverKind {
    /// Binary name used for PATH lookup.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Eldarica => "eld",
            SolverKind::Cvc5 => "cvc5",
        }
    }

    /// Common installation paths to check when PATH lookup fails.
    fn common_paths(&self) -> &'static [&'static str] {
        match self {
            SolverKind::Z3 => &["/opt/homebrew/bin/z3", "/usr/local/bin/z3", "/usr/bin/z3"],
            SolverKind::Eldarica => &[
                "/opt/homebrew/bin/eld",
                "/usr/local/bin/eld",
                "/usr/bin/eld",
            ],
            SolverKind::Cvc5 => &[
                "/opt/homebrew/bin/cvc5",
                "/usr/local/bin/cvc5",
                "/usr/bin/cvc5",
            ],
        }
    }

    /// Build solver-specific CLI arguments for stdin mode.
    pub fn stdin_args(&self) -> Vec<String> {
        match self {
            SolverKind::Z3 => vec!["-in".to_string()],
            SolverKind::Eldarica => vec!["-hsmt".to_string()],
            SolverKind::Cvc5 => vec!["--lang".to_string(), "smt2".to_string()],
        }
    }

    /// Build solver-specific timeout argument, if supported.
    pub fn timeout_arg(&self, timeout_ms: u64) -> Option<String> {
        if timeout_ms == 0 {
            return None;
        }
        match self {
            SolverKind::Z3 => Some(format!("-t:{timeout_ms}")),
            SolverKind::Eldarica => Some(format!("-t:{}", timeout_ms.div_ceil(1000))),
            SolverKind::Cvc5 => Some(format!("--tlimit={timeout_ms}")),
        }
    }

    /// All supported kinds, in portfolio preference order.
    pub fn all() -> [SolverKind; 3] {
        [SolverKind::Z3, SolverKind::Eldarica, SolverKind::Cvc5]
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Z3 => write!(f, "Z3"),
            SolverKind::Eldarica => write!(f, "Eldarica"),
            SolverKind::Cvc5 => write!(f, "CVC5"),
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "z3" => Ok(SolverKind::Z3),
            "eldarica" | "eld" => Ok(SolverKind::Eldarica),
            "cvc5" => Ok(SolverKind::Cvc5),
            _ => Err(format!(
                "Unknown solver: {s}. Valid options: z3, eldarica, cvc5"
            )),
        }
    }
}

/// Solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Which solver to use.
    pub kind: SolverKind,
    /// Path to the solver binary.
    pub solver_path: PathBuf,
    /// Timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,
    /// Additional solver arguments.
    pub extra_args: Vec<String>,
}

impl SolverConfig {
    /// Create a new config with the given solver kind and path.
    pub fn new(kind: SolverKind, solver_path: PathBuf) -> Self {
        Self {
            kind,
            solver_path,
            timeout_ms: 0,
            extra_args: Vec::new(),
        }
    }

    /// Create config with a specific timeout (in milliseconds).
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Add extra arguments for the solver.
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Auto-detect solver location for the given kind.
    ///
    /// Tries `which <binary>` first, then checks common installation paths.
    pub fn auto_detect_for(kind: SolverKind) -> Result<Self, SolverError> {
        let binary = kind.binary_name();

        // Try `which` via PATH lookup
        if let Ok(output) = std::process::Command::new("which").arg(binary).output() {
            if output.status.success() {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(&path_str);
                    if path.exists() {
                        return Ok(Self::new(kind, path));
                    }
                }
            }
        }

        // Fall back to common paths
        for candidate in kind.common_paths() {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(Self::new(kind, path));
            }
        }

        Err(SolverError::NotFound(kind, PathBuf::from(binary)))
    }

    /// Auto-detect every installed CHC solver, in portfolio order.
    ///
    /// Returns an empty vector when no solver binary is present; the text
    /// driver then falls back to recording queries for offline solving.
    pub fn auto_detect_all(timeout_ms: u64) -> Vec<Self> {
        SolverKind::all()
            .into_iter()
            .filter_map(|kind| Self::auto_detect_for(kind).ok())
            .map(|config| config.with_timeout(timeout_ms))
            .collect()
    }

    /// Build the full argument list for this solver invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.kind.stdin_args();

        if let Some(timeout_arg) = self.kind.timeout_arg(self.timeout_ms) {
            args.push(timeout_arg);
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Validate that the configured solver binary exists.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !self.solver_path.exists() {
            return Err(SolverError::NotFound(self.kind, self.solver_path.clone()));
        }
        Ok(())
    }
}
