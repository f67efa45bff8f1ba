//! Warning reporter for solver-level issues.
//!
//! The encoder never fails a user's analysis over solver trouble: a
//! conflicting portfolio answer or a failed solver invocation produces a
//! warning at the assertion's source location and the assertion stays
//! unclassified.

use colored::Colorize;

use crate::ast::SourceLocation;

/// A reported warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub location: SourceLocation,
    pub message: String,
}

/// Collects warnings in report order.
#[derive(Debug, Default)]
pub struct Reporter {
    warnings: Vec<Warning>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, location: SourceLocation, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(start = location.start, end = location.end, %message);
        self.warnings.push(Warning { location, message });
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Render all warnings as colored text, one per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for warning in &self.warnings {
            out.push_str(&format!(
                "{} [{}..{}]: {}\n",
                "warning".yellow().bold(),
                warning.location.start,
                warning.location.end,
                warning.message
            ));
        }
        out
    }

    /// Print all warnings to stderr.
    pub fn eprint(&self) {
        eprint!("{}", self.render());
    }
}
