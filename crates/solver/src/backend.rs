//! Abstraction over Horn solver backends.
//!
//! This module provides the `HornBackend` trait through which the CHC
//! encoder talks to a solver, and a factory that builds the default
//! text-driver backend with an auto-detected solver portfolio.

use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;

use crate::horn::SmtLib2Horn;
use crate::result::CheckResult;

/// Trait abstracting over Horn solver backends.
///
/// The encoder registers every uninterpreted relation and every SSA
/// constant it creates, accumulates Horn rules, and asks one reachability
/// query per assertion. Implementations own all accumulated state; rules
/// survive for the whole analysis (queries only add a goal).
pub trait HornBackend {
    /// Register an SSA constant so rules mentioning it can be quantified.
    fn declare_variable(&mut self, name: &str, sort: Sort);

    /// Register an uninterpreted relation of the given argument sorts.
    ///
    /// Re-registering a name replaces its signature; the encoder uses this
    /// when it refreshes the error relation before a query.
    fn register_relation(&mut self, name: &str, arg_sorts: &[Sort]);

    /// Add a Horn rule (an implication between relation applications).
    fn add_rule(&mut self, rule: Term, name: &str);

    /// Ask whether the given relation application is reachable.
    ///
    /// Returns the classified answer plus any solver-reported values.
    /// Solver-level failures are folded into [`CheckResult::Error`];
    /// this method never panics on solver trouble.
    fn query(&mut self, goal: &Term) -> (CheckResult, Vec<String>);

    /// Queries that no solver answered, as SMT-LIB2 text, for offline
    /// solving. Only the text driver produces these.
    fn unhandled_queries(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Create the default backend: the SMT-LIB2 text driver over every CHC
/// solver found on this machine, with the given per-query timeout.
pub fn create_default_backend(timeout_ms: u64) -> Box<dyn HornBackend> {
    let backend = SmtLib2Horn::auto_detect(timeout_ms);
    tracing::debug!(
        solvers = backend.portfolio_size(),
        "Using SMT-LIB2 Horn text driver"
    );
    Box::new(backend)
}
