//! # solhorn-solver
//!
//! Horn solver interface for the solhorn CHC encoder.
//!
//! The encoder talks to a solver through the [`HornBackend`] trait:
//! register uninterpreted relations, add Horn rules, and ask one
//! reachability query per assertion. The shipped implementation,
//! [`SmtLib2Horn`], renders `(set-logic HORN)` SMT-LIB2 scripts and runs
//! them through a portfolio of CHC-capable solver subprocesses (Z3's
//! Spacer engine, Eldarica, CVC5). When no solver binary is available the
//! driver records the rendered script instead, so queries can be solved
//! offline.
//!
//! ## Usage
//!
//! ```no_run
//! use solhorn_smtlib::{Sort, Term};
//! use solhorn_solver::{HornBackend, SmtLib2Horn};
//!
//! let mut backend = SmtLib2Horn::auto_detect(10_000);
//! backend.register_relation("reach", &[Sort::Int]);
//! backend.declare_variable("x", Sort::Int);
//! backend.add_rule(
//!     Term::implies(Term::eq(Term::cst("x"), Term::int(0)), Term::App("reach".into(), vec![Term::cst("x")])),
//!     "init",
//! );
//! let (result, _) = backend.query(&Term::App("reach".into(), vec![Term::int(1)]));
//! println!("{result:?}");
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod horn;
pub mod parser;
pub mod process;
pub mod result;

// Re-export primary types for ergonomic use
pub use backend::HornBackend;
pub use config::{SolverConfig, SolverKind};
pub use error::SolverError;
pub use horn::SmtLib2Horn;
pub use process::CliSolver;
pub use result::CheckResult;
