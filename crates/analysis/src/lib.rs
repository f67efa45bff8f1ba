//! # solhorn-analysis
//!
//! The CHC encoder core: proves or refutes user-written assertions in
//! smart-contract source by reducing the program to Constrained Horn
//! Clauses over uninterpreted predicates and the integer/boolean/array
//! theories, and asking a Horn solver one reachability query per
//! assertion.
//!
//! The encoder walks a compiler-decoupled [`ast::SourceUnit`] and emits
//! - a family of symbolic predicates (program-point blocks, per-function
//!   summaries, per-contract interfaces),
//! - the implication rules connecting them, and
//! - per-assertion reachability queries,
//! keeping the SSA indices, call graph, and assertion sets that make the
//! encoding sound.
//!
//! ## Usage
//!
//! ```no_run
//! use solhorn_analysis::ast::SourceUnit;
//! use solhorn_analysis::ChcEncoder;
//! use solhorn_solver::SmtLib2Horn;
//!
//! let unit = SourceUnit::default(); // built by a front end
//! let mut encoder = ChcEncoder::new(&unit, Box::new(SmtLib2Horn::auto_detect(10_000)));
//! encoder.analyze();
//! for id in encoder.safe_assertions() {
//!     println!("assertion {id} proved safe");
//! }
//! ```

pub mod ast;
pub mod call_graph;
pub mod chc;
pub mod context;
pub mod diagnostics;
pub mod exprs;
pub mod predicates;
pub mod sorts;

pub use chc::ChcEncoder;
pub use diagnostics::Reporter;
pub use solhorn_solver::CheckResult;
