//! # solhorn-smtlib
//!
//! SMT-LIB2 representation used by the solhorn Horn-clause encoder.
//!
//! This crate models the fragment of SMT-LIB2 the encoder emits: the
//! `Bool`/`Int`/`Array` theories, uninterpreted relations applied as
//! program-point predicates, and universally quantified Horn rules.
//! The `formatter` module renders all of it as solver-ready text.

pub mod command;
pub mod formatter;
pub mod script;
pub mod sort;
pub mod term;

pub use command::Command;
pub use script::Script;
pub use sort::Sort;
pub use term::Term;
