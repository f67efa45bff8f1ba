//! SMT-LIB2 text driver for Horn queries.
//!
//! Accumulates relation declarations, SSA constant declarations, and Horn
//! rules; renders one self-contained `(set-logic HORN)` script per query
//! and runs it through a portfolio of CHC solver subprocesses.
//!
//! In the HORN encoding the reachability query `goal` is asserted as
//! `goal => false`, so the solver's answer is inverted when mapped back:
//! a solver-level `sat` means the clause system *including* the negated
//! goal is consistent, i.e. the goal relation is unreachable and the
//! query result is [`CheckResult::Unsatisfiable`].
//!
//! When no solver binary is installed, the rendered script is recorded in
//! `unhandled_queries()` so it can be solved offline, and the query
//! answers `Unknown`.

use std::collections::{BTreeMap, HashMap};

use solhorn_smtlib::command::Command;
use solhorn_smtlib::script::Script;
use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;

use crate::backend::HornBackend;
use crate::config::SolverConfig;
use crate::parser::RawAnswer;
use crate::process::CliSolver;
use crate::result::CheckResult;

/// The SMT-LIB2 Horn text driver.
pub struct SmtLib2Horn {
    /// Registered relations in declaration order: `(name, argument sorts)`.
    relations: Vec<(String, Vec<Sort>)>,
    /// Index into `relations` by name, for signature replacement.
    relation_index: HashMap<String, usize>,
    /// Registered SSA constants, used to quantify rules.
    variables: BTreeMap<String, Sort>,
    /// Accumulated Horn rules: `(rule, name)`.
    rules: Vec<(Term, String)>,
    /// Solver portfolio; may be empty.
    solvers: Vec<CliSolver>,
    /// Rendered queries no solver answered.
    unhandled: Vec<String>,
}

impl SmtLib2Horn {
    /// Driver over an explicit solver portfolio.
    pub fn with_solvers(solvers: Vec<CliSolver>) -> Self {
        Self {
            relations: Vec::new(),
            relation_index: HashMap::new(),
            variables: BTreeMap::new(),
            rules: Vec::new(),
            solvers,
            unhandled: Vec::new(),
        }
    }

    /// Driver over every CHC solver installed on this machine.
    pub fn auto_detect(timeout_ms: u64) -> Self {
        let solvers = SolverConfig::auto_detect_all(timeout_ms)
            .into_iter()
            .map(CliSolver::new)
            .collect();
        Self::with_solvers(solvers)
    }

    /// Driver that never runs a solver: every query is recorded in
    /// `unhandled_queries()` and answered `Unknown`.
    pub fn text_only() -> Self {
        Self::with_solvers(Vec::new())
    }

    /// Number of solvers in the portfolio.
    pub fn portfolio_size(&self) -> usize {
        self.solvers.len()
    }

    /// Number of accumulated rules.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Universally quantify a rule over its free constants.
    ///
    /// Constants the encoder never declared fall back to `Int`; that is
    /// an encoder bug, not a user error, so it is only logged.
    fn quantified(&self, term: Term) -> Term {
        let free = term.free_consts();
        if free.is_empty() {
            return term;
        }
        let binders = free
            .into_iter()
            .map(|name| {
                let sort = match self.variables.get(&name) {
                    Some(sort) => sort.clone(),
                    None => {
                        tracing::warn!(constant = %name, "undeclared constant in rule; assuming Int");
                        Sort::Int
                    }
                };
                (name, sort)
            })
            .collect();
        Term::Forall(binders, Box::new(term))
    }

    /// Render the full clause system plus the negated goal as one script.
    pub fn render_query(&self, goal: &Term) -> Script {
        let mut script = Script::new();
        script.push(Command::SetLogic("HORN".to_string()));
        for (name, arg_sorts) in &self.relations {
            script.push(Command::DeclareFun(
                name.clone(),
                arg_sorts.clone(),
                Sort::Bool,
            ));
        }
        for (rule, name) in &self.rules {
            script.push(Command::Comment(name.clone()));
            script.push(Command::Assert(self.quantified(rule.clone())));
        }
        script.push(Command::Assert(self.quantified(Term::implies(
            goal.clone(),
            Term::BoolLit(false),
        ))));
        script.push(Command::CheckSat);
        script
    }
}

impl HornBackend for SmtLib2Horn {
    fn declare_variable(&mut self, name: &str, sort: Sort) {
        self.variables.insert(name.to_string(), sort);
    }

    fn register_relation(&mut self, name: &str, arg_sorts: &[Sort]) {
        match self.relation_index.get(name) {
            Some(&i) => self.relations[i].1 = arg_sorts.to_vec(),
            None => {
                self.relation_index
                    .insert(name.to_string(), self.relations.len());
                self.relations.push((name.to_string(), arg_sorts.to_vec()));
            }
        }
    }

    fn add_rule(&mut self, rule: Term, name: &str) {
        self.rules.push((rule, name.to_string()));
    }

    fn query(&mut self, goal: &Term) -> (CheckResult, Vec<String>) {
        let text = self.render_query(goal).to_string();

        if self.solvers.is_empty() {
            self.unhandled.push(text);
            return (CheckResult::Unknown, Vec::new());
        }

        let mut answers = Vec::new();
        let mut failures = 0usize;
        for solver in &self.solvers {
            match solver.run(&text) {
                // Inversion: solver `sat` = goal unreachable.
                Ok(RawAnswer::Sat) => answers.push(CheckResult::Unsatisfiable),
                Ok(RawAnswer::Unsat) => answers.push(CheckResult::Satisfiable),
                Ok(RawAnswer::Unknown(reason)) => {
                    tracing::debug!(solver = %solver.kind(), %reason, "solver answered unknown");
                    answers.push(CheckResult::Unknown);
                }
                Err(err) => {
                    tracing::warn!(solver = %solver.kind(), %err, "solver invocation failed");
                    failures += 1;
                }
            }
        }

        (resolve_portfolio(&answers, failures), Vec::new())
    }

    fn unhandled_queries(&self) -> Vec<String> {
        self.unhandled.clone()
    }
}

/// Combine per-solver answers into one result.
///
/// Contradicting definitive answers dominate everything (soundness
/// warning); otherwise any definitive answer wins over `Unknown`, and
/// `Error` is reported only when no solver produced an answer at all.
fn resolve_portfolio(answers: &[CheckResult], failures: usize) -> CheckResult {
    let any_sat = answers.iter().any(|a| a.is_sat());
    let any_unsat = answers.iter().any(|a| a.is_unsat());
    if any_sat && any_unsat {
        CheckResult::Conflicting
    } else if any_sat {
        CheckResult::Satisfiable
    } else if any_unsat {
        CheckResult::Unsatisfiable
    } else if !answers.is_empty() {
        CheckResult::Unknown
    } else if failures > 0 {
        CheckResult::Error
    } else {
        CheckResult::Unknown
    }
}
