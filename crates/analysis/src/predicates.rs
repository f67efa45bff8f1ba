//! Predicate factory: allocates uniquely-named symbolic predicates and
//! registers their underlying relations with the Horn backend.
//!
//! Predicates live in an arena and are addressed by [`PredicateId`];
//! every predicate is owned by the store for the whole analysis. A
//! predicate can be refreshed (`bump_index`) to re-declare it over a new
//! underlying relation — the driver does this with the error predicate
//! before each query so queries stay independent.

use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;

use solhorn_solver::HornBackend;

/// Handle to a predicate in the [`PredicateStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredicateId(usize);

#[derive(Debug)]
struct PredicateData {
    base_name: String,
    arg_sorts: Vec<Sort>,
    index: usize,
}

impl PredicateData {
    fn current_name(&self) -> String {
        if self.index == 0 {
            self.base_name.clone()
        } else {
            format!("{}_{}", self.base_name, self.index)
        }
    }
}

/// Arena of all symbolic predicates created during an analysis.
#[derive(Debug, Default)]
pub struct PredicateStore {
    preds: Vec<PredicateData>,
}

impl PredicateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a predicate and register its relation with the backend.
    /// The caller guarantees name uniqueness (block names embed a
    /// monotone counter; global predicates embed contract ids).
    pub fn create(
        &mut self,
        backend: &mut dyn HornBackend,
        arg_sorts: Vec<Sort>,
        name: impl Into<String>,
    ) -> PredicateId {
        let data = PredicateData {
            base_name: name.into(),
            arg_sorts,
            index: 0,
        };
        backend.register_relation(&data.current_name(), &data.arg_sorts);
        self.preds.push(data);
        PredicateId(self.preds.len() - 1)
    }

    pub fn name(&self, id: PredicateId) -> String {
        self.preds[id.0].current_name()
    }

    pub fn index(&self, id: PredicateId) -> usize {
        self.preds[id.0].index
    }

    pub fn arity(&self, id: PredicateId) -> usize {
        self.preds[id.0].arg_sorts.len()
    }

    /// Apply the predicate's current relation to an argument tuple.
    pub fn apply(&self, id: PredicateId, args: Vec<Term>) -> Term {
        let data = &self.preds[id.0];
        debug_assert_eq!(
            args.len(),
            data.arg_sorts.len(),
            "arity mismatch applying {}",
            data.base_name
        );
        Term::App(data.current_name(), args)
    }

    /// Refresh the predicate: new index, fresh underlying relation.
    pub fn bump_index(&mut self, backend: &mut dyn HornBackend, id: PredicateId) {
        let data = &mut self.preds[id.0];
        data.index += 1;
        backend.register_relation(&data.current_name(), &data.arg_sorts);
    }
}
