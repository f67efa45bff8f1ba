use std::collections::BTreeSet;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::sort::Sort;

/// SMT-LIB term (expression) representation.
///
/// Integer literals are unbounded (`BigInt`): the encoder works with
/// 256-bit machine words and needs their wraparound moduli as constants.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    // === Literals ===
    /// Boolean literal
    BoolLit(bool),
    /// Integer literal (unbounded)
    IntLit(BigInt),

    // === Variables ===
    /// Named constant/variable reference
    Const(String),

    // === Boolean operations ===
    /// Logical NOT
    Not(Box<Term>),
    /// Logical AND (n-ary)
    And(Vec<Term>),
    /// Logical OR (n-ary)
    Or(Vec<Term>),
    /// Logical implication: `(=> a b)`
    Implies(Box<Term>, Box<Term>),
    /// Logical if-and-only-if: `(= a b)` for Bool
    Iff(Box<Term>, Box<Term>),

    // === Core ===
    /// Equality: `(= a b)`
    Eq(Box<Term>, Box<Term>),
    /// If-then-else: `(ite cond then else)`
    Ite(Box<Term>, Box<Term>, Box<Term>),

    // === Integer arithmetic ===
    /// `(+ a b)`
    IntAdd(Box<Term>, Box<Term>),
    /// `(- a b)`
    IntSub(Box<Term>, Box<Term>),
    /// `(* a b)`
    IntMul(Box<Term>, Box<Term>),
    /// `(div a b)` — integer division
    IntDiv(Box<Term>, Box<Term>),
    /// `(mod a b)`
    IntMod(Box<Term>, Box<Term>),
    /// `(- a)` — integer negation
    IntNeg(Box<Term>),
    /// `(< a b)`
    IntLt(Box<Term>, Box<Term>),
    /// `(<= a b)`
    IntLe(Box<Term>, Box<Term>),
    /// `(> a b)`
    IntGt(Box<Term>, Box<Term>),
    /// `(>= a b)`
    IntGe(Box<Term>, Box<Term>),

    // === Array operations ===
    /// `(select array index)`
    Select(Box<Term>, Box<Term>),
    /// `(store array index value)`
    Store(Box<Term>, Box<Term>, Box<Term>),
    /// Constant array: `((as const sort) value)`
    ConstArray(Sort, Box<Term>),

    // === Relation application ===
    /// `(p arg1 arg2 ...)` — also used for nullary relations `p`
    App(String, Vec<Term>),

    // === Quantifiers ===
    /// `(forall ((x Sort) ...) body)`
    Forall(Vec<(String, Sort)>, Box<Term>),
}

impl Term {
    /// Integer literal from any machine integer.
    pub fn int(value: impl Into<BigInt>) -> Self {
        Term::IntLit(value.into())
    }

    /// Named constant reference.
    pub fn cst(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    /// N-ary conjunction. Flattens nested `And`s and drops `true`
    /// literals; an empty conjunction collapses to `true` and a single
    /// conjunct is returned unwrapped.
    pub fn and(terms: Vec<Term>) -> Self {
        let mut flat = Vec::new();
        for t in terms {
            match t {
                Term::BoolLit(true) => {}
                Term::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Term::BoolLit(true),
            1 => flat.into_iter().next().unwrap(),
            _ => Term::And(flat),
        }
    }

    /// N-ary disjunction with the dual simplifications of [`Term::and`].
    pub fn or(terms: Vec<Term>) -> Self {
        let mut flat = Vec::new();
        for t in terms {
            match t {
                Term::BoolLit(false) => {}
                Term::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Term::BoolLit(false),
            1 => flat.into_iter().next().unwrap(),
            _ => Term::Or(flat),
        }
    }

    pub fn not(term: Term) -> Self {
        Term::Not(Box::new(term))
    }

    pub fn implies(antecedent: Term, consequent: Term) -> Self {
        Term::Implies(Box::new(antecedent), Box::new(consequent))
    }

    pub fn eq(lhs: Term, rhs: Term) -> Self {
        Term::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn gt(lhs: Term, rhs: Term) -> Self {
        Term::IntGt(Box::new(lhs), Box::new(rhs))
    }

    pub fn ge(lhs: Term, rhs: Term) -> Self {
        Term::IntGe(Box::new(lhs), Box::new(rhs))
    }

    pub fn lt(lhs: Term, rhs: Term) -> Self {
        Term::IntLt(Box::new(lhs), Box::new(rhs))
    }

    pub fn le(lhs: Term, rhs: Term) -> Self {
        Term::IntLe(Box::new(lhs), Box::new(rhs))
    }

    /// Zero literal, handy for `error = 0` guards.
    pub fn zero() -> Self {
        Term::IntLit(BigInt::zero())
    }

    /// Names of all free constants in this term.
    ///
    /// Constants bound by an enclosing `forall` are excluded; relation
    /// heads of `App` are not constants. Used by the Horn driver to
    /// quantify a rule over its free variables.
    pub fn free_consts(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_free(&mut out, &mut Vec::new());
        out
    }

    fn collect_free(&self, out: &mut BTreeSet<String>, bound: &mut Vec<String>) {
        match self {
            Term::BoolLit(_) | Term::IntLit(_) => {}
            Term::Const(name) => {
                if !bound.iter().any(|b| b == name) {
                    out.insert(name.clone());
                }
            }
            Term::Not(a) | Term::IntNeg(a) => a.collect_free(out, bound),
            Term::And(ts) | Term::Or(ts) | Term::App(_, ts) => {
                for t in ts {
                    t.collect_free(out, bound);
                }
            }
            Term::Implies(a, b)
            | Term::Iff(a, b)
            | Term::Eq(a, b)
            | Term::IntAdd(a, b)
            | Term::IntSub(a, b)
            | Term::IntMul(a, b)
            | Term::IntDiv(a, b)
            | Term::IntMod(a, b)
            | Term::IntLt(a, b)
            | Term::IntLe(a, b)
            | Term::IntGt(a, b)
            | Term::IntGe(a, b)
            | Term::Select(a, b) => {
                a.collect_free(out, bound);
                b.collect_free(out, bound);
            }
            Term::Ite(a, b, c) | Term::Store(a, b, c) => {
                a.collect_free(out, bound);
                b.collect_free(out, bound);
                c.collect_free(out, bound);
            }
            Term::ConstArray(_, v) => v.collect_free(out, bound),
            Term::Forall(vars, body) => {
                let depth = bound.len();
                bound.extend(vars.iter().map(|(n, _)| n.clone()));
                body.collect_free(out, bound);
                bound.truncate(depth);
            }
        }
    }

    /// Relation name if this term is a (possibly nullary) application.
    pub fn app_name(&self) -> Option<&str> {
        match self {
            Term::App(name, _) => Some(name),
            _ => None,
        }
    }
}
