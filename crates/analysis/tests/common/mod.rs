//! Shared helpers for the encoder integration suites: a recording Horn
//! backend with scripted answers, and AST builders.
#![allow(dead_code)] // each test binary uses a different subset

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use solhorn_analysis::ast::{
    Block, CallKind, ContractDefinition, Expression, FunctionCall, FunctionDefinition,
    FunctionKind, NodeId, SourceLocation, Statement, Type, VariableDeclaration, Visibility,
};
use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;
use solhorn_solver::{CheckResult, HornBackend};

/// Everything the encoder told the backend, in order.
#[derive(Default)]
pub struct MockState {
    pub relations: Vec<(String, Vec<Sort>)>,
    pub variables: Vec<(String, Sort)>,
    pub rules: Vec<(Term, String)>,
    pub queries: Vec<Term>,
    /// Results replayed per query; `Unknown` once exhausted.
    pub script: Vec<CheckResult>,
    next_result: usize,
}

/// Recording backend sharing its state with the test through `Rc`.
#[derive(Clone, Default)]
pub struct MockBackend {
    pub state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(results: Vec<CheckResult>) -> Self {
        let mock = Self::default();
        mock.state.borrow_mut().script = results;
        mock
    }
}

impl HornBackend for MockBackend {
    fn declare_variable(&mut self, name: &str, sort: Sort) {
        self.state
            .borrow_mut()
            .variables
            .push((name.to_string(), sort));
    }

    fn register_relation(&mut self, name: &str, arg_sorts: &[Sort]) {
        self.state
            .borrow_mut()
            .relations
            .push((name.to_string(), arg_sorts.to_vec()));
    }

    fn add_rule(&mut self, rule: Term, name: &str) {
        self.state
            .borrow_mut()
            .rules
            .push((rule, name.to_string()));
    }

    fn query(&mut self, goal: &Term) -> (CheckResult, Vec<String>) {
        let mut state = self.state.borrow_mut();
        state.queries.push(goal.clone());
        let result = state
            .script
            .get(state.next_result)
            .copied()
            .unwrap_or(CheckResult::Unknown);
        state.next_result += 1;
        (result, Vec::new())
    }
}

/// Arity of each registered relation, last registration winning.
pub fn relation_arities(state: &MockState) -> HashMap<String, usize> {
    state
        .relations
        .iter()
        .map(|(name, sorts)| (name.clone(), sorts.len()))
        .collect()
}

/// Walk every relation application in a term.
pub fn walk_apps(term: &Term, visit: &mut impl FnMut(&str, usize)) {
    match term {
        Term::App(name, args) => {
            visit(name, args.len());
            for arg in args {
                walk_apps(arg, visit);
            }
        }
        Term::Not(a) | Term::IntNeg(a) | Term::ConstArray(_, a) => walk_apps(a, visit),
        Term::And(ts) | Term::Or(ts) => {
            for t in ts {
                walk_apps(t, visit);
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
            walk_apps(a, visit);
            walk_apps(b, visit);
        }
        Term::Ite(a, b, c) | Term::Store(a, b, c) => {
            walk_apps(a, visit);
            walk_apps(b, visit);
            walk_apps(c, visit);
        }
        Term::Forall(_, body) => walk_apps(body, visit),
        Term::BoolLit(_) | Term::IntLit(_) | Term::Const(_) => {}
    }
}

/// Every application of every relation, across all rules and queries,
/// uses the registered arity.
pub fn assert_arity_consistency(state: &MockState) {
    let arities = relation_arities(state);
    let mut check = |name: &str, arity: usize| {
        let registered = arities
            .get(name)
            .unwrap_or_else(|| panic!("application of unregistered relation {name}"));
        assert_eq!(
            *registered, arity,
            "arity mismatch for {name}: registered {registered}, applied {arity}"
        );
    };
    for (rule, _) in &state.rules {
        walk_apps(rule, &mut check);
    }
    for query in &state.queries {
        walk_apps(query, &mut check);
    }
}

/// True if any rule's rendered SMT-LIB text contains `needle`.
pub fn any_rule_contains(state: &MockState, needle: &str) -> bool {
    state
        .rules
        .iter()
        .any(|(rule, _)| rule.to_string().contains(needle))
}

// -------------------------------------------------------------------
// AST builders
// -------------------------------------------------------------------

pub fn public_function(
    id: NodeId,
    name: &str,
    parameters: Vec<VariableDeclaration>,
    statements: Vec<Statement>,
) -> FunctionDefinition {
    FunctionDefinition {
        id,
        name: name.to_string(),
        kind: FunctionKind::Regular,
        visibility: Visibility::Public,
        parameters,
        return_parameters: vec![],
        body: Some(Block::new(statements)),
        loc: SourceLocation::default(),
    }
}

pub fn internal_function(
    id: NodeId,
    name: &str,
    parameters: Vec<VariableDeclaration>,
    statements: Vec<Statement>,
) -> FunctionDefinition {
    FunctionDefinition {
        visibility: Visibility::Internal,
        ..public_function(id, name, parameters, statements)
    }
}

pub fn constructor(id: NodeId, statements: Vec<Statement>) -> FunctionDefinition {
    FunctionDefinition {
        id,
        name: String::new(),
        kind: FunctionKind::Constructor,
        visibility: Visibility::Public,
        parameters: vec![],
        return_parameters: vec![],
        body: Some(Block::new(statements)),
        loc: SourceLocation::default(),
    }
}

pub fn contract(
    id: NodeId,
    name: &str,
    state_variables: Vec<VariableDeclaration>,
    functions: Vec<FunctionDefinition>,
) -> ContractDefinition {
    ContractDefinition {
        state_variables,
        functions,
        ..ContractDefinition::new(id, name)
    }
}

pub fn assert_stmt(id: NodeId, condition: Expression) -> Statement {
    Statement::Expression(Expression::Call(FunctionCall::new(
        id,
        CallKind::Assert,
        vec![condition],
    )))
}

pub fn require_stmt(id: NodeId, condition: Expression) -> Statement {
    Statement::Expression(Expression::Call(FunctionCall::new(
        id,
        CallKind::Require,
        vec![condition],
    )))
}

pub fn internal_call_stmt(id: NodeId, callee: NodeId, arguments: Vec<Expression>) -> Statement {
    Statement::Expression(Expression::Call(FunctionCall::new(
        id,
        CallKind::Internal { callee },
        arguments,
    )))
}

pub fn unknown_call_stmt(id: NodeId) -> Statement {
    Statement::Expression(Expression::Call(FunctionCall::new(
        id,
        CallKind::External,
        vec![],
    )))
}

pub fn assign_stmt(lhs: Expression, rhs: Expression) -> Statement {
    Statement::Expression(Expression::assign(lhs, rhs))
}

pub fn uint(id: NodeId, name: &str) -> VariableDeclaration {
    VariableDeclaration::new(id, name, Type::uint256())
}

pub fn boolean(id: NodeId, name: &str) -> VariableDeclaration {
    VariableDeclaration::new(id, name, Type::Bool)
}
