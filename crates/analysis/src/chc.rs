//! The CHC encoder: walks contract, function, and statement structure
//! and emits a symbolic control-flow graph whose edges are Horn
//! implications, then queries the solver once per assertion.
//!
//! Program points become uninterpreted relations ("blocks"); an edge
//! `from ∧ Γ ∧ c ⇒ to` relates the SSA valuations visible at two points,
//! where Γ is the constraint context accumulated since the last block
//! boundary. Per-function summaries abstract calls; per-contract
//! interface relations pin the inter-transaction invariant; the `error`
//! SSA variable threads the id of the first failed assertion through
//! every summary.
//!
//! Encoding is a single, syntax-directed pass over a borrowed AST. All
//! mutable state (current block, SSA indices, the loop-destination
//! stack, the call graph) lives in this struct and is touched only by
//! the driving thread.

use std::collections::{BTreeSet, HashMap};

use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;

use solhorn_solver::{CheckResult, HornBackend};

use crate::ast::{
    Block, CallKind, ContractDefinition, Expression, FunctionCall, FunctionDefinition,
    FunctionKind, NodeId, SourceUnit, Statement, Type,
};
use crate::call_graph::CallGraph;
use crate::context::{Context, SymbolicVariable};
use crate::diagnostics::Reporter;
use crate::exprs::ExprEncoder;
use crate::predicates::{PredicateId, PredicateStore};
use crate::sorts;

/// Where `break` and `continue` jump inside the innermost loop.
#[derive(Debug, Clone, Copy)]
struct LoopDest {
    break_to: PredicateId,
    continue_to: PredicateId,
}

/// A pending reachability check: `scope` owns the assertion set, `from`
/// is the predicate application at which the property is checked,
/// `constraints` guards the failure, and `error_id` is the symbolic
/// error index at that point.
#[derive(Debug, Clone)]
pub struct VerificationTarget {
    pub from: Term,
    pub constraints: Term,
    pub error_id: Term,
}

/// The model-checking core. One instance per analysed source unit.
pub struct ChcEncoder<'a> {
    unit: &'a SourceUnit,
    backend: Box<dyn HornBackend>,
    reporter: Reporter,
    ctx: Context,
    store: PredicateStore,

    genesis: Option<PredicateId>,
    interfaces: HashMap<NodeId, PredicateId>,
    /// `(analysed contract, function)` → summary. Library functions are
    /// keyed under the library itself.
    summaries: HashMap<(NodeId, NodeId), PredicateId>,
    error_predicate: Option<PredicateId>,
    constructor_summary: Option<PredicateId>,
    implicit_constructor: Option<PredicateId>,

    current_block: Term,
    current_contract: Option<NodeId>,
    current_function: Option<NodeId>,
    state_vars: Vec<NodeId>,
    state_sorts: Vec<Sort>,
    error: SymbolicVariable,
    loop_dests: Vec<LoopDest>,
    unknown_call_seen: bool,
    block_counter: usize,

    verification_targets: Vec<(NodeId, VerificationTarget)>,
    function_assertions: HashMap<NodeId, BTreeSet<NodeId>>,
    assertion_locations: HashMap<NodeId, crate::ast::SourceLocation>,
    call_graph: CallGraph,
    safe_assertions: BTreeSet<NodeId>,
}

impl<'a> ChcEncoder<'a> {
    pub fn new(unit: &'a SourceUnit, backend: Box<dyn HornBackend>) -> Self {
        Self {
            unit,
            backend,
            reporter: Reporter::new(),
            ctx: Context::new(),
            store: PredicateStore::new(),
            genesis: None,
            interfaces: HashMap::new(),
            summaries: HashMap::new(),
            error_predicate: None,
            constructor_summary: None,
            implicit_constructor: None,
            current_block: Term::BoolLit(true),
            current_contract: None,
            current_function: None,
            state_vars: Vec::new(),
            state_sorts: Vec::new(),
            error: SymbolicVariable::new("error", Sort::Int),
            loop_dests: Vec::new(),
            unknown_call_seen: false,
            block_counter: 0,
            verification_targets: Vec::new(),
            function_assertions: HashMap::new(),
            assertion_locations: HashMap::new(),
            call_graph: CallGraph::new(),
            safe_assertions: BTreeSet::new(),
        }
    }

    /// Run the full encoding and querying pass. Side effects are the
    /// safe-assertion set and reporter warnings.
    pub fn analyze(&mut self) {
        let genesis = self
            .store
            .create(self.backend.as_mut(), Vec::new(), "genesis");
        self.genesis = Some(genesis);
        let genesis_app = self.store.apply(genesis, Vec::new());
        self.backend.add_rule(genesis_app, "genesis");

        self.define_interfaces_and_summaries();

        let unit = self.unit;
        for contract in &unit.contracts {
            self.visit_contract(contract);
        }

        self.run_queries();
    }

    /// Assertions proven safe (UNSAT reachability proofs).
    pub fn safe_assertions(&self) -> &BTreeSet<NodeId> {
        &self.safe_assertions
    }

    /// Queries no solver answered, for offline solving.
    pub fn unhandled_queries(&self) -> Vec<String> {
        self.backend.unhandled_queries()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    /// All assertion sites checked for a transaction rooted at `scope`:
    /// the union of the assertion sets of every function reachable
    /// through the recorded call graph.
    pub fn transaction_assertions(&self, scope: NodeId) -> BTreeSet<NodeId> {
        let mut out = BTreeSet::new();
        for node in self.call_graph.reachable_from(scope) {
            if let Some(set) = self.function_assertions.get(&node) {
                out.extend(set.iter().copied());
            }
        }
        out
    }

    // -----------------------------------------------------------------
    // Pre-pass: interfaces and summaries
    // -----------------------------------------------------------------

    /// Declare the `interface` predicate of every base of every contract
    /// and a summary predicate for every defined function, so calls can
    /// reference callees that are encoded later.
    fn define_interfaces_and_summaries(&mut self) {
        let unit = self.unit;
        for contract in &unit.contracts {
            for &base_id in &contract.base_ids {
                let Some(base) = unit.contract(base_id) else {
                    tracing::warn!(base = base_id, "linearised base missing from source unit");
                    continue;
                };
                if !self.interfaces.contains_key(&base_id) {
                    let arg_sorts = sorts::interface_sort(unit, base);
                    let name = format!("interface_{}_{}", base.name, base.id);
                    let pred = self.store.create(self.backend.as_mut(), arg_sorts, name);
                    self.interfaces.insert(base_id, pred);
                }
                for var in sorts::state_variables(unit, base) {
                    if !self.ctx.known(var.id) {
                        self.ctx.declare(var);
                    }
                }
                for function in &base.functions {
                    let key = (contract.id, function.id);
                    if self.summaries.contains_key(&key) {
                        continue;
                    }
                    let arg_sorts = sorts::summary_sort(unit, function, contract);
                    let name = format!(
                        "summary_{}_{}",
                        self.fresh_block_index(),
                        predicate_name(function, contract)
                    );
                    let pred = self.store.create(self.backend.as_mut(), arg_sorts, name);
                    self.summaries.insert(key, pred);
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Contracts
    // -----------------------------------------------------------------

    fn visit_contract(&mut self, contract: &'a ContractDefinition) {
        tracing::info!(contract = %contract.name, "encoding contract");
        self.reset_contract_analysis();
        self.current_contract = Some(contract.id);

        let unit = self.unit;
        self.state_vars = sorts::state_variables(unit, contract)
            .iter()
            .map(|v| v.id)
            .collect();
        self.state_sorts = sorts::state_sorts(unit, contract);
        self.clear_indices(None);

        let suffix = format!("{}_{}", contract.name, contract.id);
        self.error_predicate = Some(self.store.create(
            self.backend.as_mut(),
            Vec::new(),
            format!("error_{suffix}"),
        ));
        self.constructor_summary = Some(self.store.create(
            self.backend.as_mut(),
            sorts::constructor_sort(&self.state_sorts),
            format!("summary_constructor_{suffix}"),
        ));
        self.implicit_constructor = Some(self.store.create(
            self.backend.as_mut(),
            self.state_sorts.clone(),
            format!("implicit_constructor_{suffix}"),
        ));

        let state = self.current_state_variables();
        let interface = self.interfaces[&contract.id];
        self.set_current_block(interface, Some(state));

        for function in &contract.functions {
            if !function.is_constructor() {
                self.visit_function(function, contract);
            }
        }

        self.end_visit_contract(contract);
    }

    fn end_visit_contract(&mut self, contract: &'a ContractDefinition) {
        // State starts the deployment at each type's zero value; SSA 0
        // carries that snapshot.
        for id in self.state_vars.clone() {
            self.ctx.reset_var(id);
            let decl = self
                .unit
                .contracts
                .iter()
                .flat_map(|c| c.state_variables.iter())
                .find(|v| v.id == id)
                .expect("state variable missing from source unit");
            let zero = sorts::zero_value(&decl.ty);
            let current = self.ctx.variable(id).current_value();
            self.ctx.add_assertion(Term::eq(current, zero));
            self.ctx.bump_var(id);
        }

        let implicit = self.implicit_constructor.expect("contract not initialised");
        let implicit_app = {
            let args = self.state_variables_at(0);
            self.store.apply(implicit, args)
        };
        let genesis_app = self.genesis_app();
        self.connect(genesis_app, implicit_app.clone(), Term::BoolLit(true));
        self.current_block = implicit_app;
        self.ctx
            .add_assertion(Term::eq(self.error.current_value(), Term::zero()));

        if let Some(constructor) = contract.constructor() {
            self.visit_function(constructor, contract);
        } else {
            self.inline_constructor_hierarchy(contract);
        }

        let summary_pred = self.constructor_summary.expect("contract not initialised");
        let summary_app = {
            let mut args = vec![self.error.current_value()];
            args.extend(self.current_state_variables());
            self.store.apply(summary_pred, args)
        };
        self.connect(self.current_block.clone(), summary_app, Term::BoolLit(true));

        self.clear_indices(None);
        let state_exprs = {
            let mut args = vec![self.error.current_value()];
            args.extend(self.current_state_variables());
            args
        };
        self.set_current_block(summary_pred, Some(state_exprs));

        // The constructor phase is itself a verification target: asserts
        // in constructors (and in functions they call) are checked here.
        self.verification_targets.push((
            contract.id,
            VerificationTarget {
                from: self.current_block.clone(),
                constraints: Term::BoolLit(true),
                error_id: self.error.current_value(),
            },
        ));
        let interface_app = {
            let args = self.current_state_variables();
            self.store.apply(self.interfaces[&contract.id], args)
        };
        self.connect(
            self.current_block.clone(),
            interface_app,
            Term::eq(self.error.current_value(), Term::zero()),
        );
    }

    /// No explicit constructor: run every base constructor, parent-most
    /// first, chaining through their exit blocks.
    fn inline_constructor_hierarchy(&mut self, contract: &'a ContractDefinition) {
        let unit = self.unit;
        for &base_id in contract.base_ids.iter().rev() {
            if base_id == contract.id {
                continue;
            }
            let Some(base) = unit.contract(base_id) else {
                continue;
            };
            if let Some(constructor) = base.constructor() {
                self.visit_function(constructor, base);
            }
        }
    }

    // -----------------------------------------------------------------
    // Functions
    // -----------------------------------------------------------------

    fn visit_function(
        &mut self,
        function: &'a FunctionDefinition,
        contract: &'a ContractDefinition,
    ) {
        if !function.is_implemented() {
            return;
        }

        // A constructor visited while another is being encoded is a base
        // constructor of the chain: its body is inlined straight into the
        // current CFG, with no entry predicate of its own.
        if self.current_function.is_some() {
            debug_assert!(function.is_constructor(), "function inlining outside constructors");
            self.declare_function_variables(function);
            self.encode_block(function.body.as_ref().expect("implemented body"));
            return;
        }

        self.current_function = Some(function.id);
        self.init_function(function);

        let entry = self.create_entry_block(function, contract);
        let body = self.create_block(function, contract, "");

        let entry_app = {
            let args = self.current_function_variables(function);
            self.store.apply(entry, args)
        };
        let body_app = self.apply_block(body);

        if function.is_constructor() {
            self.connect(self.current_block.clone(), entry_app.clone(), Term::BoolLit(true));
        } else {
            let genesis_app = self.genesis_app();
            self.connect(genesis_app, entry_app.clone(), Term::BoolLit(true));
        }

        // At entry, no assertion has failed and SSA 0 snapshots the state
        // and the parameters.
        self.ctx
            .add_assertion(Term::eq(self.error.current_value(), Term::zero()));
        for id in self.state_vars.clone() {
            let var = self.ctx.variable(id);
            self.ctx
                .add_assertion(Term::eq(var.value_at(0), var.current_value()));
        }
        for param in &function.parameters {
            let var = self.ctx.variable(param.id);
            self.ctx
                .add_assertion(Term::eq(var.value_at(0), var.current_value()));
        }

        self.connect(entry_app, body_app, Term::BoolLit(true));
        self.set_current_block(body, None);

        if function.is_constructor() && contract.id == self.current_contract.expect("in contract") {
            // Base constructors execute before the derived body.
            let unit = self.unit;
            for &base_id in contract.base_ids.iter().rev() {
                if base_id == contract.id {
                    continue;
                }
                let Some(base) = unit.contract(base_id) else {
                    continue;
                };
                if let Some(base_ctor) = base.constructor() {
                    self.visit_function(base_ctor, base);
                }
            }
        }

        self.encode_block(function.body.as_ref().expect("implemented body"));
        self.end_visit_function(function, contract);
    }

    fn end_visit_function(
        &mut self,
        function: &'a FunctionDefinition,
        contract: &'a ContractDefinition,
    ) {
        if function.is_constructor() {
            // Constructors exit through an extra block so the contract's
            // end-visit can stitch the chain regardless of whether the
            // hierarchy had explicit constructors.
            let current = self.current_contract.expect("in contract");
            let current_def = self.unit.contract(current).expect("current contract");
            let exit = self.store.create(
                self.backend.as_mut(),
                sorts::constructor_sort(&self.state_sorts),
                format!(
                    "constructor_exit_{}_{}_{}",
                    self.block_counter, current_def.name, current_def.id
                ),
            );
            self.block_counter += 1;
            let exit_app = {
                let mut args = vec![self.error.current_value()];
                args.extend(self.current_state_variables());
                self.store.apply(exit, args)
            };
            self.connect(self.current_block.clone(), exit_app, Term::BoolLit(true));

            self.clear_indices(Some(function));
            let args = {
                let mut args = vec![self.error.current_value()];
                args.extend(self.current_state_variables());
                args
            };
            self.set_current_block(exit, Some(args));
            self.current_function = None;
        } else {
            let assertion_error = self.error.current_value();
            let summary_app = self.function_summary_app(function);
            self.connect(
                self.current_block.clone(),
                summary_app.clone(),
                Term::BoolLit(true),
            );

            // Interface application over the post-state, captured before
            // indices are cleared so it lines up with the summary.
            let interface_pred = self.interfaces[&contract.id];
            let interface_after = {
                let args = self.current_state_variables();
                self.store.apply(interface_pred, args)
            };

            let init_state = self.state_variables_at(0);
            self.set_current_block(interface_pred, Some(init_state));
            self.current_function = None;

            if function.is_public() {
                self.verification_targets.push((
                    function.id,
                    VerificationTarget {
                        from: self.current_block.clone(),
                        constraints: summary_app.clone(),
                        error_id: assertion_error.clone(),
                    },
                ));
                self.connect(
                    self.current_block.clone(),
                    interface_after,
                    Term::and(vec![summary_app, Term::eq(assertion_error, Term::zero())]),
                );
            }
        }
    }

    fn init_function(&mut self, function: &'a FunctionDefinition) {
        self.ctx.clear_path_conditions();
        self.declare_function_variables(function);
    }

    fn declare_function_variables(&mut self, function: &'a FunctionDefinition) {
        for var in function
            .parameters
            .iter()
            .chain(function.return_parameters.iter())
        {
            if !self.ctx.known(var.id) {
                self.ctx.declare(var);
            }
        }
        for var in function.local_variables() {
            if !self.ctx.known(var.id) {
                self.ctx.declare(var);
            }
        }
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn encode_block(&mut self, block: &'a Block) {
        for statement in &block.statements {
            self.encode_statement(statement);
        }
    }

    fn encode_statement(&mut self, statement: &'a Statement) {
        match statement {
            Statement::Block(block) => self.encode_block(block),

            Statement::VariableDeclaration {
                decl,
                initial_value,
            } => {
                if !self.ctx.known(decl.id) {
                    self.ctx.declare(decl);
                }
                let value = match initial_value {
                    Some(Expression::Call(call)) => self.encode_call(call),
                    Some(expr) => Some(self.expr(expr)),
                    None => Some(sorts::zero_value(&decl.ty)),
                };
                self.ctx.bump_var(decl.id);
                if let Some(value) = value {
                    let current = self.ctx.variable(decl.id).current_value();
                    self.ctx.add_assertion(Term::eq(current, value));
                }
            }

            Statement::Expression(expr) => match expr {
                Expression::Call(call) => {
                    self.encode_call(call);
                }
                Expression::Assignment { lhs, rhs } => {
                    if let Expression::Call(call) = rhs.as_ref() {
                        let value = self.encode_call(call);
                        let mut enc = ExprEncoder::new(&mut self.ctx);
                        match value {
                            Some(value) => {
                                enc.assign(lhs, value);
                            }
                            // The callee is opaque: the target keeps a
                            // fresh, unconstrained SSA name.
                            None => enc.havoc_target(lhs),
                        }
                    } else {
                        self.expr(expr);
                    }
                }
                other => {
                    self.expr(other);
                }
            },

            Statement::If {
                condition,
                true_branch,
                false_branch,
            } => self.encode_if(condition, true_branch, false_branch.as_ref()),

            Statement::While {
                condition,
                body,
                is_do_while,
            } => self.encode_while(condition, body, *is_do_while),

            Statement::For {
                init,
                condition,
                post,
                body,
            } => self.encode_for(init.as_deref(), condition.as_ref(), post.as_ref(), body),

            Statement::Break => {
                let dest = self
                    .loop_dests
                    .last()
                    .expect("break outside of a loop")
                    .break_to;
                self.jump_to(dest, "break_ghost_");
            }

            Statement::Continue => {
                let dest = self
                    .loop_dests
                    .last()
                    .expect("continue outside of a loop")
                    .continue_to;
                self.jump_to(dest, "continue_ghost_");
            }

            Statement::Return { values } => self.encode_return(values),
        }
    }

    fn encode_if(
        &mut self,
        condition: &'a Expression,
        true_branch: &'a Block,
        false_branch: Option<&'a Block>,
    ) {
        let unknown_call_was_seen = self.unknown_call_seen;
        self.unknown_call_seen = false;

        let function = self.current_function_def().expect("if outside function");
        let contract = self.current_contract_def();

        let header = self.create_block(function, contract, "if_header_");
        let true_block = self.create_block(function, contract, "if_true_");
        let false_block = false_branch.map(|_| self.create_block(function, contract, "if_false_"));
        let after_block = self.create_block(function, contract, "");

        self.connect_to_block(header);
        self.set_current_block(header, None);

        let condition_term = self.expr(condition);

        let true_app = self.apply_block(true_block);
        self.connect(self.current_block.clone(), true_app, condition_term.clone());
        match false_block {
            Some(pred) => {
                let false_app = self.apply_block(pred);
                self.connect(
                    self.current_block.clone(),
                    false_app,
                    Term::not(condition_term.clone()),
                );
            }
            None => {
                let after_app = self.apply_block(after_block);
                self.connect(
                    self.current_block.clone(),
                    after_app,
                    Term::not(condition_term.clone()),
                );
            }
        }

        self.set_current_block(true_block, None);
        self.encode_block(true_branch);
        self.connect_to_block(after_block);

        if let (Some(pred), Some(branch)) = (false_block, false_branch) {
            self.set_current_block(pred, None);
            self.encode_block(branch);
            self.connect_to_block(after_block);
        }

        self.set_current_block(after_block, None);

        if self.unknown_call_seen {
            self.erase_knowledge();
        }
        self.unknown_call_seen = unknown_call_was_seen;
    }

    fn encode_while(&mut self, condition: &'a Expression, body: &'a Block, is_do_while: bool) {
        let unknown_call_was_seen = self.unknown_call_seen;
        self.unknown_call_seen = false;

        let function = self.current_function_def().expect("loop outside function");
        let contract = self.current_contract_def();

        let prefix = if is_do_while { "do_while" } else { "while" };
        let header = self.create_block(function, contract, &format!("{prefix}_header_"));
        let body_block = self.create_block(function, contract, &format!("{prefix}_body_"));
        let after_block = self.create_block(function, contract, "");

        self.loop_dests.push(LoopDest {
            break_to: after_block,
            continue_to: header,
        });

        if is_do_while {
            self.encode_block(body);
        }

        self.connect_to_block(header);
        self.set_current_block(header, None);

        let condition_term = self.expr(condition);
        let body_app = self.apply_block(body_block);
        self.connect(self.current_block.clone(), body_app, condition_term.clone());
        let after_app = self.apply_block(after_block);
        self.connect(
            self.current_block.clone(),
            after_app,
            Term::not(condition_term),
        );

        self.set_current_block(body_block, None);
        self.encode_block(body);

        self.loop_dests.pop();

        // Back edge.
        self.connect_to_block(header);
        self.set_current_block(after_block, None);

        if self.unknown_call_seen {
            self.erase_knowledge();
        }
        self.unknown_call_seen = unknown_call_was_seen;
    }

    fn encode_for(
        &mut self,
        init: Option<&'a Statement>,
        condition: Option<&'a Expression>,
        post: Option<&'a Expression>,
        body: &'a Block,
    ) {
        let unknown_call_was_seen = self.unknown_call_seen;
        self.unknown_call_seen = false;

        let function = self.current_function_def().expect("loop outside function");
        let contract = self.current_contract_def();

        let header = self.create_block(function, contract, "for_header_");
        let body_block = self.create_block(function, contract, "for_body_");
        let after_block = self.create_block(function, contract, "");
        let post_block = post.map(|_| self.create_block(function, contract, "for_post_"));

        self.loop_dests.push(LoopDest {
            break_to: after_block,
            continue_to: post_block.unwrap_or(header),
        });

        if let Some(init) = init {
            self.encode_statement(init);
        }

        self.connect_to_block(header);
        self.set_current_block(header, None);

        let condition_term = match condition {
            Some(cond) => self.expr(cond),
            None => Term::BoolLit(true),
        };
        let body_app = self.apply_block(body_block);
        self.connect(self.current_block.clone(), body_app, condition_term.clone());
        let after_app = self.apply_block(after_block);
        self.connect(
            self.current_block.clone(),
            after_app,
            Term::not(condition_term),
        );

        self.set_current_block(body_block, None);
        self.encode_block(body);

        if let (Some(pred), Some(post)) = (post_block, post) {
            self.connect_to_block(pred);
            self.set_current_block(pred, None);
            self.expr(post);
        }

        self.loop_dests.pop();

        // Back edge.
        self.connect_to_block(header);
        self.set_current_block(after_block, None);

        if self.unknown_call_seen {
            self.erase_knowledge();
        }
        self.unknown_call_seen = unknown_call_was_seen;
    }

    /// Connect to a jump destination, then continue into a ghost block so
    /// statements after the jump stay well-formed without touching live
    /// edges.
    fn jump_to(&mut self, dest: PredicateId, ghost_prefix: &str) {
        let dest_app = self.apply_block(dest);
        self.connect(self.current_block.clone(), dest_app, Term::BoolLit(true));

        let function = self.current_function_def().expect("jump outside function");
        let contract = self.current_contract_def();
        let ghost = self.create_block(function, contract, ghost_prefix);
        self.current_block = self.apply_block(ghost);
    }

    fn encode_return(&mut self, values: &'a [Expression]) {
        let function = self.current_function_def().expect("return outside function");
        let params: Vec<NodeId> = function.return_parameters.iter().map(|p| p.id).collect();
        for (param, value) in params.into_iter().zip(values) {
            let term = self.expr(value);
            self.ctx.bump_var(param);
            let current = self.ctx.variable(param).current_value();
            self.ctx.add_assertion(Term::eq(current, term));
        }
    }

    // -----------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------

    /// Dispatch on the call kind. Returns the first return value's term
    /// for calls that produce one.
    fn encode_call(&mut self, call: &'a FunctionCall) -> Option<Term> {
        match &call.kind {
            CallKind::Assert => {
                self.visit_assert(call);
                None
            }
            CallKind::Require => {
                debug_assert_eq!(call.arguments.len(), 1, "require takes one argument");
                let condition = self.expr(&call.arguments[0]);
                self.ctx.add_assertion(condition);
                None
            }
            CallKind::Internal { callee } => self.internal_function_call(call, *callee),
            _ => {
                debug_assert!(call.kind.is_unknown());
                for argument in &call.arguments {
                    self.expr(argument);
                }
                self.unknown_function_call(call);
                None
            }
        }
    }

    fn visit_assert(&mut self, call: &'a FunctionCall) {
        debug_assert_eq!(call.arguments.len(), 1, "assert takes one argument");
        let condition = self.expr(&call.arguments[0]);

        let scope = self.assertion_scope();
        self.function_assertions
            .entry(scope)
            .or_default()
            .insert(call.id);
        self.assertion_locations.insert(call.id, call.loc);

        let previous_error = self.error.current_value();
        self.bump_error();

        let target = self.enclosing_summary_app();
        // Path conditions are `true` here: branching lives in block
        // predicates, not in guarded subterms.
        let guard = Term::and(vec![
            self.ctx.path_conditions(),
            Term::not(condition),
            Term::eq(self.error.current_value(), Term::int(call.id)),
        ]);
        self.connect(self.current_block.clone(), target, guard);

        // The live continuation is unaffected.
        self.ctx
            .add_assertion(Term::eq(self.error.current_value(), previous_error));
    }

    fn internal_function_call(&mut self, call: &'a FunctionCall, callee: NodeId) -> Option<Term> {
        let unit = self.unit;
        let Some(function) = unit.function(callee) else {
            tracing::warn!(callee, "unresolved internal call treated as unknown");
            self.unknown_function_call(call);
            return None;
        };
        let declaring = unit
            .declaring_contract(callee)
            .expect("function without declaring contract");

        let summary_key = if declaring.is_library {
            (declaring.id, callee)
        } else {
            (self.current_contract.expect("in contract"), callee)
        };
        if !self.summaries.contains_key(&summary_key) {
            tracing::warn!(
                callee,
                "no summary for callee (outside the hierarchy?); treated as unknown"
            );
            self.unknown_function_call(call);
            return None;
        }

        self.call_graph.add_edge(self.assertion_scope(), callee);

        // Libraries keep constants as their "state"; require that they
        // were constructed.
        if declaring.is_library {
            let interface = self.interfaces[&declaring.id];
            let app = {
                let args = self.contract_state_at(declaring, 0);
                self.store.apply(interface, args)
            };
            self.ctx.add_assertion(app);
        }

        let previous_error = self.error.current_value();

        let summary = self.call_summary(call, function, declaring, summary_key);
        self.ctx.add_assertion(summary);

        // Early exit if the callee fails.
        let enclosing = self.enclosing_summary_app();
        self.connect(
            self.current_block.clone(),
            enclosing,
            Term::gt(self.error.current_value(), Term::zero()),
        );
        self.ctx
            .add_assertion(Term::eq(self.error.current_value(), Term::zero()));
        self.bump_error();
        self.ctx
            .add_assertion(Term::eq(self.error.current_value(), previous_error));

        function
            .return_parameters
            .first()
            .map(|param| self.ctx.variable(param.id).current_value())
    }

    /// Build the callee's summary application over SSA-linked arguments:
    /// `(newError, preState, args..., postState, returns...)`.
    ///
    /// Library pre/post state is snapshotted at SSA indices 0 and 1 of
    /// the library's own variables; library calls must therefore not nest
    /// within one another on the same assertion frame.
    fn call_summary(
        &mut self,
        call: &'a FunctionCall,
        function: &'a FunctionDefinition,
        declaring: &'a ContractDefinition,
        summary_key: (NodeId, NodeId),
    ) -> Term {
        let argument_terms = {
            let mut enc = ExprEncoder::new(&mut self.ctx);
            enc.symbolic_arguments(call)
        };

        self.bump_error();
        let mut args = vec![self.error.current_value()];
        if declaring.is_library {
            args.extend(self.contract_state_at(declaring, 0));
        } else {
            args.extend(self.current_state_variables());
        }
        args.extend(argument_terms);

        // The callee may touch any state; havoc the caller's view.
        for id in self.state_vars.clone() {
            self.ctx.bump_var(id);
        }
        if declaring.is_library {
            args.extend(self.contract_state_at(declaring, 1));
        } else {
            args.extend(self.current_state_variables());
        }

        for param in &function.return_parameters {
            if self.ctx.known(param.id) {
                self.ctx.bump_var(param.id);
            } else {
                self.ctx.declare(param);
            }
        }
        for param in &function.return_parameters {
            args.push(self.ctx.variable(param.id).current_value());
        }

        self.store.apply(self.summaries[&summary_key], args)
    }

    fn unknown_function_call(&mut self, _call: &'a FunctionCall) {
        self.erase_knowledge();
        // Enclosing ifs and loops havoc again on exit.
        self.unknown_call_seen = true;
    }

    /// Fresh SSA names for everything an unknown callee may alias.
    /// Value-typed state is deliberately left pinned; if the unknown
    /// callee can re-enter and write it, this under-approximates.
    fn erase_knowledge(&mut self) {
        let bumped = self.ctx.havoc_where(Type::is_reference);
        tracing::debug!(count = bumped.len(), "erased reference-typed knowledge");
    }

    // -----------------------------------------------------------------
    // Driver
    // -----------------------------------------------------------------

    fn run_queries(&mut self) {
        let targets = std::mem::take(&mut self.verification_targets);
        for (scope, target) in targets {
            for assertion in self.transaction_assertions(scope) {
                self.create_error_block();
                let error_app = self.error_app();
                let guard = Term::and(vec![
                    target.constraints.clone(),
                    Term::eq(target.error_id.clone(), Term::int(assertion)),
                ]);
                self.connect(target.from.clone(), error_app.clone(), guard);

                self.flush_declarations();
                let (result, _values) = self.backend.query(&error_app);
                let location = self
                    .assertion_locations
                    .get(&assertion)
                    .copied()
                    .unwrap_or_default();
                match result {
                    CheckResult::Unsatisfiable => {
                        self.safe_assertions.insert(assertion);
                    }
                    CheckResult::Conflicting => self.reporter.warning(
                        location,
                        "At least two solvers provided conflicting answers. \
                         Results might not be sound.",
                    ),
                    CheckResult::Error => self
                        .reporter
                        .warning(location, "Error trying to invoke the Horn solver."),
                    CheckResult::Satisfiable | CheckResult::Unknown => {}
                }
            }
        }
    }

    /// Refresh the error relation so queries stay independent.
    fn create_error_block(&mut self) {
        let pred = self.error_predicate.expect("no contract was encoded");
        self.store.bump_index(self.backend.as_mut(), pred);
    }

    // -----------------------------------------------------------------
    // Blocks, edges, predicate applications
    // -----------------------------------------------------------------

    /// Add the Horn rule `from ∧ Γ ∧ constraints ⇒ to`, with Γ the
    /// assertion context accumulated since the last block boundary.
    fn connect(&mut self, from: Term, to: Term, constraints: Term) {
        let body = Term::and(vec![from.clone(), self.ctx.assertions(), constraints]);
        let rule = Term::implies(body, to.clone());
        let name = format!(
            "{}_to_{}",
            from.app_name().unwrap_or("expr"),
            to.app_name().unwrap_or("expr")
        );
        self.flush_declarations();
        self.backend.add_rule(rule, &name);
    }

    /// Make `pred` (applied to the current frame) the current block.
    ///
    /// Pops the previous assertion frame, re-canonicalises every SSA
    /// index, and pushes a fresh frame, so each block starts from a clean
    /// constraint context. Every push is matched by a pop here or at the
    /// end of the analysis.
    fn set_current_block(&mut self, pred: PredicateId, args: Option<Vec<Term>>) {
        if self.ctx.frame_depth() > 0 {
            self.ctx.pop_frame();
        }
        let function = self.current_function_def();
        self.clear_indices(function);
        self.ctx.push_frame();
        self.current_block = match args {
            Some(args) => self.store.apply(pred, args),
            None => self.apply_block(pred),
        };
    }

    /// Reset SSA indices so the current value of every variable in scope
    /// is index 1, keeping index 0 as the entry snapshot.
    fn clear_indices(&mut self, function: Option<&'a FunctionDefinition>) {
        for id in self.state_vars.clone() {
            self.ctx.reset_var(id);
            self.ctx.bump_var(id);
        }
        if let Some(function) = function {
            for var in function
                .parameters
                .iter()
                .chain(function.return_parameters.iter())
            {
                self.ctx.reset_var(var.id);
                self.ctx.bump_var(var.id);
            }
            for var in function.local_variables() {
                self.ctx.reset_var(var.id);
                self.ctx.bump_var(var.id);
            }
        }
    }

    fn connect_to_block(&mut self, pred: PredicateId) {
        let app = self.apply_block(pred);
        self.connect(self.current_block.clone(), app, Term::BoolLit(true));
    }

    fn create_entry_block(
        &mut self,
        function: &'a FunctionDefinition,
        contract: &'a ContractDefinition,
    ) -> PredicateId {
        let arg_sorts = sorts::function_sort(function, &self.state_sorts);
        let name = format!(
            "block_{}_{}",
            self.fresh_block_index(),
            predicate_name(function, contract)
        );
        self.store.create(self.backend.as_mut(), arg_sorts, name)
    }

    fn create_block(
        &mut self,
        function: &'a FunctionDefinition,
        contract: &'a ContractDefinition,
        prefix: &str,
    ) -> PredicateId {
        let arg_sorts = sorts::block_sort(function, &self.state_sorts);
        let name = format!(
            "block_{}_{}{}",
            self.fresh_block_index(),
            prefix,
            predicate_name(function, contract)
        );
        self.store.create(self.backend.as_mut(), arg_sorts, name)
    }

    /// Apply a block predicate to the full current frame: error index,
    /// entry snapshots, current state, parameters, returns, and locals.
    fn apply_block(&self, pred: PredicateId) -> Term {
        let function = self
            .current_function_def()
            .expect("block application outside function");
        let mut args = self.current_function_variables(function);
        for var in function.local_variables() {
            args.push(self.ctx.variable(var.id).current_value());
        }
        self.store.apply(pred, args)
    }

    fn current_function_variables(&self, function: &FunctionDefinition) -> Vec<Term> {
        let mut args = vec![self.error.current_value()];
        args.extend(self.state_variables_at(0));
        args.extend(
            function
                .parameters
                .iter()
                .map(|p| self.ctx.variable(p.id).value_at(0)),
        );
        args.extend(self.current_state_variables());
        args.extend(
            function
                .parameters
                .iter()
                .map(|p| self.ctx.variable(p.id).current_value()),
        );
        args.extend(
            function
                .return_parameters
                .iter()
                .map(|p| self.ctx.variable(p.id).current_value()),
        );
        args
    }

    /// `summary(F)` for the function currently being encoded (or any
    /// function of the current contract): error, pre-state at SSA 0,
    /// parameters at SSA 0, current state, current returns.
    fn function_summary_app(&mut self, function: &'a FunctionDefinition) -> Term {
        let declaring = self
            .unit
            .declaring_contract(function.id)
            .expect("function without declaring contract");
        let mut args = vec![self.error.current_value()];
        if declaring.is_library {
            args.extend(self.contract_state_at(declaring, 0));
        } else {
            args.extend(self.state_variables_at(0));
        }
        args.extend(
            function
                .parameters
                .iter()
                .map(|p| self.ctx.variable(p.id).value_at(0)),
        );
        if declaring.is_library {
            args.extend(self.contract_state_at(declaring, 1));
        } else {
            args.extend(self.current_state_variables());
        }
        args.extend(
            function
                .return_parameters
                .iter()
                .map(|p| self.ctx.variable(p.id).current_value()),
        );
        let key = (self.current_contract.expect("in contract"), function.id);
        self.store.apply(self.summaries[&key], args)
    }

    /// The summary a failing path escapes into: the current function's,
    /// or the constructor summary during the constructor phase.
    fn enclosing_summary_app(&mut self) -> Term {
        match self.current_function_def() {
            Some(function) if !function.is_constructor() => self.function_summary_app(function),
            _ => {
                let pred = self.constructor_summary.expect("in contract");
                let mut args = vec![self.error.current_value()];
                args.extend(self.current_state_variables());
                self.store.apply(pred, args)
            }
        }
    }

    /// Scope owning assertions and call edges at the current point: the
    /// current function, or the contract during the constructor phase.
    fn assertion_scope(&self) -> NodeId {
        match self.current_function_def() {
            Some(function) if !function.is_constructor() => function.id,
            _ => self.current_contract.expect("in contract"),
        }
    }

    // -----------------------------------------------------------------
    // State helpers
    // -----------------------------------------------------------------

    fn reset_contract_analysis(&mut self) {
        self.state_vars.clear();
        self.state_sorts.clear();
        self.unknown_call_seen = false;
        self.loop_dests.clear();
        self.error.reset();
        self.ctx
            .note_constant(&self.error.current_name(), Sort::Int);
    }

    fn bump_error(&mut self) {
        self.error.bump();
        self.ctx
            .note_constant(&self.error.current_name(), Sort::Int);
    }

    fn current_state_variables(&self) -> Vec<Term> {
        self.state_vars
            .iter()
            .map(|&id| self.ctx.variable(id).current_value())
            .collect()
    }

    fn state_variables_at(&self, index: usize) -> Vec<Term> {
        self.state_vars
            .iter()
            .map(|&id| self.ctx.variable(id).value_at(index))
            .collect()
    }

    fn contract_state_at(&self, contract: &ContractDefinition, index: usize) -> Vec<Term> {
        sorts::state_variables(self.unit, contract)
            .iter()
            .map(|v| self.ctx.variable(v.id).value_at(index))
            .collect()
    }

    fn current_function_def(&self) -> Option<&'a FunctionDefinition> {
        let unit = self.unit;
        self.current_function
            .map(|id| unit.function(id).expect("current function missing from unit"))
    }

    fn current_contract_def(&self) -> &'a ContractDefinition {
        let unit = self.unit;
        unit.contract(self.current_contract.expect("no current contract"))
            .expect("current contract missing from unit")
    }

    fn genesis_app(&self) -> Term {
        self.store
            .apply(self.genesis.expect("analysis not started"), Vec::new())
    }

    fn error_app(&self) -> Term {
        self.store
            .apply(self.error_predicate.expect("no contract was encoded"), Vec::new())
    }

    fn flush_declarations(&mut self) {
        for (name, sort) in self.ctx.take_new_constants() {
            self.backend.declare_variable(&name, sort);
        }
    }

    fn fresh_block_index(&mut self) -> usize {
        let index = self.block_counter;
        self.block_counter += 1;
        index
    }

    /// Encode an expression in the current context.
    fn expr(&mut self, expression: &'a Expression) -> Term {
        ExprEncoder::new(&mut self.ctx).encode(expression)
    }
}

/// Readable, collision-free predicate name component for a function.
fn predicate_name(function: &FunctionDefinition, contract: &ContractDefinition) -> String {
    let kind = match function.kind {
        FunctionKind::Constructor => "constructor",
        FunctionKind::Regular => "function",
        FunctionKind::Fallback => "fallback",
        FunctionKind::Receive => "receive",
    };
    if function.name.is_empty() {
        format!("{}_{}_{}", kind, function.id, contract.id)
    } else {
        format!("{}_{}_{}_{}", kind, function.name, function.id, contract.id)
    }
}
