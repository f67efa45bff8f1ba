//! Expression encoder: turns typed expressions into first-order terms
//! over the current SSA valuation, updating the valuation for
//! assignments.
//!
//! Arithmetic on fixed-width integer types is encoded modulo the type's
//! width, so wraparound (and therefore overflow-induced assertion
//! failures) is visible to the solver.
//!
//! Function calls are the statement encoder's business; one that reaches
//! this encoder sits in a nested expression position we cannot route
//! through a summary, so it is conservatively modelled as an
//! unconstrained fresh value.

use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;

use crate::ast::{BinOp, Expression, FunctionCall, LiteralValue, NodeId, Type, UnOp};
use crate::context::Context;

pub struct ExprEncoder<'a> {
    ctx: &'a mut Context,
}

impl<'a> ExprEncoder<'a> {
    pub fn new(ctx: &'a mut Context) -> Self {
        Self { ctx }
    }

    /// Encode an expression, returning its value term.
    pub fn encode(&mut self, expr: &Expression) -> Term {
        match expr {
            Expression::Literal { value, .. } => match value {
                LiteralValue::Number(n) => Term::IntLit(n.clone()),
                LiteralValue::Bool(b) => Term::BoolLit(*b),
            },

            Expression::Identifier { decl, .. } => self.ctx.variable(*decl).current_value(),

            Expression::Assignment { lhs, rhs } => {
                let value = self.encode(rhs);
                self.assign(lhs, value)
            }

            Expression::Binary { op, lhs, rhs, ty } => {
                let l = self.encode(lhs);
                let r = self.encode(rhs);
                self.encode_binary(*op, l, r, ty)
            }

            Expression::Unary { op, operand } => {
                let inner = self.encode(operand);
                match op {
                    UnOp::Not => Term::not(inner),
                }
            }

            Expression::IndexAccess { base, index } => {
                let base_term = self.encode(base);
                let index_term = self.encode(index);
                Term::Select(Box::new(base_term), Box::new(index_term))
            }

            Expression::Call(call) => self.encode_nested_call(call),
        }
    }

    /// Assign `value` to an lvalue, bumping the target's SSA index.
    pub fn assign(&mut self, lhs: &Expression, value: Term) -> Term {
        match lhs {
            Expression::Identifier { decl, .. } => {
                self.ctx.bump_var(*decl);
                let current = self.ctx.variable(*decl).current_value();
                self.ctx.add_assertion(Term::eq(current, value.clone()));
                value
            }
            Expression::IndexAccess { base, index } => {
                let index_term = self.encode(index);
                match base.as_ref() {
                    Expression::Identifier { decl, .. } => {
                        let previous = self.ctx.variable(*decl).current_value();
                        self.ctx.bump_var(*decl);
                        let current = self.ctx.variable(*decl).current_value();
                        self.ctx.add_assertion(Term::eq(
                            current,
                            Term::Store(
                                Box::new(previous),
                                Box::new(index_term),
                                Box::new(value.clone()),
                            ),
                        ));
                        value
                    }
                    other => {
                        tracing::warn!(?other, "unsupported index-assignment base; value dropped");
                        value
                    }
                }
            }
            other => {
                tracing::warn!(?other, "unsupported assignment target; value dropped");
                value
            }
        }
    }

    /// Havoc an lvalue: give it a fresh SSA name with no constraint.
    pub fn havoc_target(&mut self, lhs: &Expression) {
        match lhs {
            Expression::Identifier { decl, .. } => self.ctx.bump_var(*decl),
            Expression::IndexAccess { base, .. } => {
                if let Expression::Identifier { decl, .. } = base.as_ref() {
                    self.ctx.bump_var(*decl);
                }
            }
            other => tracing::warn!(?other, "unsupported havoc target"),
        }
    }

    /// Argument terms for a call, at the caller's current SSA valuation.
    pub fn symbolic_arguments(&mut self, call: &FunctionCall) -> Vec<Term> {
        call.arguments.iter().map(|arg| self.encode(arg)).collect()
    }

    pub fn current_value(&self, decl: NodeId) -> Term {
        self.ctx.variable(decl).current_value()
    }

    fn encode_binary(&mut self, op: BinOp, l: Term, r: Term, ty: &Type) -> Term {
        let raw = match op {
            BinOp::Add => Term::IntAdd(Box::new(l), Box::new(r)),
            BinOp::Sub => Term::IntSub(Box::new(l), Box::new(r)),
            BinOp::Mul => Term::IntMul(Box::new(l), Box::new(r)),
            BinOp::Div => Term::IntDiv(Box::new(l), Box::new(r)),
            BinOp::Mod => Term::IntMod(Box::new(l), Box::new(r)),
            BinOp::Eq => return Term::eq(l, r),
            BinOp::Neq => return Term::not(Term::eq(l, r)),
            BinOp::Lt => return Term::lt(l, r),
            BinOp::Le => return Term::le(l, r),
            BinOp::Gt => return Term::gt(l, r),
            BinOp::Ge => return Term::ge(l, r),
            BinOp::And => return Term::and(vec![l, r]),
            BinOp::Or => return Term::or(vec![l, r]),
        };
        debug_assert!(op.is_arithmetic());
        self.wrap(raw, ty)
    }

    /// Reduce a raw arithmetic result into the representable range of a
    /// fixed-width type. `mod` is Euclidean in SMT-LIB, so subtraction
    /// below zero lands on the wrapped-around value.
    fn wrap(&self, raw: Term, ty: &Type) -> Term {
        match ty.modulus() {
            Some(modulus) => Term::IntMod(Box::new(raw), Box::new(Term::IntLit(modulus))),
            None => raw,
        }
    }

    fn encode_nested_call(&mut self, call: &FunctionCall) -> Term {
        tracing::warn!(
            call = call.id,
            "function call in nested expression position; modelling as unconstrained value"
        );
        for argument in &call.arguments {
            let _ = self.encode(argument);
        }
        self.ctx.fresh_nondet(Sort::Int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VariableDeclaration;

    fn ctx_with(decls: &[VariableDeclaration]) -> Context {
        let mut ctx = Context::new();
        for decl in decls {
            ctx.declare(decl);
        }
        ctx.push_frame();
        ctx
    }

    #[test]
    fn literal_terms() {
        let mut ctx = ctx_with(&[]);
        let mut enc = ExprEncoder::new(&mut ctx);
        assert_eq!(
            enc.encode(&Expression::number(7, Type::uint256())),
            Term::int(7)
        );
        assert_eq!(enc.encode(&Expression::bool(true)), Term::BoolLit(true));
    }

    #[test]
    fn identifier_reads_current_ssa_value() {
        let x = VariableDeclaration::new(3, "x", Type::uint256());
        let mut ctx = ctx_with(std::slice::from_ref(&x));
        ctx.bump_var(3);
        let mut enc = ExprEncoder::new(&mut ctx);
        assert_eq!(enc.encode(&Expression::ident(&x)), Term::cst("x_3_1"));
    }

    #[test]
    fn arithmetic_wraps_at_type_width() {
        let x = VariableDeclaration::new(3, "x", Type::Uint(8));
        let mut ctx = ctx_with(std::slice::from_ref(&x));
        let mut enc = ExprEncoder::new(&mut ctx);
        let sum = enc.encode(&Expression::binary(
            BinOp::Add,
            Expression::ident(&x),
            Expression::number(1, Type::Uint(8)),
            Type::Uint(8),
        ));
        assert_eq!(
            sum,
            Term::IntMod(
                Box::new(Term::IntAdd(
                    Box::new(Term::cst("x_3_0")),
                    Box::new(Term::int(1))
                )),
                Box::new(Term::int(256))
            )
        );
    }

    #[test]
    fn comparison_does_not_wrap() {
        let x = VariableDeclaration::new(3, "x", Type::uint256());
        let mut ctx = ctx_with(std::slice::from_ref(&x));
        let mut enc = ExprEncoder::new(&mut ctx);
        let cmp = enc.encode(&Expression::binary(
            BinOp::Lt,
            Expression::ident(&x),
            Expression::number(10, Type::uint256()),
            Type::Bool,
        ));
        assert_eq!(cmp, Term::lt(Term::cst("x_3_0"), Term::int(10)));
    }

    #[test]
    fn assignment_bumps_and_equates() {
        let x = VariableDeclaration::new(3, "x", Type::uint256());
        let mut ctx = ctx_with(std::slice::from_ref(&x));
        {
            let mut enc = ExprEncoder::new(&mut ctx);
            enc.encode(&Expression::assign(
                Expression::ident(&x),
                Expression::number(5, Type::uint256()),
            ));
        }
        assert_eq!(ctx.variable(3).index(), 1);
        assert_eq!(
            ctx.assertions(),
            Term::eq(Term::cst("x_3_1"), Term::int(5))
        );
    }

    #[test]
    fn index_assignment_stores_into_previous_version() {
        let m = VariableDeclaration::new(4, "m", Type::mapping(Type::Address, Type::uint256()));
        let k = VariableDeclaration::new(5, "k", Type::Address);
        let mut ctx = ctx_with(&[m.clone(), k.clone()]);
        {
            let mut enc = ExprEncoder::new(&mut ctx);
            enc.encode(&Expression::assign(
                Expression::index(Expression::ident(&m), Expression::ident(&k)),
                Expression::number(9, Type::uint256()),
            ));
        }
        assert_eq!(ctx.variable(4).index(), 1);
        assert_eq!(
            ctx.assertions(),
            Term::eq(
                Term::cst("m_4_1"),
                Term::Store(
                    Box::new(Term::cst("m_4_0")),
                    Box::new(Term::cst("k_5_0")),
                    Box::new(Term::int(9))
                )
            )
        );
    }

    #[test]
    fn index_read_is_select() {
        let m = VariableDeclaration::new(4, "m", Type::mapping(Type::Address, Type::uint256()));
        let k = VariableDeclaration::new(5, "k", Type::Address);
        let mut ctx = ctx_with(&[m.clone(), k.clone()]);
        let mut enc = ExprEncoder::new(&mut ctx);
        let term = enc.encode(&Expression::index(
            Expression::ident(&m),
            Expression::ident(&k),
        ));
        assert_eq!(
            term,
            Term::Select(Box::new(Term::cst("m_4_0")), Box::new(Term::cst("k_5_0")))
        );
    }

    #[test]
    fn logic_operators() {
        let b = VariableDeclaration::new(6, "b", Type::Bool);
        let mut ctx = ctx_with(std::slice::from_ref(&b));
        let mut enc = ExprEncoder::new(&mut ctx);
        let t = enc.encode(&Expression::binary(
            BinOp::And,
            Expression::ident(&b),
            Expression::not(Expression::ident(&b)),
            Type::Bool,
        ));
        assert_eq!(
            t,
            Term::And(vec![Term::cst("b_6_0"), Term::not(Term::cst("b_6_0"))])
        );
    }

    #[test]
    fn nested_call_becomes_unconstrained_value() {
        use crate::ast::CallKind;
        let mut ctx = ctx_with(&[]);
        let mut enc = ExprEncoder::new(&mut ctx);
        let call = Expression::Call(FunctionCall::new(9, CallKind::Hash, vec![]));
        let a = enc.encode(&call);
        let b = enc.encode(&call);
        assert_ne!(a, b);
    }
}
