//! SMT-LIB2 text formatting for AST types.
//!
//! Implements `Display` for [`Sort`], [`Term`], [`Command`], and [`Script`],
//! producing valid SMT-LIB2 output that can be parsed by Horn solvers such
//! as Z3 (Spacer) and Eldarica.

use std::fmt;

use num_traits::Signed;

use crate::command::Command;
use crate::script::Script;
use crate::sort::Sort;
use crate::term::Term;

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::Int => write!(f, "Int"),
            Sort::Array(index, element) => write!(f, "(Array {index} {element})"),
            Sort::Uninterpreted(name) => write!(f, "{name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// Write a binary SMT-LIB operator: `(op lhs rhs)`.
fn fmt_binop(op: &str, lhs: &Term, rhs: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {lhs} {rhs})")
}

/// Write a unary SMT-LIB operator: `(op arg)`.
fn fmt_unop(op: &str, arg: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {arg})")
}

/// Write sorted variable bindings: `((x Sort) (y Sort) ...)`.
fn fmt_sorted_vars(vars: &[(String, Sort)], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(")?;
    for (i, (name, sort)) in vars.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({name} {sort})")?;
    }
    write!(f, ")")
}

/// Write a space-separated list of terms.
fn fmt_term_list(terms: &[Term], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, t) in terms.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // --- Literals ---
            Term::BoolLit(true) => write!(f, "true"),
            Term::BoolLit(false) => write!(f, "false"),
            Term::IntLit(n) => {
                if n.is_negative() {
                    // SMT-LIB represents negative integers as `(- N)`
                    write!(f, "(- {})", -n)
                } else {
                    write!(f, "{n}")
                }
            }

            // --- Variables ---
            Term::Const(name) => write!(f, "{name}"),

            // --- Boolean operations ---
            Term::Not(inner) => fmt_unop("not", inner, f),
            Term::And(terms) => {
                if terms.is_empty() {
                    write!(f, "true")
                } else {
                    write!(f, "(and ")?;
                    fmt_term_list(terms, f)?;
                    write!(f, ")")
                }
            }
            Term::Or(terms) => {
                if terms.is_empty() {
                    write!(f, "false")
                } else {
                    write!(f, "(or ")?;
                    fmt_term_list(terms, f)?;
                    write!(f, ")")
                }
            }
            Term::Implies(a, b) => fmt_binop("=>", a, b, f),
            Term::Iff(a, b) => fmt_binop("=", a, b, f),

            // --- Core ---
            Term::Eq(a, b) => fmt_binop("=", a, b, f),
            Term::Ite(c, t, e) => write!(f, "(ite {c} {t} {e})"),

            // --- Integer arithmetic ---
            Term::IntAdd(a, b) => fmt_binop("+", a, b, f),
            Term::IntSub(a, b) => fmt_binop("-", a, b, f),
            Term::IntMul(a, b) => fmt_binop("*", a, b, f),
            Term::IntDiv(a, b) => fmt_binop("div", a, b, f),
            Term::IntMod(a, b) => fmt_binop("mod", a, b, f),
            Term::IntNeg(a) => fmt_unop("-", a, f),
            Term::IntLt(a, b) => fmt_binop("<", a, b, f),
            Term::IntLe(a, b) => fmt_binop("<=", a, b, f),
            Term::IntGt(a, b) => fmt_binop(">", a, b, f),
            Term::IntGe(a, b) => fmt_binop(">=", a, b, f),

            // --- Arrays ---
            Term::Select(arr, idx) => fmt_binop("select", arr, idx, f),
            Term::Store(arr, idx, val) => write!(f, "(store {arr} {idx} {val})"),
            Term::ConstArray(sort, value) => write!(f, "((as const {sort}) {value})"),

            // --- Relation application ---
            Term::App(name, args) => {
                if args.is_empty() {
                    write!(f, "{name}")
                } else {
                    write!(f, "({name} ")?;
                    fmt_term_list(args, f)?;
                    write!(f, ")")
                }
            }

            // --- Quantifiers ---
            Term::Forall(vars, body) => {
                write!(f, "(forall ")?;
                fmt_sorted_vars(vars, f)?;
                write!(f, " {body})")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::SetOption(key, value) => write!(f, "(set-option :{key} {value})"),
            Command::DeclareConst(name, sort) => write!(f, "(declare-const {name} {sort})"),
            Command::DeclareFun(name, params, ret) => {
                write!(f, "(declare-fun {name} (")?;
                for (i, s) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{s}")?;
                }
                write!(f, ") {ret})")
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::GetModel => write!(f, "(get-model)"),
            Command::Comment(text) => write!(f, "; {text}"),
            Command::Exit => write!(f, "(exit)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cmd in self.commands() {
            writeln!(f, "{cmd}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_render() {
        assert_eq!(Sort::Bool.to_string(), "Bool");
        assert_eq!(Sort::Int.to_string(), "Int");
        assert_eq!(
            Sort::array(Sort::Int, Sort::Int).to_string(),
            "(Array Int Int)"
        );
        assert_eq!(Sort::Uninterpreted("S".to_string()).to_string(), "S");
    }

    #[test]
    fn literals_render() {
        assert_eq!(Term::BoolLit(true).to_string(), "true");
        assert_eq!(Term::int(42).to_string(), "42");
        assert_eq!(Term::int(-7).to_string(), "(- 7)");
    }

    #[test]
    fn big_literal_renders() {
        use num_bigint::BigInt;
        let modulus = BigInt::from(1u8) << 256;
        let rendered = Term::IntLit(modulus).to_string();
        assert!(rendered.starts_with("115792089237316195423570985008687907853"));
    }

    #[test]
    fn arithmetic_renders() {
        let t = Term::IntMod(
            Box::new(Term::IntAdd(
                Box::new(Term::cst("x_1")),
                Box::new(Term::int(1)),
            )),
            Box::new(Term::int(256)),
        );
        assert_eq!(t.to_string(), "(mod (+ x_1 1) 256)");
    }

    #[test]
    fn boolean_structure_renders() {
        let t = Term::implies(
            Term::And(vec![Term::cst("a"), Term::cst("b")]),
            Term::Or(vec![Term::cst("c"), Term::not(Term::cst("d"))]),
        );
        assert_eq!(t.to_string(), "(=> (and a b) (or c (not d)))");
    }

    #[test]
    fn iff_renders_as_boolean_equality() {
        let t = Term::Iff(Box::new(Term::cst("a")), Box::new(Term::cst("b")));
        assert_eq!(t.to_string(), "(= a b)");
    }

    #[test]
    fn empty_and_or_render_as_units() {
        assert_eq!(Term::And(vec![]).to_string(), "true");
        assert_eq!(Term::Or(vec![]).to_string(), "false");
    }

    #[test]
    fn arrays_render() {
        let sel = Term::Select(Box::new(Term::cst("m_1")), Box::new(Term::cst("k_0")));
        assert_eq!(sel.to_string(), "(select m_1 k_0)");

        let zero_map = Term::ConstArray(Sort::array(Sort::Int, Sort::Int), Box::new(Term::int(0)));
        assert_eq!(zero_map.to_string(), "((as const (Array Int Int)) 0)");
    }

    #[test]
    fn applications_render() {
        assert_eq!(Term::App("genesis".to_string(), vec![]).to_string(), "genesis");
        assert_eq!(
            Term::App("interface_C_1".to_string(), vec![Term::cst("s_0")]).to_string(),
            "(interface_C_1 s_0)"
        );
    }

    #[test]
    fn forall_renders() {
        let t = Term::Forall(
            vec![("x".to_string(), Sort::Int), ("b".to_string(), Sort::Bool)],
            Box::new(Term::implies(Term::cst("b"), Term::gt(Term::cst("x"), Term::int(0)))),
        );
        assert_eq!(t.to_string(), "(forall ((x Int) (b Bool)) (=> b (> x 0)))");
    }

    #[test]
    fn commands_render() {
        assert_eq!(
            Command::SetLogic("HORN".to_string()).to_string(),
            "(set-logic HORN)"
        );
        assert_eq!(
            Command::DeclareFun("summary_f".to_string(), vec![Sort::Int, Sort::Int], Sort::Bool)
                .to_string(),
            "(declare-fun summary_f (Int Int) Bool)"
        );
        assert_eq!(
            Command::DeclareConst("x_0".to_string(), Sort::Int).to_string(),
            "(declare-const x_0 Int)"
        );
        assert_eq!(Command::CheckSat.to_string(), "(check-sat)");
    }

    #[test]
    fn script_renders_line_per_command() {
        let mut script = Script::new();
        script.push(Command::SetLogic("HORN".to_string()));
        script.push(Command::CheckSat);
        assert_eq!(script.to_string(), "(set-logic HORN)\n(check-sat)\n");
    }
}
