//! Live-solver smoke tests. These run the full pipeline against a real
//! Z3 binary and are skipped silently on machines without one.

mod common;

use common::*;
use solhorn_analysis::ast::{BinOp, Block, Expression, SourceUnit, Statement, Type};
use solhorn_analysis::ChcEncoder;
use solhorn_solver::{CliSolver, SmtLib2Horn, SolverConfig, SolverKind};

fn z3_backend() -> Option<SmtLib2Horn> {
    let config = SolverConfig::auto_detect_for(SolverKind::Z3)
        .ok()?
        .with_timeout(30_000);
    Some(SmtLib2Horn::with_solvers(vec![CliSolver::new(config)]))
}

#[test]
fn z3_proves_reflexive_equality() {
    let Some(backend) = z3_backend() else {
        eprintln!("z3 not installed; skipping");
        return;
    };

    let x = uint(20, "x");
    let f = public_function(
        2,
        "f",
        vec![x.clone()],
        vec![assert_stmt(
            100,
            Expression::binary(
                BinOp::Eq,
                Expression::ident(&x),
                Expression::ident(&x),
                Type::Bool,
            ),
        )],
    );
    let unit = SourceUnit::new(vec![contract(1, "C", vec![], vec![f])]);

    let mut encoder = ChcEncoder::new(&unit, Box::new(backend));
    encoder.analyze();
    assert!(
        encoder.safe_assertions().contains(&100),
        "assert(x == x) must be proved safe; warnings: {:?}",
        encoder.reporter().warnings()
    );
}

#[test]
fn z3_does_not_prove_increment_overflow() {
    let Some(backend) = z3_backend() else {
        eprintln!("z3 not installed; skipping");
        return;
    };

    let x = uint(20, "x");
    let f = public_function(
        2,
        "f",
        vec![x.clone()],
        vec![assert_stmt(
            100,
            Expression::binary(
                BinOp::Gt,
                Expression::binary(
                    BinOp::Add,
                    Expression::ident(&x),
                    Expression::number(1, Type::uint256()),
                    Type::uint256(),
                ),
                Expression::ident(&x),
                Type::Bool,
            ),
        )],
    );
    let unit = SourceUnit::new(vec![contract(1, "C", vec![], vec![f])]);

    let mut encoder = ChcEncoder::new(&unit, Box::new(backend));
    encoder.analyze();
    assert!(
        encoder.safe_assertions().is_empty(),
        "assert(x + 1 > x) wraps at the type maximum and must stay unproved"
    );
}

#[test]
fn z3_proves_asserts_guarded_by_require() {
    let Some(backend) = z3_backend() else {
        eprintln!("z3 not installed; skipping");
        return;
    };

    // `require(x > 0); assert(x > 0);`
    let x = uint(20, "x");
    let positive = || {
        Expression::binary(
            BinOp::Gt,
            Expression::ident(&x),
            Expression::number(0, Type::uint256()),
            Type::Bool,
        )
    };
    let f = public_function(
        2,
        "f",
        vec![x.clone()],
        vec![require_stmt(101, positive()), assert_stmt(100, positive())],
    );
    let unit = SourceUnit::new(vec![contract(1, "C", vec![], vec![f])]);

    let mut encoder = ChcEncoder::new(&unit, Box::new(backend));
    encoder.analyze();
    assert!(
        encoder.safe_assertions().contains(&100),
        "an assert dominated by the same require condition must be safe"
    );
}

#[test]
fn z3_proves_branch_local_conditions() {
    let Some(backend) = z3_backend() else {
        eprintln!("z3 not installed; skipping");
        return;
    };

    let b = boolean(20, "b");
    let f = public_function(
        2,
        "f",
        vec![b.clone()],
        vec![Statement::If {
            condition: Expression::ident(&b),
            true_branch: Block::new(vec![assert_stmt(100, Expression::ident(&b))]),
            false_branch: Some(Block::new(vec![assert_stmt(
                101,
                Expression::not(Expression::ident(&b)),
            )])),
        }],
    );
    let unit = SourceUnit::new(vec![contract(1, "C", vec![], vec![f])]);

    let mut encoder = ChcEncoder::new(&unit, Box::new(backend));
    encoder.analyze();
    assert!(encoder.safe_assertions().contains(&100));
    assert!(encoder.safe_assertions().contains(&101));
}
