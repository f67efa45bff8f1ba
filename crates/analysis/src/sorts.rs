//! Sort builder: maps contract types to SMT sorts and computes the
//! signatures of every predicate family the encoder allocates.

use solhorn_smtlib::sort::Sort;
use solhorn_smtlib::term::Term;

use crate::ast::{ContractDefinition, FunctionDefinition, SourceUnit, Type, VariableDeclaration};

/// Convert a contract type to an SMT-LIB sort.
///
/// Fixed-width integers and addresses are encoded as unbounded `Int`;
/// wraparound is the expression encoder's job. Mappings and arrays are
/// SMT arrays over their key sort.
pub fn sort_of(ty: &Type) -> Sort {
    match ty {
        Type::Bool => Sort::Bool,
        Type::Uint(_) | Type::Address => Sort::Int,
        Type::Mapping(key, value) => Sort::array(sort_of(key), sort_of(value)),
        Type::Array(element) => Sort::array(Sort::Int, sort_of(element)),
    }
}

/// The type's default value, used to initialise state before the
/// constructor chain and locals without an initialiser.
pub fn zero_value(ty: &Type) -> Term {
    match ty {
        Type::Bool => Term::BoolLit(false),
        Type::Uint(_) | Type::Address => Term::zero(),
        Type::Mapping(key, value) => Term::ConstArray(
            Sort::array(sort_of(key), sort_of(value)),
            Box::new(zero_value(value)),
        ),
        Type::Array(element) => Term::ConstArray(
            Sort::array(Sort::Int, sort_of(element)),
            Box::new(zero_value(element)),
        ),
    }
}

/// State variables of a contract including inherited and private ones,
/// following the linearised base list (most-derived first).
pub fn state_variables<'a>(
    unit: &'a SourceUnit,
    contract: &ContractDefinition,
) -> Vec<&'a VariableDeclaration> {
    let mut out = Vec::new();
    for &base_id in &contract.base_ids {
        if let Some(base) = unit.contract(base_id) {
            out.extend(base.state_variables.iter());
        }
    }
    out
}

pub fn state_sorts(unit: &SourceUnit, contract: &ContractDefinition) -> Vec<Sort> {
    state_variables(unit, contract)
        .iter()
        .map(|var| sort_of(&var.ty))
        .collect()
}

/// `interface(C)`: one argument per state variable.
pub fn interface_sort(unit: &SourceUnit, contract: &ContractDefinition) -> Vec<Sort> {
    state_sorts(unit, contract)
}

/// `constructor_summary(C)`: `(errorId, stateVars(C))`.
pub fn constructor_sort(state_sorts: &[Sort]) -> Vec<Sort> {
    let mut sorts = vec![Sort::Int];
    sorts.extend(state_sorts.iter().cloned());
    sorts
}

/// `function_summary(F, C)`: `(errorId, preState, inParams, postState,
/// outParams)`. The state space is the analysed contract's; when `F`
/// belongs to a library the caller passes the library itself as `C`.
pub fn summary_sort(
    unit: &SourceUnit,
    function: &FunctionDefinition,
    contract: &ContractDefinition,
) -> Vec<Sort> {
    let state = state_sorts(unit, contract);
    let ins: Vec<Sort> = function
        .parameters
        .iter()
        .map(|v| sort_of(&v.ty))
        .collect();
    let outs: Vec<Sort> = function
        .return_parameters
        .iter()
        .map(|v| sort_of(&v.ty))
        .collect();

    let mut sorts = vec![Sort::Int];
    sorts.extend(state.iter().cloned());
    sorts.extend(ins.iter().cloned());
    sorts.extend(state);
    sorts.extend(outs);
    sorts
}

/// A function entry point in the symbolic CFG carries:
/// - the failed-assertion index (0 = none),
/// - state variables at function entry (immutable snapshot) and currently,
/// - input parameters at function entry and currently,
/// - output parameters.
pub fn function_sort(function: &FunctionDefinition, state_sorts: &[Sort]) -> Vec<Sort> {
    let ins: Vec<Sort> = function
        .parameters
        .iter()
        .map(|v| sort_of(&v.ty))
        .collect();
    let outs: Vec<Sort> = function
        .return_parameters
        .iter()
        .map(|v| sort_of(&v.ty))
        .collect();

    let mut sorts = vec![Sort::Int];
    sorts.extend(state_sorts.iter().cloned());
    sorts.extend(ins.iter().cloned());
    sorts.extend(state_sorts.iter().cloned());
    sorts.extend(ins);
    sorts.extend(outs);
    sorts
}

/// Blocks inside a function additionally see every local variable.
pub fn block_sort(function: &FunctionDefinition, state_sorts: &[Sort]) -> Vec<Sort> {
    let mut sorts = function_sort(function, state_sorts);
    sorts.extend(
        function
            .local_variables()
            .iter()
            .map(|v| sort_of(&v.ty)),
    );
    sorts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        Block, ContractDefinition, FunctionKind, SourceLocation, Statement, Visibility,
    };

    fn contract_with_state(id: u64, vars: Vec<VariableDeclaration>) -> ContractDefinition {
        let mut c = ContractDefinition::new(id, format!("C{id}"));
        c.state_variables = vars;
        c
    }

    #[test]
    fn value_types_map_to_base_sorts() {
        assert_eq!(sort_of(&Type::Bool), Sort::Bool);
        assert_eq!(sort_of(&Type::uint256()), Sort::Int);
        assert_eq!(sort_of(&Type::Address), Sort::Int);
    }

    #[test]
    fn mapping_maps_to_array_sort() {
        let ty = Type::mapping(Type::Address, Type::uint256());
        assert_eq!(sort_of(&ty), Sort::array(Sort::Int, Sort::Int));
    }

    #[test]
    fn nested_mapping_sort() {
        let ty = Type::mapping(Type::Address, Type::mapping(Type::Address, Type::Bool));
        assert_eq!(
            sort_of(&ty),
            Sort::array(Sort::Int, Sort::array(Sort::Int, Sort::Bool))
        );
    }

    #[test]
    fn zero_values() {
        assert_eq!(zero_value(&Type::Bool), Term::BoolLit(false));
        assert_eq!(zero_value(&Type::uint256()), Term::zero());
        assert_eq!(
            zero_value(&Type::mapping(Type::Address, Type::uint256())),
            Term::ConstArray(Sort::array(Sort::Int, Sort::Int), Box::new(Term::zero()))
        );
    }

    #[test]
    fn state_variables_follow_linearisation() {
        let base = contract_with_state(2, vec![VariableDeclaration::new(20, "b", Type::Bool)]);
        let mut derived =
            contract_with_state(1, vec![VariableDeclaration::new(10, "d", Type::uint256())]);
        derived.base_ids = vec![1, 2];
        let unit = SourceUnit::new(vec![derived, base]);

        let vars = state_variables(&unit, unit.contract(1).unwrap());
        let ids: Vec<u64> = vars.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![10, 20]);
        assert_eq!(
            state_sorts(&unit, unit.contract(1).unwrap()),
            vec![Sort::Int, Sort::Bool]
        );
    }

    #[test]
    fn predicate_signatures() {
        let f = FunctionDefinition {
            id: 5,
            name: "set".to_string(),
            kind: FunctionKind::Regular,
            visibility: Visibility::Public,
            parameters: vec![VariableDeclaration::new(50, "x", Type::uint256())],
            return_parameters: vec![VariableDeclaration::new(51, "r", Type::Bool)],
            body: Some(Block::new(vec![Statement::VariableDeclaration {
                decl: VariableDeclaration::new(52, "tmp", Type::uint256()),
                initial_value: None,
            }])),
            loc: SourceLocation::default(),
        };
        let state = vec![Sort::Int];

        // (error, pre-state, in, post-state, out)
        let c = contract_with_state(1, vec![VariableDeclaration::new(10, "s", Type::uint256())]);
        let unit = SourceUnit::new(vec![c]);
        assert_eq!(
            summary_sort(&unit, &f, unit.contract(1).unwrap()),
            vec![Sort::Int, Sort::Int, Sort::Int, Sort::Int, Sort::Bool]
        );

        // (error, init-state, init-in, state, in, out)
        assert_eq!(
            function_sort(&f, &state),
            vec![Sort::Int, Sort::Int, Sort::Int, Sort::Int, Sort::Int, Sort::Bool]
        );

        // function sort plus locals
        assert_eq!(
            block_sort(&f, &state),
            vec![
                Sort::Int,
                Sort::Int,
                Sort::Int,
                Sort::Int,
                Sort::Int,
                Sort::Bool,
                Sort::Int
            ]
        );

        // (error, state)
        assert_eq!(constructor_sort(&state), vec![Sort::Int, Sort::Int]);
    }
}
