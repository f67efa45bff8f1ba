//! Compiler-decoupled contract AST consumed by the CHC encoder.
//!
//! This mirrors the front-end's typed, annotated tree but is independent
//! of any parser, making the encoder fully testable. Cross-references
//! (base contracts, call targets) are stable integer node ids resolved
//! through [`SourceUnit`] lookups, never owning pointers.

use num_bigint::BigInt;
use num_traits::One;

/// Stable id of an AST node. Assertion ids double as error-index values.
pub type NodeId = u64;

/// Byte range of a node in its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub start: usize,
    pub end: usize,
}

impl SourceLocation {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The type vocabulary the encoder understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Bool,
    /// Unsigned machine integer of the given bit width (8..=256).
    Uint(u16),
    /// 160-bit account address.
    Address,
    /// `mapping(key => value)` storage type.
    Mapping(Box<Type>, Box<Type>),
    /// Dynamically sized array, indexed by unbounded integers.
    Array(Box<Type>),
}

impl Type {
    pub fn uint256() -> Self {
        Type::Uint(256)
    }

    pub fn mapping(key: Type, value: Type) -> Self {
        Type::Mapping(Box::new(key), Box::new(value))
    }

    /// Reference semantics: mappings and arrays alias storage and are the
    /// havoc scope after unknown calls.
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Mapping(..) | Type::Array(_))
    }

    /// Wraparound modulus for fixed-width integer types.
    pub fn modulus(&self) -> Option<BigInt> {
        match self {
            Type::Uint(bits) => Some(BigInt::one() << (*bits as usize)),
            Type::Address => Some(BigInt::one() << 160usize),
            _ => None,
        }
    }
}

/// A state variable, parameter, return parameter, or local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub name: String,
    pub ty: Type,
}

impl VariableDeclaration {
    pub fn new(id: NodeId, name: impl Into<String>, ty: Type) -> Self {
        Self {
            id,
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Constructor,
    Regular,
    Fallback,
    Receive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub parameters: Vec<VariableDeclaration>,
    pub return_parameters: Vec<VariableDeclaration>,
    /// `None` for unimplemented (abstract) functions.
    pub body: Option<Block>,
    pub loc: SourceLocation,
}

impl FunctionDefinition {
    pub fn is_constructor(&self) -> bool {
        self.kind == FunctionKind::Constructor
    }

    pub fn is_implemented(&self) -> bool {
        self.body.is_some()
    }

    /// Part of the contract's transaction surface.
    pub fn is_public(&self) -> bool {
        matches!(self.visibility, Visibility::Public | Visibility::External)
    }

    /// All locals declared anywhere in the body, in statement order.
    pub fn local_variables(&self) -> Vec<&VariableDeclaration> {
        let mut out = Vec::new();
        if let Some(body) = &self.body {
            collect_locals(body, &mut out);
        }
        out
    }
}

fn collect_locals<'a>(block: &'a Block, out: &mut Vec<&'a VariableDeclaration>) {
    for stmt in &block.statements {
        match stmt {
            Statement::VariableDeclaration { decl, .. } => out.push(decl),
            Statement::Block(inner) => collect_locals(inner, out),
            Statement::If {
                true_branch,
                false_branch,
                ..
            } => {
                collect_locals(true_branch, out);
                if let Some(fb) = false_branch {
                    collect_locals(fb, out);
                }
            }
            Statement::While { body, .. } => collect_locals(body, out),
            Statement::For { init, body, .. } => {
                if let Some(init) = init {
                    if let Statement::VariableDeclaration { decl, .. } = init.as_ref() {
                        out.push(decl);
                    }
                }
                collect_locals(body, out);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block(Block),
    VariableDeclaration {
        decl: VariableDeclaration,
        initial_value: Option<Expression>,
    },
    Expression(Expression),
    If {
        condition: Expression,
        true_branch: Block,
        false_branch: Option<Block>,
    },
    While {
        condition: Expression,
        body: Block,
        is_do_while: bool,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        post: Option<Expression>,
        body: Block,
    },
    Break,
    Continue,
    Return {
        values: Vec<Expression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Operators whose fixed-width result wraps around.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(BigInt),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal {
        value: LiteralValue,
        ty: Type,
    },
    Identifier {
        decl: NodeId,
        name: String,
    },
    Assignment {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
        /// Result type, after the front-end's usual conversions.
        ty: Type,
    },
    Unary {
        op: UnOp,
        operand: Box<Expression>,
    },
    IndexAccess {
        base: Box<Expression>,
        index: Box<Expression>,
    },
    Call(FunctionCall),
}

impl Expression {
    pub fn number(value: impl Into<BigInt>, ty: Type) -> Self {
        Expression::Literal {
            value: LiteralValue::Number(value.into()),
            ty,
        }
    }

    pub fn bool(value: bool) -> Self {
        Expression::Literal {
            value: LiteralValue::Bool(value),
            ty: Type::Bool,
        }
    }

    pub fn ident(decl: &VariableDeclaration) -> Self {
        Expression::Identifier {
            decl: decl.id,
            name: decl.name.clone(),
        }
    }

    pub fn assign(lhs: Expression, rhs: Expression) -> Self {
        Expression::Assignment {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn binary(op: BinOp, lhs: Expression, rhs: Expression, ty: Type) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            ty,
        }
    }

    pub fn not(operand: Expression) -> Self {
        Expression::Unary {
            op: UnOp::Not,
            operand: Box::new(operand),
        }
    }

    pub fn index(base: Expression, index: Expression) -> Self {
        Expression::IndexAccess {
            base: Box::new(base),
            index: Box::new(index),
        }
    }
}

/// How a call site was resolved by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
    /// `assert(cond)` — a verification target.
    Assert,
    /// `require(cond)` — an assumption on the current path.
    Require,
    /// Statically resolved call within the contract hierarchy or to a
    /// library function.
    Internal { callee: NodeId },
    /// Call into another contract.
    External,
    /// Low-level call/delegatecall/staticcall.
    BareCall,
    /// Contract creation (`new C(...)`).
    Creation,
    /// keccak256/sha256/ripemd160/ecrecover.
    Hash,
    /// blockhash and friends.
    BlockIntrinsic,
}

impl CallKind {
    /// Calls the encoder cannot model precisely; they havoc instead.
    pub fn is_unknown(&self) -> bool {
        matches!(
            self,
            CallKind::External
                | CallKind::BareCall
                | CallKind::Creation
                | CallKind::Hash
                | CallKind::BlockIntrinsic
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub id: NodeId,
    pub kind: CallKind,
    pub arguments: Vec<Expression>,
    pub loc: SourceLocation,
}

impl FunctionCall {
    pub fn new(id: NodeId, kind: CallKind, arguments: Vec<Expression>) -> Self {
        Self {
            id,
            kind,
            arguments,
            loc: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractDefinition {
    pub id: NodeId,
    pub name: String,
    /// State variables declared directly in this contract.
    pub state_variables: Vec<VariableDeclaration>,
    /// Functions defined (not merely inherited) by this contract.
    pub functions: Vec<FunctionDefinition>,
    /// C3-linearised base list, most-derived first. Always starts with
    /// this contract's own id.
    pub base_ids: Vec<NodeId>,
    pub is_library: bool,
    pub loc: SourceLocation,
}

impl ContractDefinition {
    /// Standalone contract without bases.
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            state_variables: Vec::new(),
            functions: Vec::new(),
            base_ids: vec![id],
            is_library: false,
            loc: SourceLocation::default(),
        }
    }

    pub fn constructor(&self) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.is_constructor())
    }
}

/// A compilation unit: every contract reachable from the analysis root.
#[derive(Debug, Clone, Default)]
pub struct SourceUnit {
    pub contracts: Vec<ContractDefinition>,
}

impl SourceUnit {
    pub fn new(contracts: Vec<ContractDefinition>) -> Self {
        Self { contracts }
    }

    pub fn contract(&self, id: NodeId) -> Option<&ContractDefinition> {
        self.contracts.iter().find(|c| c.id == id)
    }

    pub fn function(&self, id: NodeId) -> Option<&FunctionDefinition> {
        self.contracts
            .iter()
            .flat_map(|c| c.functions.iter())
            .find(|f| f.id == id)
    }

    /// The contract that defines the given function.
    pub fn declaring_contract(&self, function_id: NodeId) -> Option<&ContractDefinition> {
        self.contracts
            .iter()
            .find(|c| c.functions.iter().any(|f| f.id == function_id))
    }
}
