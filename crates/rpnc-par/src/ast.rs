//! Abstract syntax tree for the RPN language.
//!
//! The parser folds its derivation directly into these tagged variants;
//! there is no separate concrete-derivation structure. Each node carries
//! the 1-based source line it came from. Types are attached later by the
//! semantic analyzer, which produces its own annotated tree.

use rpnc_lex::{ArithOp, RelOp};

/// An expression node with its source line.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

impl Expr {
    /// Creates a node.
    pub fn new(kind: ExprKind, line: u32) -> Self {
        Self { kind, line }
    }

    /// Boxed convenience constructor for child positions.
    pub fn boxed(kind: ExprKind, line: u32) -> Box<Self> {
        Box::new(Self::new(kind, line))
    }
}

/// The expression variants.
///
/// `Condition` and `Comparison` share a shape; a `Condition` guards an
/// `If`/`While` while a `Comparison` is a relational expression used as the
/// whole result of a line.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Numeric literal; the lexeme decides int vs real later
    Number(String),

    /// Memory reference in operand position
    Ident(String),

    /// Parenthesized wrapper around a body
    Expression(Box<Expr>),

    /// `(a b op)` with an arithmetic operator
    Operation {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Relational guard of an `If`/`While`
    Condition {
        op: RelOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `(a b relop)` as a value-producing expression
    Comparison {
        op: RelOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// `(V NAME)` or `((expr) NAME)` - store into a named memory
    StoreMem { value: Box<Expr>, name: String },

    /// `(NAME)` - recall a named memory
    RecallMem(String),

    /// `(N RES)` - recall the N-th most recent line result
    Res(String),

    /// `(lhs rhs op (then) (else) IF)`
    If {
        condition: Box<Expr>,
        then_block: Box<Expr>,
        else_block: Box<Expr>,
    },

    /// `(lhs rhs op (body) WHILE)`
    While {
        condition: Box<Expr>,
        body: Box<Expr>,
    },

    /// `((e1) (e2) ...)` - block of sequenced expressions
    CompoundBlock(Vec<Expr>),
}
