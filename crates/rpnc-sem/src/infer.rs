//! Attribute-grammar type inference.
//!
//! The checker visits the parse tree in post-order and synthesizes the
//! `inferred_type` attribute of every node from its children:
//!
//! | node | rule |
//! |------|------|
//! | number with `.` | `real`, otherwise `int` |
//! | identifier | declared type |
//! | `+ - *` | both numeric → `promote(t1, t2)` |
//! | `\|` | both numeric → `real` |
//! | `/ %` | both `int` → `int` |
//! | `^` | exponent `int`, base numeric → base type |
//! | relational | both numeric → `bool` |
//! | store | type of the stored value; declares/updates the name |
//! | recall | declared type |
//! | RES | type recorded in the history |
//! | IF | type of the then-block (warns when branches differ) |
//! | WHILE | type of the body |
//!
//! A node whose children already failed gets [`Type::Err`] without a second
//! diagnostic, so each defect is reported exactly once. Guard conditions
//! are also left to the control validator; this pass only types them.

use rpnc_lex::ArithOp;
use rpnc_par::{Expr, ExprKind};
use rpnc_util::{Diagnostic, ErrorKind, Handler};

use crate::symbol_table::SymbolTable;
use crate::typed::{TypedExpr, TypedKind};
use crate::types::Type;

/// Post-order type checker; one instance per source line.
pub struct TypeChecker<'a> {
    table: &'a mut SymbolTable,
    handler: &'a Handler,
}

impl<'a> TypeChecker<'a> {
    pub fn new(table: &'a mut SymbolTable, handler: &'a Handler) -> Self {
        Self { table, handler }
    }

    /// Annotates the tree rooted at `expr`.
    pub fn check(&mut self, expr: &Expr) -> TypedExpr {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Number(lexeme) => {
                let ty = if lexeme.contains('.') {
                    Type::Real
                } else {
                    Type::Int
                };
                TypedExpr::new(TypedKind::Number(lexeme.clone()), line, ty)
            },

            ExprKind::Ident(name) => {
                let ty = self.table.type_of(name).unwrap_or(Type::Err);
                TypedExpr::new(TypedKind::Ident(name.clone()), line, ty)
            },

            ExprKind::Expression(child) => {
                let child = self.check(child);
                let ty = child.ty;
                TypedExpr::new(TypedKind::Expression(Box::new(child)), line, ty)
            },

            ExprKind::Operation { op, lhs, rhs } => {
                let lhs = self.check(lhs);
                let rhs = self.check(rhs);
                let ty = self.operation_type(*op, lhs.ty, rhs.ty, line);
                TypedExpr::new(
                    TypedKind::Operation {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    line,
                    ty,
                )
            },

            ExprKind::Condition { op, lhs, rhs } => {
                let lhs = self.check(lhs);
                let rhs = self.check(rhs);
                // diagnostics for bad guards belong to the control validator
                let ty = if lhs.ty.is_numeric() && rhs.ty.is_numeric() {
                    Type::Bool
                } else {
                    Type::Err
                };
                TypedExpr::new(
                    TypedKind::Condition {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    line,
                    ty,
                )
            },

            ExprKind::Comparison { op, lhs, rhs } => {
                let lhs = self.check(lhs);
                let rhs = self.check(rhs);
                let ty = if lhs.ty.is_numeric() && rhs.ty.is_numeric() {
                    Type::Bool
                } else if lhs.ty == Type::Err || rhs.ty == Type::Err {
                    Type::Err
                } else {
                    self.type_error(
                        format!(
                            "operands of '{}' must be numeric, found {} and {}",
                            op, lhs.ty, rhs.ty
                        ),
                        line,
                    )
                };
                TypedExpr::new(
                    TypedKind::Comparison {
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    line,
                    ty,
                )
            },

            ExprKind::StoreMem { value, name } => {
                let value = self.check(value);
                let ty = if value.ty.is_numeric() {
                    self.declare(name, value.ty, value.literal_value(), line);
                    value.ty
                } else if value.ty == Type::Err {
                    Type::Err
                } else {
                    self.type_error(
                        format!("stored value must be numeric, found {}", value.ty),
                        line,
                    )
                };
                TypedExpr::new(
                    TypedKind::StoreMem {
                        value: Box::new(value),
                        name: name.clone(),
                    },
                    line,
                    ty,
                )
            },

            ExprKind::RecallMem(name) => {
                let ty = self.table.type_of(name).unwrap_or(Type::Err);
                TypedExpr::new(TypedKind::RecallMem(name.clone()), line, ty)
            },

            ExprKind::Res(lexeme) => {
                // bounds were checked by the memory validator
                let n = lexeme.parse::<usize>().unwrap_or(0);
                let ty = self.table.history(n).map(|e| e.ty).unwrap_or(Type::Err);
                TypedExpr::new(TypedKind::Res(n), line, ty)
            },

            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let condition = self.check(condition);
                let then_block = self.check(then_block);
                let else_block = self.check(else_block);
                if then_block.ty != else_block.ty
                    && then_block.ty != Type::Err
                    && else_block.ty != Type::Err
                {
                    self.handler.emit(Diagnostic::warning(
                        ErrorKind::Type,
                        format!(
                            "IF branches have different types: then is {}, else is {}",
                            then_block.ty, else_block.ty
                        ),
                        line,
                    ));
                }
                let ty = then_block.ty;
                TypedExpr::new(
                    TypedKind::If {
                        condition: Box::new(condition),
                        then_block: Box::new(then_block),
                        else_block: Box::new(else_block),
                    },
                    line,
                    ty,
                )
            },

            ExprKind::While { condition, body } => {
                let condition = self.check(condition);
                let body = self.check(body);
                let ty = body.ty;
                TypedExpr::new(
                    TypedKind::While {
                        condition: Box::new(condition),
                        body: Box::new(body),
                    },
                    line,
                    ty,
                )
            },

            ExprKind::CompoundBlock(exprs) => {
                let exprs: Vec<TypedExpr> = exprs.iter().map(|e| self.check(e)).collect();
                let ty = exprs.last().map(|e| e.ty).unwrap_or(Type::Void);
                TypedExpr::new(TypedKind::CompoundBlock(exprs), line, ty)
            },
        }
    }

    /// Synthesizes the result type of an arithmetic operation.
    fn operation_type(&self, op: ArithOp, lhs: Type, rhs: Type, line: u32) -> Type {
        if lhs == Type::Err || rhs == Type::Err {
            return Type::Err;
        }
        match op {
            ArithOp::Add | ArithOp::Sub | ArithOp::Mul => {
                if lhs.is_numeric() && rhs.is_numeric() {
                    Type::promote(lhs, rhs)
                } else {
                    self.type_error(
                        format!(
                            "operands of '{}' must be numeric, found {} and {}",
                            op, lhs, rhs
                        ),
                        line,
                    )
                }
            },
            ArithOp::RealDiv => {
                if lhs.is_numeric() && rhs.is_numeric() {
                    Type::Real
                } else {
                    self.type_error(
                        format!(
                            "operands of '|' must be numeric, found {} and {}",
                            lhs, rhs
                        ),
                        line,
                    )
                }
            },
            ArithOp::IntDiv | ArithOp::Rem => {
                if lhs == Type::Int && rhs == Type::Int {
                    Type::Int
                } else {
                    self.type_error(
                        format!("operands of '{}' must be int, found {} and {}", op, lhs, rhs),
                        line,
                    )
                }
            },
            ArithOp::Pow => {
                if rhs != Type::Int {
                    self.type_error(format!("exponent of '^' must be int, found {}", rhs), line)
                } else if !lhs.is_numeric() {
                    self.type_error(format!("base of '^' must be numeric, found {}", lhs), line)
                } else {
                    lhs
                }
            },
        }
    }

    /// Declares the name on first store, updates it afterwards.
    fn declare(&mut self, name: &str, ty: Type, value: Option<f64>, line: u32) {
        if !self.table.exists(name) {
            // parser only produces uppercase identifiers, so add cannot fail
            let _ = self.table.add(name, ty, line);
        }
        let _ = self.table.update(name, ty, true, value);
    }

    /// Emits a TypeError and poisons the node.
    fn type_error(&self, message: String, line: u32) -> Type {
        self.handler
            .emit(Diagnostic::error(ErrorKind::Type, message, line));
        Type::Err
    }
}
