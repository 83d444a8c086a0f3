//! Control structure validation.
//!
//! Runs after typing, over the annotated tree:
//!
//! - `If` has a relational condition of type `bool` and two blocks;
//! - `While` has a relational condition of type `bool` and one block;
//! - condition operands are numeric;
//! - blocks are parenthesized expressions or compound blocks.
//!
//! The parser already guarantees most shapes; the checks still run so a
//! malformed tree from any future producer fails loudly instead of
//! reaching code generation.

use rpnc_util::{Diagnostic, ErrorKind, Handler};

use crate::typed::{TypedExpr, TypedKind};
use crate::types::Type;

/// Validator for IF/WHILE shape and guard types; one instance per line.
pub struct ControlValidator<'a> {
    handler: &'a Handler,
}

impl<'a> ControlValidator<'a> {
    pub fn new(handler: &'a Handler) -> Self {
        Self { handler }
    }

    /// Walks the annotated tree, reporting ControlErrors.
    pub fn validate(&self, expr: &TypedExpr) {
        match &expr.kind {
            TypedKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.check_condition(condition, "IF");
                self.check_block(then_block, "IF then-branch");
                self.check_block(else_block, "IF else-branch");
                self.validate(condition);
                self.validate(then_block);
                self.validate(else_block);
            },

            TypedKind::While { condition, body } => {
                self.check_condition(condition, "WHILE");
                self.check_block(body, "WHILE body");
                self.validate(condition);
                self.validate(body);
            },

            TypedKind::Expression(child) => self.validate(child),

            TypedKind::Operation { lhs, rhs, .. }
            | TypedKind::Condition { lhs, rhs, .. }
            | TypedKind::Comparison { lhs, rhs, .. } => {
                self.validate(lhs);
                self.validate(rhs);
            },

            TypedKind::StoreMem { value, .. } => self.validate(value),

            TypedKind::CompoundBlock(exprs) => {
                for expr in exprs {
                    self.validate(expr);
                }
            },

            TypedKind::Number(_)
            | TypedKind::Ident(_)
            | TypedKind::RecallMem(_)
            | TypedKind::Res(_) => {},
        }
    }

    fn check_condition(&self, condition: &TypedExpr, what: &str) {
        match &condition.kind {
            TypedKind::Condition { op, lhs, rhs } => {
                for side in [lhs.as_ref(), rhs.as_ref()] {
                    if !side.ty.is_numeric() && side.ty != Type::Err {
                        self.handler.emit(Diagnostic::error(
                            ErrorKind::Control,
                            format!(
                                "operand of '{}' in {} condition must be numeric, found {}",
                                op, what, side.ty
                            ),
                            condition.line,
                        ));
                    }
                }
            },
            other => self.handler.emit(Diagnostic::error(
                ErrorKind::Control,
                format!(
                    "{} condition must be a relational comparison, found {}",
                    what,
                    other.describe()
                ),
                condition.line,
            )),
        }
    }

    fn check_block(&self, block: &TypedExpr, what: &str) {
        if !matches!(
            block.kind,
            TypedKind::Expression(_) | TypedKind::CompoundBlock(_)
        ) {
            self.handler.emit(Diagnostic::error(
                ErrorKind::Control,
                format!("{} must be a parenthesized block", what),
                block.line,
            ));
        }
    }
}
