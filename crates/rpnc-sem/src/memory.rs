//! Memory access validation.
//!
//! Runs before type inference, over the untyped tree, with the symbol
//! table as it stood at the end of the previous line. The walk follows
//! evaluation order so that a store earlier in the same line satisfies a
//! recall later in it. Checks:
//!
//! - every memory read (operand identifier or `(NAME)` recall) targets a
//!   declared, initialized symbol;
//! - `(N RES)` carries an integer index inside the recorded history;
//! - stores always pass (declaration-on-store is allowed).

use std::collections::HashSet;

use rpnc_par::{Expr, ExprKind};
use rpnc_util::{Diagnostic, ErrorKind, Handler};

use crate::symbol_table::SymbolTable;

/// Validator for memory reads and RES bounds; one instance per line.
pub struct MemoryValidator<'a> {
    table: &'a SymbolTable,
    handler: &'a Handler,
    /// Names stored earlier in this line's evaluation order.
    stored_this_line: HashSet<String>,
}

impl<'a> MemoryValidator<'a> {
    pub fn new(table: &'a SymbolTable, handler: &'a Handler) -> Self {
        Self {
            table,
            handler,
            stored_this_line: HashSet::new(),
        }
    }

    /// Walks the tree, reporting MemoryErrors through the handler.
    pub fn validate(&mut self, expr: &Expr) {
        let line = expr.line;
        match &expr.kind {
            ExprKind::Number(_) => {},

            ExprKind::Ident(name) | ExprKind::RecallMem(name) => {
                self.check_readable(name, line);
            },

            ExprKind::Expression(child) => self.validate(child),

            ExprKind::Operation { lhs, rhs, .. }
            | ExprKind::Condition { lhs, rhs, .. }
            | ExprKind::Comparison { lhs, rhs, .. } => {
                self.validate(lhs);
                self.validate(rhs);
            },

            ExprKind::StoreMem { value, name } => {
                self.validate(value);
                self.stored_this_line.insert(name.clone());
            },

            ExprKind::Res(lexeme) => self.check_res(lexeme, line),

            ExprKind::If {
                condition,
                then_block,
                else_block,
            } => {
                self.validate(condition);
                self.validate(then_block);
                self.validate(else_block);
            },

            ExprKind::While { condition, body } => {
                self.validate(condition);
                self.validate(body);
            },

            ExprKind::CompoundBlock(exprs) => {
                for expr in exprs {
                    self.validate(expr);
                }
            },
        }
    }

    fn check_readable(&self, name: &str, line: u32) {
        if self.stored_this_line.contains(name) {
            return;
        }
        match self.table.get(name) {
            None => self.handler.emit(Diagnostic::error(
                ErrorKind::Memory,
                format!("undeclared memory '{}'", name),
                line,
            )),
            Some(symbol) if !symbol.initialized => self.handler.emit(Diagnostic::error(
                ErrorKind::Memory,
                format!("memory '{}' used before initialization", name),
                line,
            )),
            Some(_) => {},
        }
    }

    fn check_res(&self, lexeme: &str, line: u32) {
        let available = self.table.history_len();
        match lexeme.parse::<usize>() {
            Ok(n) if n >= 1 && n <= available => {
                // control-structure lines leave no value behind
                if let Ok(entry) = self.table.history(n) {
                    if entry.ty == crate::types::Type::Void {
                        self.handler.emit(Diagnostic::error(
                            ErrorKind::Memory,
                            format!("RES index {} references a line with no value", n),
                            line,
                        ));
                    }
                }
            },
            Ok(n) => self.handler.emit(Diagnostic::error(
                ErrorKind::Memory,
                format!(
                    "RES index {} out of range (available: 1-{})",
                    n, available
                ),
                line,
            )),
            Err(_) => self.handler.emit(Diagnostic::error(
                ErrorKind::Memory,
                format!("RES index must be an integer literal, found '{}'", lexeme),
                line,
            )),
        }
    }
}
