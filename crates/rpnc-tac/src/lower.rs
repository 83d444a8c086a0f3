//! Lowering from the annotated tree to three-address code.
//!
//! One [`TacGen`] accumulates instructions across every line of a program;
//! the temporary and label counters never reset, so names stay unique over
//! the whole translation unit. Emission follows the post-order walk of the
//! tree, which makes the instruction order deterministic and observable by
//! tests.
//!
//! Control structures lower to the classic label patterns:
//!
//! ```text
//! IF:    rc; ifFalse rc goto Lelse; <then>; goto Lend; Lelse:; <else>; Lend:
//! WHILE: Lstart:; rc; ifFalse rc goto Lend; <body>; goto Lstart; Lend:
//! ```
//!
//! After each top-level line the name holding its result is appended to
//! the per-line history, which later `(N RES)` lowerings copy from.
//! Control structures produce no value; their history slot is empty and
//! the semantic analyzer prevents RES from referencing it.

use rpnc_sem::{TypedExpr, TypedKind};
use rpnc_util::InternalError;

use crate::tac::Instr;

/// Accumulating TAC generator for one compilation.
pub struct TacGen {
    instrs: Vec<Instr>,
    temp_counter: usize,
    label_counter: usize,
    result_history: Vec<Option<String>>,
}

impl TacGen {
    /// Creates a generator with empty state.
    pub fn new() -> Self {
        Self {
            instrs: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            result_history: Vec::new(),
        }
    }

    /// Lowers one top-level line and records its result in the history.
    ///
    /// Returns the name holding the line's value, or `None` for lines
    /// whose root is a control structure.
    pub fn lower_line(&mut self, expr: &TypedExpr) -> Result<Option<String>, InternalError> {
        let result = self.lower(expr)?;
        self.result_history.push(result.clone());
        Ok(result)
    }

    /// All instructions emitted so far.
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Consumes the generator, yielding the instruction list.
    pub fn into_instrs(self) -> Vec<Instr> {
        self.instrs
    }

    /// Names of per-line results, latest last; `None` for value-less lines.
    pub fn result_history(&self) -> &[Option<String>] {
        &self.result_history
    }

    /// Number of temporaries allocated.
    pub fn temp_count(&self) -> usize {
        self.temp_counter
    }

    /// Number of labels allocated.
    pub fn label_count(&self) -> usize {
        self.label_counter
    }

    // =========================================================================
    // EMISSION
    // =========================================================================

    fn new_temp(&mut self) -> String {
        let temp = format!("t{}", self.temp_counter);
        self.temp_counter += 1;
        temp
    }

    fn new_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    /// Lowers a node, returning the name of its result (`None` = no value).
    fn lower(&mut self, expr: &TypedExpr) -> Result<Option<String>, InternalError> {
        match &expr.kind {
            TypedKind::Number(lexeme) => {
                let temp = self.new_temp();
                self.emit(Instr::Assign {
                    dst: temp.clone(),
                    src: lexeme.clone(),
                });
                Ok(Some(temp))
            },

            TypedKind::Ident(name) => Ok(Some(name.clone())),

            TypedKind::Expression(child) => self.lower(child),

            TypedKind::Operation { op, lhs, rhs } => {
                let op = (*op).into();
                self.lower_binary(op, lhs, rhs)
            },

            TypedKind::Condition { op, lhs, rhs } | TypedKind::Comparison { op, lhs, rhs } => {
                let op = (*op).into();
                self.lower_binary(op, lhs, rhs)
            },

            TypedKind::StoreMem { value, name } => {
                let value = self.lower_value(value)?;
                self.emit(Instr::Copy {
                    dst: name.clone(),
                    src: value,
                });
                Ok(Some(name.clone()))
            },

            TypedKind::RecallMem(name) => {
                let temp = self.new_temp();
                self.emit(Instr::Copy {
                    dst: temp.clone(),
                    src: name.clone(),
                });
                Ok(Some(temp))
            },

            TypedKind::Res(n) => {
                let available = self.result_history.len();
                if *n == 0 || *n > available {
                    return Err(InternalError::HistoryIndex {
                        requested: *n,
                        available,
                    });
                }
                let source = self.result_history[available - n].clone().ok_or(
                    InternalError::HistoryIndex {
                        requested: *n,
                        available,
                    },
                )?;
                let temp = self.new_temp();
                self.emit(Instr::Copy {
                    dst: temp.clone(),
                    src: source,
                });
                Ok(Some(temp))
            },

            TypedKind::If {
                condition,
                then_block,
                else_block,
            } => {
                let l_else = self.new_label();
                let l_end = self.new_label();
                let cond = self.lower_value(condition)?;
                self.emit(Instr::IfFalse {
                    cond,
                    label: l_else.clone(),
                });
                self.lower(then_block)?;
                self.emit(Instr::Goto(l_end.clone()));
                self.emit(Instr::Label(l_else));
                self.lower(else_block)?;
                self.emit(Instr::Label(l_end));
                Ok(None)
            },

            TypedKind::While { condition, body } => {
                let l_start = self.new_label();
                let l_end = self.new_label();
                self.emit(Instr::Label(l_start.clone()));
                let cond = self.lower_value(condition)?;
                self.emit(Instr::IfFalse {
                    cond,
                    label: l_end.clone(),
                });
                self.lower(body)?;
                self.emit(Instr::Goto(l_start));
                self.emit(Instr::Label(l_end));
                Ok(None)
            },

            TypedKind::CompoundBlock(exprs) => {
                let mut result = None;
                for expr in exprs {
                    result = self.lower(expr)?;
                }
                Ok(result)
            },
        }
    }

    /// Lowers both operands and emits the `Op` into a fresh temporary.
    fn lower_binary(
        &mut self,
        op: crate::tac::TacOp,
        lhs: &TypedExpr,
        rhs: &TypedExpr,
    ) -> Result<Option<String>, InternalError> {
        let lhs = self.lower_value(lhs)?;
        let rhs = self.lower_value(rhs)?;
        let temp = self.new_temp();
        self.emit(Instr::Op {
            dst: temp.clone(),
            lhs,
            op,
            rhs,
        });
        Ok(Some(temp))
    }

    /// Lowers a node that must produce a value.
    fn lower_value(&mut self, expr: &TypedExpr) -> Result<String, InternalError> {
        self.lower(expr)?.ok_or_else(|| {
            InternalError::malformed("tac", "operand position lowered to no value")
        })
    }
}

impl Default for TacGen {
    fn default() -> Self {
        Self::new()
    }
}
