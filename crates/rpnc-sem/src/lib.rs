//! rpnc-sem - Semantic Analyzer
//!
//! Three passes turn a parse tree into a type-annotated tree, sharing one
//! [`SymbolTable`] that lives for the whole program:
//!
//! 1. [`MemoryValidator`] - walks the untyped tree in evaluation order and
//!    checks every memory read against the table as it stood after the
//!    previous line (stores earlier in the same line count), plus RES
//!    bounds. Runs first so inference only ever sees resolvable names.
//! 2. [`TypeChecker`] - the attribute grammar: synthesizes `inferred_type`
//!    bottom-up, declares/updates stored memories, resolves RES indices.
//! 3. [`ControlValidator`] - checks IF/WHILE shape and guard types on the
//!    annotated tree.
//!
//! [`analyze`] runs all three and gates on errors: a line that failed does
//! not reach code generation, and its stores do not touch the table.

pub mod control;
pub mod infer;
pub mod memory;
pub mod symbol_table;
pub mod typed;
pub mod types;

#[cfg(test)]
mod edge_cases;

pub use control::ControlValidator;
pub use infer::TypeChecker;
pub use memory::MemoryValidator;
pub use symbol_table::{HistoryEntry, Symbol, SymbolError, SymbolTable};
pub use typed::{TypedExpr, TypedKind};
pub use types::Type;

use rpnc_par::Expr;
use rpnc_util::Handler;

/// Runs the full semantic phase over one line's parse tree.
///
/// Returns the annotated tree when the line is semantically valid, `None`
/// when any validator or the type checker reported an error. The symbol
/// table is only mutated on the inference pass, which memory validation
/// gates, so a failed line leaves no half-declared symbols behind.
pub fn analyze(expr: &Expr, table: &mut SymbolTable, handler: &Handler) -> Option<TypedExpr> {
    let errors_before = handler.error_count();

    MemoryValidator::new(table, handler).validate(expr);
    if handler.error_count() > errors_before {
        return None;
    }

    let typed = TypeChecker::new(table, handler).check(expr);
    ControlValidator::new(handler).validate(&typed);

    if handler.error_count() > errors_before {
        return None;
    }
    Some(typed)
}
