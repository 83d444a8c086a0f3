//! Code generation errors.

use thiserror::Error;

/// Errors raised while emitting AVR assembly.
#[derive(Debug, Error, PartialEq)]
pub enum CodegenError {
    /// The first-fit pool (`r16..r31`) ran out of registers.
    #[error("register pool exhausted while mapping '{0}'")]
    RegisterPressure(String),

    /// An operand names a temporary that was never defined.
    #[error("operand '{0}' has no register and is not a memory or literal")]
    UnknownOperand(String),
}
