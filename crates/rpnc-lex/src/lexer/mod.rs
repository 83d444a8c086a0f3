//! Lexer module.
//!
//! The lexer implementation is split into focused components:
//! - `core` - Main Lexer struct and dispatch
//! - `number` - Number literal lexing
//! - `operator` - Relational operator lexing
//! - `word` - Identifier and reserved word lexing

mod core;
mod number;
mod operator;
mod word;

pub use self::core::Lexer;
