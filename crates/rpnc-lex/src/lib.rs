//! rpnc-lex - Lexical Analyzer
//!
//! The lexer turns one source line into a stream of tokens. The token
//! alphabet is small: numbers (`[0-9]+(\.[0-9]+)?`), uppercase identifiers
//! (`[A-Z]+`, reserved words carved out), seven single-character arithmetic
//! operators (`+ - * / % ^ |`), six relational operators (`> < >= <= ==
//! !=`), and parentheses.
//!
//! Lexing is direct-coded: [`Lexer::next_token`] dispatches on the current
//! character to a specialized method per token class. The lexer has no
//! lookback and no symbol table dependency; errors (illegal character,
//! malformed number, bare `=` or `!`) are reported through the shared
//! [`Handler`](rpnc_util::Handler) and surface as [`Token::Invalid`] so the
//! caller can abort the line.
//!
//! ```
//! use rpnc_lex::{Lexer, Token};
//! use rpnc_util::Handler;
//!
//! let handler = Handler::new();
//! let tokens: Vec<Token> = Lexer::new("(3 5 +)", 1, &handler).collect();
//! assert_eq!(tokens.len(), 5);
//! assert!(!handler.has_errors());
//! ```

pub mod cursor;
mod lexer;
pub mod token;

#[cfg(test)]
mod edge_cases;

pub use cursor::Cursor;
pub use lexer::Lexer;
pub use token::{ArithOp, RelOp, Reserved, Token};
