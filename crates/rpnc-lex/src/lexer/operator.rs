//! Relational operator lexing.
//!
//! Valid forms are `>`, `<`, `>=`, `<=`, `==`, `!=`. The characters `=`
//! and `!` only exist as the first half of a two-character operator; on
//! their own they are lexical errors.

use crate::token::{RelOp, Token};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a relational operator.
    ///
    /// The cursor is on one of `> < = !` when this is called.
    pub(crate) fn lex_relational(&mut self) -> Token {
        let first = self.cursor.current_char();
        self.cursor.advance();

        match first {
            '>' => {
                if self.cursor.match_char('=') {
                    Token::Rel(RelOp::Ge)
                } else {
                    Token::Rel(RelOp::Gt)
                }
            },
            '<' => {
                if self.cursor.match_char('=') {
                    Token::Rel(RelOp::Le)
                } else {
                    Token::Rel(RelOp::Lt)
                }
            },
            '=' => {
                if self.cursor.match_char('=') {
                    Token::Rel(RelOp::Eq)
                } else {
                    self.report_error("'=' is only valid as part of '=='");
                    Token::Invalid("=".to_string())
                }
            },
            '!' => {
                if self.cursor.match_char('=') {
                    Token::Rel(RelOp::Ne)
                } else {
                    self.report_error("'!' is only valid as part of '!='");
                    Token::Invalid("!".to_string())
                }
            },
            _ => unreachable!("lex_relational called on '{}'", first),
        }
    }
}
