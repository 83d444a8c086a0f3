//! Number literal lexing.
//!
//! Numbers match `[0-9]+(\.[0-9]+)?`. A trailing decimal point and a
//! second decimal point are both malformed; there are no signs, exponents
//! or radix prefixes in this language.

use crate::token::Token;
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a number literal.
    ///
    /// The cursor is on an ASCII digit when this is called. On a malformed
    /// literal the remaining digit/point run is consumed so the error does
    /// not cascade into follow-up tokens.
    pub(crate) fn lex_number(&mut self) -> Token {
        let start = self.token_start();

        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }

        if self.cursor.current_char() == '.' {
            if !self.cursor.peek_char(1).is_ascii_digit() {
                self.cursor.advance();
                self.report_error("malformed number: trailing decimal point");
                return Token::Invalid(self.cursor.slice_from(start).to_string());
            }

            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }

            if self.cursor.current_char() == '.' {
                self.consume_number_run();
                self.report_error("malformed number: more than one decimal point");
                return Token::Invalid(self.cursor.slice_from(start).to_string());
            }
        }

        Token::Number(self.cursor.slice_from(start).to_string())
    }

    /// Consumes the rest of a broken digit/point run.
    fn consume_number_run(&mut self) {
        while self.cursor.current_char().is_ascii_digit() || self.cursor.current_char() == '.' {
            self.cursor.advance();
        }
    }
}
