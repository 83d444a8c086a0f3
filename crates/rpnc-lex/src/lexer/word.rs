//! Identifier and reserved word lexing.

use crate::token::{Reserved, Token};
use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a maximal run of uppercase letters.
    ///
    /// The run is a reserved word when it matches one, otherwise an
    /// identifier (memory name). Lowercase letters never start a word; the
    /// dispatch loop rejects them as illegal characters.
    pub(crate) fn lex_word(&mut self) -> Token {
        let start = self.token_start();

        while self.cursor.current_char().is_ascii_uppercase() {
            self.cursor.advance();
        }

        let word = self.cursor.slice_from(start);
        match Reserved::lookup(word) {
            Some(reserved) => Token::Reserved(reserved),
            None => Token::Ident(word.to_string()),
        }
    }
}
