//! Core lexer implementation.
//!
//! This module contains the main Lexer struct and its dispatch loop.

use rpnc_util::{Diagnostic, ErrorKind, Handler, Span};

use crate::cursor::Cursor;
use crate::token::{ArithOp, Token};

/// Lexer for one line of RPN source.
///
/// The lexer transforms a source line into a stream of tokens. Errors are
/// reported through the shared handler and yield [`Token::Invalid`] so the
/// caller can decide to abort the line.
pub struct Lexer<'a> {
    /// Character cursor over the source line.
    pub cursor: Cursor<'a>,

    /// Diagnostic handler for lexical errors.
    handler: &'a Handler,

    /// Source line number (1-based) attached to diagnostics.
    line: u32,

    /// Starting position of the current token (byte offset).
    token_start: usize,

    /// Starting column of the current token (1-based).
    token_start_column: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source line.
    pub fn new(source: &'a str, line: u32, handler: &'a Handler) -> Self {
        Self {
            cursor: Cursor::new(source),
            handler,
            line,
            token_start: 0,
            token_start_column: 1,
        }
    }

    /// Returns the next token from the source line.
    ///
    /// Skips whitespace, then dispatches on the current character to the
    /// appropriate lexing method. Returns `Token::Eof` at end of line.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        self.token_start = self.cursor.position();
        self.token_start_column = self.cursor.column();

        if self.cursor.is_at_end() {
            return Token::Eof;
        }

        let c = self.cursor.current_char();
        match c {
            '(' => {
                self.cursor.advance();
                Token::LParen
            },
            ')' => {
                self.cursor.advance();
                Token::RParen
            },
            '>' | '<' | '=' | '!' => self.lex_relational(),
            _ => {
                if let Some(op) = ArithOp::from_char(c) {
                    self.cursor.advance();
                    return Token::Arith(op);
                }
                if c.is_ascii_digit() {
                    return self.lex_number();
                }
                if c == '.' {
                    self.report_error("malformed number: '.' without integer part");
                    self.cursor.advance();
                    return Token::Invalid(c.to_string());
                }
                if c.is_ascii_uppercase() {
                    return self.lex_word();
                }
                self.report_error(format!("illegal character '{}'", c));
                self.cursor.advance();
                Token::Invalid(c.to_string())
            },
        }
    }

    /// Skips spaces and tabs between tokens.
    fn skip_whitespace(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char().is_whitespace() {
            self.cursor.advance();
        }
    }

    /// Reports a lexical error spanning the current token.
    pub(crate) fn report_error(&self, message: impl Into<String>) {
        let span = Span::new(
            self.token_start,
            self.cursor.position(),
            self.line,
            self.token_start_column,
        );
        self.handler.emit(
            Diagnostic::error(ErrorKind::Lexical, message, span.line)
                .with_context(format!("at column {}", span.column)),
        );
    }

    /// Starting byte offset of the token being lexed.
    pub(crate) fn token_start(&self) -> usize {
        self.token_start
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token == Token::Eof {
            None
        } else {
            Some(token)
        }
    }
}
