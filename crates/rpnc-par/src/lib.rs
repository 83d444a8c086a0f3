//! rpnc-par - LL(1) Parser
//!
//! Recursive-descent parser for the fully parenthesized RPN grammar:
//!
//! ```ebnf
//! P         = E ;
//! E         = "(" body ")" ;
//! body      = operation | store | recall | res | control | comparison | operand ;
//! operation = operand operand ArithOp ;
//! comparison= operand operand RelOp ;
//! store     = operand Identifier ;
//! recall    = Identifier ;
//! res       = Number "RES" ;
//! control   = operand operand RelOp block ( block "IF" | "WHILE" ) ;
//! block     = E | "(" E { E } ")" ;
//! operand   = Number | Identifier | E ;
//! ```
//!
//! Several body alternatives share prefixes, so the parser disambiguates
//! with a bounded [`peek`](Parser::peek) of at most three tokens, evaluated
//! in this order:
//!
//! 1. `Number RES`            → res
//! 2. `Number Ident ")"`      → store with a literal value
//! 3. `Ident ")"`             → recall
//! 4. otherwise parse the first operand; then
//!    - `Ident ")"`           → store with a computed value
//!    - `")"`                 → the operand itself is the body
//!    - a parenthesized relational followed by `(` → IF/WHILE with the
//!      relational as its guard
//! 5. otherwise parse the second operand; a RelOp followed by `")"` is a
//!    comparison, a RelOp followed by a block is `IF`/`WHILE` depending on
//!    whether a second block or the `WHILE` word follows, and an
//!    arithmetic operator is an operation
//!
//! There is no recovery: the first syntax error aborts the line and is
//! reported through the shared [`Handler`](rpnc_util::Handler).

pub mod ast;

#[cfg(test)]
mod edge_cases;

pub use ast::{Expr, ExprKind};

use rpnc_lex::{Reserved, Token};
use rpnc_util::{Diagnostic, ErrorKind, Handler};

/// Parser over one line's token stream.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    line: u32,
    handler: &'a Handler,
}

impl<'a> Parser<'a> {
    /// Creates a parser for the tokens of one source line.
    pub fn new(tokens: Vec<Token>, line: u32, handler: &'a Handler) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
            handler,
        }
    }

    /// Parses the whole line as a single expression.
    ///
    /// Returns `None` when a syntax error was reported. Trailing tokens
    /// after a valid expression are also a syntax error.
    pub fn parse(&mut self) -> Option<Expr> {
        if self.tokens.is_empty() {
            return self.expected("'('");
        }
        let expr = self.parse_expr()?;
        if !matches!(self.peek(0), Token::Eof) {
            return self.expected("end of line after expression");
        }
        Some(expr)
    }

    // =========================================================================
    // TOKEN STREAM PRIMITIVES
    // =========================================================================

    /// Looks `n` tokens ahead without consuming (n ≤ 3 by construction).
    ///
    /// Past the end of the stream this returns `Token::Eof`, so lookahead
    /// never needs a bounds check at the call sites.
    fn peek(&self, n: usize) -> &Token {
        debug_assert!(n <= 3, "lookahead is bounded at three tokens");
        self.tokens.get(self.pos + n).unwrap_or(&Token::Eof)
    }

    /// Consumes and returns the current token.
    fn advance(&mut self) -> Token {
        let token = self.peek(0).clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consumes the current token when it is `(`; error otherwise.
    fn expect_lparen(&mut self) -> Option<()> {
        if matches!(self.peek(0), Token::LParen) {
            self.advance();
            Some(())
        } else {
            self.expected("'('")
        }
    }

    /// Consumes the current token when it is `)`; error otherwise.
    fn expect_rparen(&mut self) -> Option<()> {
        if matches!(self.peek(0), Token::RParen) {
            self.advance();
            Some(())
        } else {
            self.expected("')'")
        }
    }

    /// Reports a syntax error naming what was expected and what was found.
    fn expected<T>(&self, what: &str) -> Option<T> {
        let found = self.peek(0);
        let message = match found {
            Token::Eof => format!("expected {}, found end of line", what),
            _ => format!(
                "expected {}, found {} '{}'",
                what,
                found.describe(),
                found.lexeme()
            ),
        };
        self.handler
            .emit(Diagnostic::error(ErrorKind::Syntax, message, self.line));
        None
    }

    /// Consumes a `Number` token and returns its lexeme.
    ///
    /// Only called when lookahead already established the token class.
    fn take_number(&mut self) -> String {
        match self.advance() {
            Token::Number(lexeme) => lexeme,
            other => unreachable!("lookahead promised a number, got {:?}", other),
        }
    }

    /// Consumes an `Ident` token and returns its name.
    fn take_ident(&mut self) -> String {
        match self.advance() {
            Token::Ident(name) => name,
            other => unreachable!("lookahead promised an identifier, got {:?}", other),
        }
    }

    // =========================================================================
    // GRAMMAR PRODUCTIONS
    // =========================================================================

    /// E = "(" body ")"
    fn parse_expr(&mut self) -> Option<Expr> {
        let line = self.line;
        self.expect_lparen()?;
        let body = self.parse_body()?;
        self.expect_rparen()?;
        Some(Expr::new(ExprKind::Expression(Box::new(body)), line))
    }

    /// Dispatches among the body alternatives using bounded lookahead.
    fn parse_body(&mut self) -> Option<Expr> {
        let line = self.line;
        match self.peek(0).clone() {
            // res: (N RES)
            Token::Number(_) if matches!(self.peek(1), Token::Reserved(Reserved::Res)) => {
                let lexeme = self.take_number();
                self.advance();
                Some(Expr::new(ExprKind::Res(lexeme), line))
            },

            // store with literal value: (V NAME)
            Token::Number(_)
                if matches!(self.peek(1), Token::Ident(_))
                    && matches!(self.peek(2), Token::RParen) =>
            {
                let lexeme = self.take_number();
                let name = self.take_ident();
                Some(Expr::new(
                    ExprKind::StoreMem {
                        value: Expr::boxed(ExprKind::Number(lexeme), line),
                        name,
                    },
                    line,
                ))
            },

            // recall: (NAME)
            Token::Ident(_) if matches!(self.peek(1), Token::RParen) => {
                let name = self.take_ident();
                Some(Expr::new(ExprKind::RecallMem(name), line))
            },

            _ => {
                let first = self.parse_operand()?;
                let kind = self.parse_body_continuation(first)?;
                Some(Expr::new(kind, line))
            },
        }
    }

    /// Continues a body whose first operand is already parsed.
    ///
    /// Decides among store-with-computed-value, bare operand, operation,
    /// comparison, and control structure.
    fn parse_body_continuation(&mut self, first: Expr) -> Option<ExprKind> {
        // store with computed value: ((expr) NAME)
        if matches!(self.peek(0), Token::Ident(_)) && matches!(self.peek(1), Token::RParen) {
            let name = self.take_ident();
            return Some(ExprKind::StoreMem {
                value: Box::new(first),
                name,
            });
        }

        // bare operand body: (5) or ((expr))
        if matches!(self.peek(0), Token::RParen) {
            return Some(first.kind);
        }

        // control structure with a parenthesized condition:
        // ((a b relop) (then) (else) IF) or ((a b relop) (body) WHILE)
        if matches!(self.peek(0), Token::LParen) {
            if let Some(condition) = as_condition(&first) {
                return self.parse_control_tail(condition);
            }
        }

        let second = self.parse_operand()?;
        self.parse_operator_continuation(first, second)
    }

    /// Continues a body after both operands are parsed: the next token
    /// picks operation, comparison, or control structure.
    fn parse_operator_continuation(&mut self, first: Expr, second: Expr) -> Option<ExprKind> {
        let line = self.line;
        match self.peek(0).clone() {
            Token::Arith(op) => {
                self.advance();
                Some(ExprKind::Operation {
                    op,
                    lhs: Box::new(first),
                    rhs: Box::new(second),
                })
            },
            Token::Rel(op) => {
                self.advance();
                if matches!(self.peek(0), Token::RParen) {
                    return Some(ExprKind::Comparison {
                        op,
                        lhs: Box::new(first),
                        rhs: Box::new(second),
                    });
                }
                let condition = Expr::new(
                    ExprKind::Condition {
                        op,
                        lhs: Box::new(first),
                        rhs: Box::new(second),
                    },
                    line,
                );
                self.parse_control_tail(condition)
            },
            _ => self.expected("operator after operands"),
        }
    }

    /// control tail: block ( block "IF" | "WHILE" )
    fn parse_control_tail(&mut self, condition: Expr) -> Option<ExprKind> {
        if !matches!(self.peek(0), Token::LParen) {
            return self.expected("block after relational operator");
        }
        let block1 = self.parse_block()?;

        match self.peek(0).clone() {
            Token::LParen => {
                let block2 = self.parse_block()?;
                if matches!(self.peek(0), Token::Reserved(Reserved::If)) {
                    self.advance();
                    Some(ExprKind::If {
                        condition: Box::new(condition),
                        then_block: Box::new(block1),
                        else_block: Box::new(block2),
                    })
                } else {
                    self.expected("IF after two blocks")
                }
            },
            Token::Reserved(Reserved::While) => {
                self.advance();
                Some(ExprKind::While {
                    condition: Box::new(condition),
                    body: Box::new(block1),
                })
            },
            _ => self.expected("second block or WHILE after block"),
        }
    }

    /// operand = Number | Identifier | E
    fn parse_operand(&mut self) -> Option<Expr> {
        let line = self.line;
        match self.peek(0).clone() {
            Token::Number(_) => {
                let lexeme = self.take_number();
                Some(Expr::new(ExprKind::Number(lexeme), line))
            },
            Token::Ident(_) => {
                let name = self.take_ident();
                Some(Expr::new(ExprKind::Ident(name), line))
            },
            Token::LParen => self.parse_expr(),
            _ => self.expected("operand (number, identifier or '(')"),
        }
    }

    /// block = E | "(" E { E } ")"
    ///
    /// A block whose first inner token is `(` is usually a compound block,
    /// but it can also be a single body whose first operand is a nested
    /// expression (`((X 1 -) X)` stores, `((A) (B) +)` adds). The parsed
    /// first inner expression plus one more token of lookahead decides.
    fn parse_block(&mut self) -> Option<Expr> {
        let line = self.line;
        self.expect_lparen()?;

        if !matches!(self.peek(0), Token::LParen) {
            let body = self.parse_body()?;
            self.expect_rparen()?;
            return Some(Expr::new(ExprKind::Expression(Box::new(body)), line));
        }

        let first = self.parse_expr()?;

        // store body: ((expr) NAME)
        if matches!(self.peek(0), Token::Ident(_)) && matches!(self.peek(1), Token::RParen) {
            let name = self.take_ident();
            self.expect_rparen()?;
            let store = Expr::new(
                ExprKind::StoreMem {
                    value: Box::new(first),
                    name,
                },
                line,
            );
            return Some(Expr::new(ExprKind::Expression(Box::new(store)), line));
        }

        match self.peek(0).clone() {
            // compound block of one: ((expr))
            Token::RParen => {
                self.advance();
                Some(Expr::new(ExprKind::CompoundBlock(vec![first]), line))
            },

            // second element or second operand
            Token::LParen => {
                let second = self.parse_expr()?;
                match self.peek(0).clone() {
                    Token::Arith(_) | Token::Rel(_) => {
                        let kind = self.parse_operator_continuation(first, second)?;
                        self.expect_rparen()?;
                        Some(Expr::new(
                            ExprKind::Expression(Expr::boxed(kind, line)),
                            line,
                        ))
                    },
                    _ => {
                        let mut exprs = vec![first, second];
                        while matches!(self.peek(0), Token::LParen) {
                            exprs.push(self.parse_expr()?);
                        }
                        self.expect_rparen()?;
                        Some(Expr::new(ExprKind::CompoundBlock(exprs), line))
                    },
                }
            },

            // single body with a nested first operand: ((X) 1 -)
            _ => {
                let kind = self.parse_body_continuation(first)?;
                self.expect_rparen()?;
                Some(Expr::new(
                    ExprKind::Expression(Expr::boxed(kind, line)),
                    line,
                ))
            },
        }
    }
}

/// A parenthesized relational expression used directly in guard position:
/// `(5 10 >)` before a block is the condition `Condition(>, 5, 10)`.
fn as_condition(expr: &Expr) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Expression(inner) => match &inner.kind {
            ExprKind::Comparison { op, lhs, rhs } => Some(Expr::new(
                ExprKind::Condition {
                    op: *op,
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                },
                expr.line,
            )),
            _ => None,
        },
        _ => None,
    }
}
