//! Edge case tests for rpnc-lex

use crate::{ArithOp, Lexer, RelOp, Reserved, Token};
use rpnc_util::Handler;

fn lex_all(source: &str) -> (Vec<Token>, Handler) {
    let handler = Handler::new();
    let tokens = {
        let mut lexer = Lexer::new(source, 1, &handler);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        tokens
    };
    (tokens, handler)
}

fn lex_ok(source: &str) -> Vec<Token> {
    let (tokens, handler) = lex_all(source);
    assert!(
        !handler.has_errors(),
        "unexpected lexical errors for {:?}: {:?}",
        source,
        handler.diagnostics()
    );
    tokens
}

// ==================== BASIC FORMS ====================

#[test]
fn test_edge_empty_line() {
    assert!(lex_ok("").is_empty());
}

#[test]
fn test_edge_whitespace_only() {
    assert!(lex_ok("   \t  ").is_empty());
}

#[test]
fn test_edge_simple_operation() {
    let t = lex_ok("(3 5 +)");
    assert_eq!(
        t,
        vec![
            Token::LParen,
            Token::Number("3".into()),
            Token::Number("5".into()),
            Token::Arith(ArithOp::Add),
            Token::RParen,
        ]
    );
}

#[test]
fn test_edge_real_literal() {
    let t = lex_ok("3.14");
    assert_eq!(t[0], Token::Number("3.14".into()));
}

#[test]
fn test_edge_no_space_between_tokens() {
    let t = lex_ok("(3.5 4|)");
    assert_eq!(t[2], Token::Number("4".into()));
    assert_eq!(t[3], Token::Arith(ArithOp::RealDiv));
}

#[test]
fn test_edge_all_arith_operators() {
    let t = lex_ok("+ - * / % ^ |");
    let ops: Vec<ArithOp> = t
        .iter()
        .map(|t| match t {
            Token::Arith(op) => *op,
            other => panic!("expected operator, got {:?}", other),
        })
        .collect();
    assert_eq!(
        ops,
        vec![
            ArithOp::Add,
            ArithOp::Sub,
            ArithOp::Mul,
            ArithOp::IntDiv,
            ArithOp::Rem,
            ArithOp::Pow,
            ArithOp::RealDiv,
        ]
    );
}

#[test]
fn test_edge_all_relational_operators() {
    let t = lex_ok("> < >= <= == !=");
    let ops: Vec<RelOp> = t
        .iter()
        .map(|t| match t {
            Token::Rel(op) => *op,
            other => panic!("expected relational operator, got {:?}", other),
        })
        .collect();
    assert_eq!(
        ops,
        vec![RelOp::Gt, RelOp::Lt, RelOp::Ge, RelOp::Le, RelOp::Eq, RelOp::Ne]
    );
}

#[test]
fn test_edge_reserved_words() {
    let t = lex_ok("RES IF WHILE THEN ELSE PRINT");
    assert_eq!(t[0], Token::Reserved(Reserved::Res));
    assert_eq!(t[1], Token::Reserved(Reserved::If));
    assert_eq!(t[2], Token::Reserved(Reserved::While));
    assert_eq!(t[5], Token::Reserved(Reserved::Print));
}

#[test]
fn test_edge_identifier_not_reserved() {
    let t = lex_ok("MEM CONTADOR X");
    assert_eq!(t[0], Token::Ident("MEM".into()));
    assert_eq!(t[1], Token::Ident("CONTADOR".into()));
    assert_eq!(t[2], Token::Ident("X".into()));
}

#[test]
fn test_edge_reserved_prefix_is_one_word() {
    // maximal munch: RESX is a single identifier, not RES + X
    let t = lex_ok("RESX");
    assert_eq!(t, vec![Token::Ident("RESX".into())]);
}

// ==================== ERROR CASES ====================

#[test]
fn test_edge_bare_equals_rejected() {
    let (_, handler) = lex_all("(1 2 =)");
    assert!(handler.has_errors());
}

#[test]
fn test_edge_bare_bang_rejected() {
    let (_, handler) = lex_all("(1 2 !)");
    assert!(handler.has_errors());
}

#[test]
fn test_edge_trailing_dot_rejected() {
    let (_, handler) = lex_all("(3. 5 +)");
    assert!(handler.has_errors());
}

#[test]
fn test_edge_double_dot_rejected() {
    let (_, handler) = lex_all("(1.2.3 5 +)");
    assert!(handler.has_errors());
}

#[test]
fn test_edge_bare_dot_rejected() {
    let (_, handler) = lex_all("(. 5 +)");
    assert!(handler.has_errors());
}

#[test]
fn test_edge_lowercase_rejected() {
    let (_, handler) = lex_all("(mem)");
    assert!(handler.has_errors());
}

#[test]
fn test_edge_illegal_character() {
    let (tokens, handler) = lex_all("(3 @ 5)");
    assert!(handler.has_errors());
    assert!(tokens.iter().any(|t| matches!(t, Token::Invalid(_))));
}

#[test]
fn test_edge_error_reports_line() {
    let handler = Handler::new();
    let mut lexer = Lexer::new("(3 $ +)", 7, &handler);
    while lexer.next_token() != Token::Eof {}
    let diags = handler.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].line, 7);
}

// ==================== ROUND TRIP ====================

fn round_trip(tokens: &[Token]) -> Vec<Token> {
    let joined = tokens
        .iter()
        .map(Token::lexeme)
        .collect::<Vec<_>>()
        .join(" ");
    lex_ok(&joined)
}

#[test]
fn test_round_trip_preserves_tokens() {
    for source in [
        "(3 5 +)",
        "((2 3 *) (4 2 /) |)",
        "(42 MEM)",
        "(MEM)",
        "(1 RES)",
        "(X 0 > ((X 1 -) X) WHILE)",
        "((5 10 >) ((5)) ((10)) IF)",
    ] {
        let tokens = lex_ok(source);
        assert_eq!(round_trip(&tokens), tokens, "round trip failed for {}", source);
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_token() -> impl Strategy<Value = Token> {
        prop_oneof![
            "[0-9]{1,4}".prop_map(Token::Number),
            "[0-9]{1,3}\\.[0-9]{1,3}".prop_map(Token::Number),
            "[A-Z]{1,6}".prop_map(|name| match Reserved::lookup(&name) {
                Some(word) => Token::Reserved(word),
                None => Token::Ident(name),
            }),
            prop_oneof![
                Just(ArithOp::Add),
                Just(ArithOp::Sub),
                Just(ArithOp::Mul),
                Just(ArithOp::IntDiv),
                Just(ArithOp::Rem),
                Just(ArithOp::Pow),
                Just(ArithOp::RealDiv),
            ]
            .prop_map(Token::Arith),
            prop_oneof![
                Just(RelOp::Gt),
                Just(RelOp::Lt),
                Just(RelOp::Ge),
                Just(RelOp::Le),
                Just(RelOp::Eq),
                Just(RelOp::Ne),
            ]
            .prop_map(Token::Rel),
            Just(Token::LParen),
            Just(Token::RParen),
        ]
    }

    proptest! {
        // Lexing is inverse to lexeme concatenation for any token sequence.
        #[test]
        fn prop_lexer_round_trip(tokens in prop::collection::vec(arb_token(), 0..24)) {
            prop_assert_eq!(round_trip(&tokens), tokens);
        }
    }
}
