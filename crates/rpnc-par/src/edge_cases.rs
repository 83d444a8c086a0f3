//! Edge case tests for rpnc-par

use crate::{Expr, ExprKind, Parser};
use rpnc_lex::{ArithOp, Lexer, RelOp, Token};
use rpnc_util::Handler;

fn parse_line(source: &str) -> (Option<Expr>, Handler) {
    let handler = Handler::new();
    let tokens: Vec<Token> = Lexer::new(source, 1, &handler).collect();
    assert!(!handler.has_errors(), "lexical errors for {:?}", source);
    let expr = Parser::new(tokens, 1, &handler).parse();
    (expr, handler)
}

fn parse_ok(source: &str) -> Expr {
    let (expr, handler) = parse_line(source);
    assert!(
        !handler.has_errors(),
        "unexpected syntax errors for {:?}: {:?}",
        source,
        handler.diagnostics()
    );
    expr.expect("parser returned no tree without reporting an error")
}

fn parse_err(source: &str) {
    let (expr, handler) = parse_line(source);
    assert!(expr.is_none(), "expected failure for {:?}", source);
    assert!(handler.has_errors(), "no diagnostic for {:?}", source);
}

/// Unwraps the outer Expression node.
fn body(expr: &Expr) -> &ExprKind {
    match &expr.kind {
        ExprKind::Expression(inner) => &inner.kind,
        other => other,
    }
}

// ==================== BODY ALTERNATIVES ====================

#[test]
fn test_operation() {
    let expr = parse_ok("(3 5 +)");
    match body(&expr) {
        ExprKind::Operation { op, lhs, rhs } => {
            assert_eq!(*op, ArithOp::Add);
            assert_eq!(lhs.kind, ExprKind::Number("3".into()));
            assert_eq!(rhs.kind, ExprKind::Number("5".into()));
        },
        other => panic!("expected operation, got {:?}", other),
    }
}

#[test]
fn test_nested_operation() {
    let expr = parse_ok("((2 3 *) (4 2 /) |)");
    match body(&expr) {
        ExprKind::Operation { op, lhs, rhs } => {
            assert_eq!(*op, ArithOp::RealDiv);
            assert!(matches!(lhs.kind, ExprKind::Expression(_)));
            assert!(matches!(rhs.kind, ExprKind::Expression(_)));
        },
        other => panic!("expected operation, got {:?}", other),
    }
}

#[test]
fn test_store_literal() {
    let expr = parse_ok("(42 MEM)");
    match body(&expr) {
        ExprKind::StoreMem { value, name } => {
            assert_eq!(name, "MEM");
            assert_eq!(value.kind, ExprKind::Number("42".into()));
        },
        other => panic!("expected store, got {:?}", other),
    }
}

#[test]
fn test_store_expression() {
    let expr = parse_ok("((2 3 +) MEM)");
    match body(&expr) {
        ExprKind::StoreMem { value, name } => {
            assert_eq!(name, "MEM");
            assert!(matches!(value.kind, ExprKind::Expression(_)));
        },
        other => panic!("expected store, got {:?}", other),
    }
}

#[test]
fn test_recall() {
    let expr = parse_ok("(MEM)");
    assert_eq!(*body(&expr), ExprKind::RecallMem("MEM".into()));
}

#[test]
fn test_res() {
    let expr = parse_ok("(2 RES)");
    assert_eq!(*body(&expr), ExprKind::Res("2".into()));
}

#[test]
fn test_comparison() {
    let expr = parse_ok("(1 2 <)");
    match body(&expr) {
        ExprKind::Comparison { op, .. } => assert_eq!(*op, RelOp::Lt),
        other => panic!("expected comparison, got {:?}", other),
    }
}

#[test]
fn test_bare_literal_expression() {
    let expr = parse_ok("(5)");
    assert_eq!(*body(&expr), ExprKind::Number("5".into()));
}

// ==================== CONTROL STRUCTURES ====================

#[test]
fn test_if_shape() {
    // AST shape pinned by the end-to-end contract
    let expr = parse_ok("((5 10 >) ((5)) ((10)) IF)");
    match body(&expr) {
        ExprKind::If {
            condition,
            then_block,
            else_block,
        } => {
            match &condition.kind {
                ExprKind::Condition { op, lhs, rhs } => {
                    assert_eq!(*op, RelOp::Gt);
                    assert_eq!(lhs.kind, ExprKind::Number("5".into()));
                    assert_eq!(rhs.kind, ExprKind::Number("10".into()));
                },
                other => panic!("expected condition, got {:?}", other),
            }
            for block in [then_block, else_block] {
                match &block.kind {
                    ExprKind::CompoundBlock(exprs) => {
                        assert_eq!(exprs.len(), 1);
                        assert!(matches!(exprs[0].kind, ExprKind::Expression(_)));
                    },
                    other => panic!("expected compound block, got {:?}", other),
                }
            }
        },
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_if_simple_operand_condition() {
    let expr = parse_ok("(5 10 > ((1)) ((2)) IF)");
    assert!(matches!(body(&expr), ExprKind::If { .. }));
}

#[test]
fn test_while_with_store_body() {
    let expr = parse_ok("(X 0 > ((X 1 -) X) WHILE)");
    match body(&expr) {
        ExprKind::While { condition, body } => {
            assert!(matches!(condition.kind, ExprKind::Condition { .. }));
            match &body.kind {
                ExprKind::Expression(inner) => match &inner.kind {
                    ExprKind::StoreMem { name, value } => {
                        assert_eq!(name, "X");
                        assert!(matches!(value.kind, ExprKind::Expression(_)));
                    },
                    other => panic!("expected store body, got {:?}", other),
                },
                other => panic!("expected expression body, got {:?}", other),
            }
        },
        other => panic!("expected while, got {:?}", other),
    }
}

#[test]
fn test_compound_block_multiple_expressions() {
    let expr = parse_ok("(X 0 > ((1 A) (2 B)) WHILE)");
    match body(&expr) {
        ExprKind::While { body, .. } => match &body.kind {
            ExprKind::CompoundBlock(exprs) => assert_eq!(exprs.len(), 2),
            other => panic!("expected compound block, got {:?}", other),
        },
        other => panic!("expected while, got {:?}", other),
    }
}

#[test]
fn test_block_with_nested_operands() {
    // single body whose operands are both nested expressions
    let expr = parse_ok("(X 0 > ((A) (B) +) WHILE)");
    match body(&expr) {
        ExprKind::While { body, .. } => match &body.kind {
            ExprKind::Expression(inner) => {
                assert!(matches!(inner.kind, ExprKind::Operation { .. }))
            },
            other => panic!("expected expression body, got {:?}", other),
        },
        other => panic!("expected while, got {:?}", other),
    }
}

// ==================== DETERMINISM ====================

#[test]
fn test_parse_determinism() {
    for source in [
        "(3 5 +)",
        "((2 3 *) (4 2 /) /)",
        "(42 MEM)",
        "((5 10 >) ((5)) ((10)) IF)",
        "(X 0 > ((X 1 -) X) WHILE)",
    ] {
        let first = parse_ok(source);
        let second = parse_ok(source);
        assert_eq!(first, second, "parse not deterministic for {}", source);
    }
}

// ==================== ERROR CASES ====================

#[test]
fn test_err_empty_token_stream() {
    parse_err("");
}

#[test]
fn test_err_unbalanced_parens() {
    parse_err("(3 5 +");
}

#[test]
fn test_err_missing_operator() {
    parse_err("(3 5 7)");
}

#[test]
fn test_err_trailing_tokens() {
    parse_err("(3 5 +) 7");
}

#[test]
fn test_err_if_missing_keyword() {
    parse_err("(5 10 > ((1)) ((2)))");
}

#[test]
fn test_err_while_after_two_blocks() {
    parse_err("(5 10 > ((1)) ((2)) WHILE)");
}

#[test]
fn test_err_bare_reserved_in_operand() {
    parse_err("(IF 5 +)");
}

#[test]
fn test_err_operator_first() {
    parse_err("(+ 3 5)");
}
