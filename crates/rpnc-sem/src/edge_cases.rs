//! Edge case tests for rpnc-sem

use crate::{analyze, SymbolTable, Type, TypedExpr, TypedKind};
use rpnc_lex::Lexer;
use rpnc_par::Parser;
use rpnc_util::{ErrorKind, Handler, Level};

fn parse(source: &str, line: u32, handler: &Handler) -> rpnc_par::Expr {
    let tokens: Vec<_> = Lexer::new(source, line, handler).collect();
    Parser::new(tokens, line, handler)
        .parse()
        .expect("test source must parse")
}

/// Analyzes a sequence of lines against one shared table, returning the
/// typed tree of the last line.
fn analyze_program(lines: &[&str]) -> (Option<TypedExpr>, SymbolTable, Handler) {
    let handler = Handler::new();
    let mut table = SymbolTable::new();
    let mut last = None;
    for (idx, source) in lines.iter().enumerate() {
        let expr = parse(source, idx as u32 + 1, &handler);
        last = analyze(&expr, &mut table, &handler);
        if let Some(typed) = &last {
            table.record_result(typed.ty, typed.literal_value());
        }
    }
    (last, table, handler)
}

fn type_of(lines: &[&str]) -> Type {
    let (typed, _, handler) = analyze_program(lines);
    assert!(
        !handler.has_errors(),
        "unexpected errors: {:?}",
        handler.diagnostics()
    );
    typed.expect("analysis must succeed").ty
}

fn first_error(lines: &[&str]) -> ErrorKind {
    let (_, _, handler) = analyze_program(lines);
    let diags = handler.diagnostics();
    diags
        .iter()
        .find(|d| d.level == Level::Error)
        .unwrap_or_else(|| panic!("expected an error, got {:?}", diags))
        .kind
}

// ==================== TYPING RULES ====================

#[test]
fn test_int_literal() {
    assert_eq!(type_of(&["(5)"]), Type::Int);
}

#[test]
fn test_real_literal() {
    assert_eq!(type_of(&["(3.14)"]), Type::Real);
}

#[test]
fn test_promotion_in_addition() {
    assert_eq!(type_of(&["(3 5 +)"]), Type::Int);
    assert_eq!(type_of(&["(3.0 5 +)"]), Type::Real);
    assert_eq!(type_of(&["(3 5.0 -)"]), Type::Real);
    assert_eq!(type_of(&["(3.5 5.5 *)"]), Type::Real);
}

#[test]
fn test_real_division_always_real() {
    assert_eq!(type_of(&["(10 2 |)"]), Type::Real);
}

#[test]
fn test_int_division_requires_ints() {
    assert_eq!(type_of(&["(10 2 /)"]), Type::Int);
    assert_eq!(first_error(&["(10.0 2 /)"]), ErrorKind::Type);
    assert_eq!(first_error(&["(10 2.0 %)"]), ErrorKind::Type);
}

#[test]
fn test_power_requires_int_exponent() {
    assert_eq!(type_of(&["(2 3 ^)"]), Type::Int);
    assert_eq!(type_of(&["(2.5 3 ^)"]), Type::Real);
    assert_eq!(first_error(&["(2 3.5 ^)"]), ErrorKind::Type);
}

#[test]
fn test_comparison_is_bool() {
    assert_eq!(type_of(&["(1 2 <)"]), Type::Bool);
    assert_eq!(type_of(&["(1.5 2 ==)"]), Type::Bool);
}

#[test]
fn test_nested_operation_types() {
    assert_eq!(type_of(&["((2 3 *) (4 2 /) +)"]), Type::Int);
    assert_eq!(type_of(&["((2 3 *) (4 2 |) +)"]), Type::Real);
}

// ==================== MEMORY ====================

#[test]
fn test_store_declares_and_initializes() {
    let (_, table, handler) = analyze_program(&["(42 MEM)"]);
    assert!(!handler.has_errors());
    let symbol = table.get("MEM").unwrap();
    assert_eq!(symbol.ty, Type::Int);
    assert!(symbol.initialized);
    assert_eq!(symbol.value, Some(42.0));
}

#[test]
fn test_store_then_recall() {
    assert_eq!(type_of(&["(42 MEM)", "(MEM)"]), Type::Int);
    assert_eq!(type_of(&["(2.5 MEM)", "(MEM)"]), Type::Real);
}

#[test]
fn test_recall_undeclared_is_memory_error() {
    assert_eq!(first_error(&["(MEM)"]), ErrorKind::Memory);
}

#[test]
fn test_operand_undeclared_is_memory_error() {
    assert_eq!(first_error(&["(X 1 +)"]), ErrorKind::Memory);
}

#[test]
fn test_store_then_recall_same_line() {
    assert_eq!(type_of(&["((42 MEM) (MEM) +)"]), Type::Int);
}

#[test]
fn test_recall_before_store_same_line_fails() {
    assert_eq!(first_error(&["((MEM) (42 MEM) +)"]), ErrorKind::Memory);
}

#[test]
fn test_store_restore_changes_type() {
    assert_eq!(type_of(&["(1 X)", "(2.5 X)", "(X)"]), Type::Real);
}

#[test]
fn test_failed_line_does_not_declare() {
    // line 1 fails on the undeclared Y; its store to X must not happen
    let (_, table, _) = analyze_program(&["((Y 1 +) X)"]);
    assert!(!table.exists("X"));
}

// ==================== RES ====================

#[test]
fn test_res_takes_type_from_history() {
    assert_eq!(type_of(&["(3 5 +)", "(1 RES)"]), Type::Int);
    assert_eq!(type_of(&["(10 2 |)", "(1 RES)"]), Type::Real);
    assert_eq!(type_of(&["(10 2 |)", "(3 5 +)", "(2 RES)"]), Type::Real);
}

#[test]
fn test_res_out_of_range() {
    assert_eq!(first_error(&["(1 RES)"]), ErrorKind::Memory);
    assert_eq!(first_error(&["(3 5 +)", "(2 RES)"]), ErrorKind::Memory);
}

#[test]
fn test_res_zero_rejected() {
    assert_eq!(first_error(&["(3 5 +)", "(0 RES)"]), ErrorKind::Memory);
}

#[test]
fn test_res_non_integer_rejected() {
    assert_eq!(first_error(&["(3 5 +)", "(1.5 RES)"]), ErrorKind::Memory);
}

#[test]
fn test_res_index_resolved_in_tree() {
    let (typed, _, _) = analyze_program(&["(3 5 +)", "(1 RES)"]);
    let typed = typed.unwrap();
    match &typed.kind {
        TypedKind::Expression(inner) => assert_eq!(inner.kind, TypedKind::Res(1)),
        other => panic!("expected expression, got {:?}", other),
    }
}

// ==================== CONTROL ====================

#[test]
fn test_if_types_from_then_branch() {
    assert_eq!(type_of(&["((5 10 >) ((5)) ((10)) IF)"]), Type::Int);
}

#[test]
fn test_if_branch_type_mismatch_warns() {
    let (typed, _, handler) = analyze_program(&["((5 10 >) ((5)) ((10.0)) IF)"]);
    assert!(typed.is_some(), "warning must not fail the line");
    assert!(!handler.has_errors());
    assert_eq!(handler.warning_count(), 1);
}

#[test]
fn test_while_types_from_body() {
    assert_eq!(
        type_of(&["(10 X)", "(X 0 > ((X 1 -) X) WHILE)"]),
        Type::Int
    );
}

#[test]
fn test_condition_operand_must_be_numeric() {
    // (1 2 >) is bool, so the outer guard compares bool with int
    assert_eq!(
        first_error(&["((1 2 >) 1 > ((1)) ((2)) IF)"]),
        ErrorKind::Control
    );
}

// ==================== PROPERTY: TYPE SOUNDNESS ====================

/// No operand of an operation is Err-typed in a tree that analyzed clean.
fn assert_no_err_operand(expr: &TypedExpr) {
    match &expr.kind {
        TypedKind::Operation { lhs, rhs, .. }
        | TypedKind::Condition { lhs, rhs, .. }
        | TypedKind::Comparison { lhs, rhs, .. } => {
            assert_ne!(lhs.ty, Type::Err);
            assert_ne!(rhs.ty, Type::Err);
            assert_no_err_operand(lhs);
            assert_no_err_operand(rhs);
        },
        TypedKind::Expression(inner) => assert_no_err_operand(inner),
        TypedKind::StoreMem { value, .. } => assert_no_err_operand(value),
        TypedKind::If {
            condition,
            then_block,
            else_block,
        } => {
            assert_no_err_operand(condition);
            assert_no_err_operand(then_block);
            assert_no_err_operand(else_block);
        },
        TypedKind::While { condition, body } => {
            assert_no_err_operand(condition);
            assert_no_err_operand(body);
        },
        TypedKind::CompoundBlock(exprs) => exprs.iter().for_each(assert_no_err_operand),
        _ => {},
    }
}

#[test]
fn test_type_soundness_on_valid_programs() {
    let programs: &[&[&str]] = &[
        &["(3 5 +)"],
        &["(42 MEM)", "((MEM) (MEM) *)"],
        &["(3 5 +)", "(1 RES)"],
        &["(10 X)", "(X 0 > ((X 1 -) X) WHILE)"],
        &["((5 10 >) ((5)) ((10)) IF)"],
    ];
    for lines in programs {
        let (typed, _, handler) = analyze_program(lines);
        assert!(!handler.has_errors(), "program {:?} must analyze", lines);
        assert_no_err_operand(&typed.unwrap());
    }
}
