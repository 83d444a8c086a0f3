//! Edge case tests for rpnc-tac

use rustc_hash::FxHashSet;

use crate::{eval, format_number, Instr, OptLevel, Optimizer, TacGen, TacOp};
use rpnc_lex::Lexer;
use rpnc_par::Parser;
use rpnc_sem::{analyze, SymbolTable};
use rpnc_util::Handler;

/// Compiles a program through the front end and lowers every line.
fn lower_program(lines: &[&str]) -> TacGen {
    let handler = Handler::new();
    let mut table = SymbolTable::new();
    let mut gen = TacGen::new();
    for (idx, source) in lines.iter().enumerate() {
        let line = idx as u32 + 1;
        let tokens: Vec<_> = Lexer::new(source, line, &handler).collect();
        let expr = Parser::new(tokens, line, &handler)
            .parse()
            .expect("test source must parse");
        let typed = analyze(&expr, &mut table, &handler)
            .unwrap_or_else(|| panic!("analysis failed: {:?}", handler.diagnostics()));
        gen.lower_line(&typed).expect("lowering must succeed");
        table.record_result(typed.ty, typed.literal_value());
    }
    gen
}

fn tac_text(instrs: &[Instr]) -> Vec<String> {
    instrs.iter().map(Instr::to_string).collect()
}

fn roots_of(gen: &TacGen) -> FxHashSet<String> {
    gen.result_history()
        .iter()
        .flatten()
        .filter(|name| crate::is_temp(name))
        .cloned()
        .collect()
}

fn optimize_full(gen: TacGen) -> (Vec<Instr>, crate::OptStats) {
    let roots = roots_of(&gen);
    let mut optimizer = Optimizer::new();
    let out = optimizer.optimize(gen.into_instrs(), OptLevel::Full, &roots);
    (out, optimizer.stats())
}

// ==================== LOWERING ====================

#[test]
fn test_lower_simple_operation() {
    let gen = lower_program(&["(3 5 +)"]);
    assert_eq!(tac_text(gen.instrs()), vec!["t0 = 3", "t1 = 5", "t2 = t0 + t1"]);
    assert_eq!(gen.result_history(), &[Some("t2".to_string())]);
}

#[test]
fn test_lower_real_division() {
    let gen = lower_program(&["(10 2 |)"]);
    assert_eq!(
        tac_text(gen.instrs()),
        vec!["t0 = 10", "t1 = 2", "t2 = t0 | t1"]
    );
}

#[test]
fn test_lower_store_and_recall() {
    let gen = lower_program(&["(42 MEM)", "(MEM)"]);
    assert_eq!(
        tac_text(gen.instrs()),
        vec!["t0 = 42", "MEM = t0", "t1 = MEM"]
    );
}

#[test]
fn test_lower_res_copies_previous_result() {
    let gen = lower_program(&["(42 MEM)", "(1 RES)"]);
    // the store's line result is the memory name itself
    assert_eq!(
        tac_text(gen.instrs()),
        vec!["t0 = 42", "MEM = t0", "t1 = MEM"]
    );
    assert_eq!(
        gen.result_history(),
        &[Some("MEM".to_string()), Some("t1".to_string())]
    );
}

#[test]
fn test_counters_never_reset_between_lines() {
    let gen = lower_program(&["(3 5 +)", "(1 2 +)"]);
    assert_eq!(
        tac_text(gen.instrs()),
        vec![
            "t0 = 3",
            "t1 = 5",
            "t2 = t0 + t1",
            "t3 = 1",
            "t4 = 2",
            "t5 = t3 + t4",
        ]
    );
    assert_eq!(gen.temp_count(), 6);
}

#[test]
fn test_lower_if_shape() {
    let gen = lower_program(&["((5 10 >) ((5)) ((10)) IF)"]);
    let text = tac_text(gen.instrs());
    assert_eq!(
        text,
        vec![
            "t0 = 5",
            "t1 = 10",
            "t2 = t0 > t1",
            "ifFalse t2 goto L0",
            "t3 = 5",
            "goto L1",
            "L0:",
            "t4 = 10",
            "L1:",
        ]
    );
    // exactly one IfFalse, one Goto, two Labels
    let instrs = gen.instrs();
    assert_eq!(
        instrs
            .iter()
            .filter(|i| matches!(i, Instr::IfFalse { .. }))
            .count(),
        1
    );
    assert_eq!(
        instrs.iter().filter(|i| matches!(i, Instr::Goto(_))).count(),
        1
    );
    assert_eq!(
        instrs
            .iter()
            .filter(|i| matches!(i, Instr::Label(_)))
            .count(),
        2
    );
}

#[test]
fn test_lower_while_shape() {
    let gen = lower_program(&["(10 X)", "(X 0 > ((X 1 -) X) WHILE)"]);
    assert_eq!(
        tac_text(gen.instrs()),
        vec![
            "t0 = 10",
            "X = t0",
            "L0:",
            "t1 = 0",
            "t2 = X > t1",
            "ifFalse t2 goto L1",
            "t3 = 1",
            "t4 = X - t3",
            "X = t4",
            "goto L0",
            "L1:",
        ]
    );
}

// ==================== FOLDING ====================

#[test]
fn test_fold_integer_addition() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![Instr::Op {
        dst: "t0".into(),
        lhs: "2".into(),
        op: TacOp::Add,
        rhs: "3".into(),
    }];
    let out = optimizer.optimize(instrs, OptLevel::Folding, &FxHashSet::default());
    assert_eq!(tac_text(&out), vec!["t0 = 5"]);
    assert_eq!(optimizer.stats().folds, 1);
}

#[test]
fn test_fold_preserves_integer_shape() {
    assert_eq!(format_number(5.0), "5");
    assert_eq!(format_number(3.5), "3.5");
    assert_eq!(format_number(-4.0), "-4");
}

#[test]
fn test_fold_division_by_zero_kept() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![
        Instr::Op {
            dst: "t0".into(),
            lhs: "1".into(),
            op: TacOp::IntDiv,
            rhs: "0".into(),
        },
        Instr::Op {
            dst: "t1".into(),
            lhs: "1".into(),
            op: TacOp::Rem,
            rhs: "0".into(),
        },
    ];
    let out = optimizer.optimize(instrs.clone(), OptLevel::Folding, &FxHashSet::default());
    assert_eq!(out, instrs);
    assert_eq!(optimizer.stats().folds, 0);
}

#[test]
fn test_fold_relational_to_zero_one() {
    assert_eq!(eval(5.0, TacOp::Gt, 10.0), Some(0.0));
    assert_eq!(eval(5.0, TacOp::Le, 10.0), Some(1.0));
    assert_eq!(eval(5.0, TacOp::Eq, 5.0), Some(1.0));
    assert_eq!(eval(5.0, TacOp::Ne, 5.0), Some(0.0));
}

#[test]
fn test_eval_integer_division_truncates() {
    assert_eq!(eval(7.0, TacOp::IntDiv, 2.0), Some(3.0));
    assert_eq!(eval(-7.0, TacOp::IntDiv, 2.0), Some(-3.0));
    assert_eq!(eval(7.0, TacOp::Rem, 2.0), Some(1.0));
    assert_eq!(eval(10.0, TacOp::RealDiv, 4.0), Some(2.5));
    assert_eq!(eval(2.0, TacOp::Pow, 10.0), Some(1024.0));
}

// ==================== PROPAGATION ====================

#[test]
fn test_propagation_substitutes_and_refolds() {
    // E2E contract: (3 5 +) optimizes to the single root assignment
    let gen = lower_program(&["(3 5 +)"]);
    let (out, stats) = optimize_full(gen);
    assert_eq!(tac_text(&out), vec!["t2 = 8"]);
    assert!(stats.propagations >= 2);
    assert_eq!(stats.removed, 2);
}

#[test]
fn test_propagation_forgets_at_labels() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![
        Instr::Assign {
            dst: "t0".into(),
            src: "1".into(),
        },
        Instr::Label("L0".into()),
        Instr::Op {
            dst: "t1".into(),
            lhs: "t0".into(),
            op: TacOp::Add,
            rhs: "1".into(),
        },
    ];
    let out = optimizer.optimize(instrs, OptLevel::Propagation, &FxHashSet::default());
    // t0 is not substituted after the label
    assert_eq!(tac_text(&out)[2], "t1 = t0 + 1");
    assert_eq!(optimizer.stats().propagations, 0);
}

#[test]
fn test_propagation_through_copy() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![
        Instr::Assign {
            dst: "t0".into(),
            src: "7".into(),
        },
        Instr::Copy {
            dst: "X".into(),
            src: "t0".into(),
        },
        Instr::Copy {
            dst: "t1".into(),
            src: "X".into(),
        },
    ];
    let out = optimizer.optimize(instrs, OptLevel::Propagation, &FxHashSet::default());
    assert_eq!(tac_text(&out), vec!["t0 = 7", "X = 7", "t1 = 7"]);
}

#[test]
fn test_propagation_into_iffalse() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![
        Instr::Assign {
            dst: "t0".into(),
            src: "0".into(),
        },
        Instr::IfFalse {
            cond: "t0".into(),
            label: "L0".into(),
        },
        Instr::Label("L0".into()),
    ];
    let out = optimizer.optimize(instrs, OptLevel::Propagation, &FxHashSet::default());
    assert_eq!(tac_text(&out)[1], "ifFalse 0 goto L0");
}

// ==================== DEAD CODE ====================

#[test]
fn test_dead_code_keeps_memory_writes() {
    // E2E contract: the store to X survives even when X is only read at
    // the loop head
    let gen = lower_program(&["(10 X)", "(X 0 > ((X 1 -) X) WHILE)"]);
    let (out, _) = optimize_full(gen);
    assert!(
        out.iter()
            .any(|i| matches!(i, Instr::Copy { dst, .. } if dst == "X")),
        "store to X must survive: {:?}",
        tac_text(&out)
    );
}

#[test]
fn test_dead_code_removes_only_unused_temps() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![
        Instr::Assign {
            dst: "t0".into(),
            src: "1".into(),
        },
        Instr::Assign {
            dst: "t1".into(),
            src: "2".into(),
        },
        Instr::Copy {
            dst: "X".into(),
            src: "t1".into(),
        },
    ];
    let out = optimizer.optimize(instrs, OptLevel::DeadCode, &FxHashSet::default());
    assert_eq!(tac_text(&out), vec!["t1 = 2", "X = t1"]);
    assert_eq!(optimizer.stats().removed, 1);
}

#[test]
fn test_dead_code_respects_roots() {
    let mut optimizer = Optimizer::new();
    let instrs = vec![Instr::Assign {
        dst: "t0".into(),
        src: "8".into(),
    }];
    let roots: FxHashSet<String> = [String::from("t0")].into_iter().collect();
    let out = optimizer.optimize(instrs, OptLevel::DeadCode, &roots);
    assert_eq!(tac_text(&out), vec!["t0 = 8"]);
    assert_eq!(optimizer.stats().removed, 0);
}

#[test]
fn test_dead_code_safety_invariant() {
    // every removed instruction writes a temporary absent from survivors
    let gen = lower_program(&[
        "(3 5 +)",
        "(42 MEM)",
        "((MEM) (1 RES) *)",
        "((5 10 >) ((5)) ((10)) IF)",
    ]);
    let roots = roots_of(&gen);
    let original = gen.into_instrs();
    let mut optimizer = Optimizer::new();
    let optimized = optimizer.optimize(original.clone(), OptLevel::Full, &roots);

    let surviving_operands: FxHashSet<&str> = optimized
        .iter()
        .flat_map(|i| i.operands())
        .filter(|o| !crate::is_const(o))
        .collect();
    let surviving_dsts: FxHashSet<&str> =
        optimized.iter().filter_map(|i| i.dst()).collect();

    for instr in &original {
        if let Some(dst) = instr.dst() {
            if crate::is_temp(dst) && !surviving_dsts.contains(dst) {
                assert!(
                    !surviving_operands.contains(dst),
                    "removed temp {} still used in optimized code",
                    dst
                );
            }
        }
    }
}

#[test]
fn test_label_uniqueness_after_optimization() {
    let gen = lower_program(&[
        "((5 10 >) ((5)) ((10)) IF)",
        "(10 X)",
        "(X 0 > ((X 1 -) X) WHILE)",
    ]);
    let (out, _) = optimize_full(gen);
    let labels: Vec<&str> = out
        .iter()
        .filter_map(|i| match i {
            Instr::Label(name) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    let unique: FxHashSet<&str> = labels.iter().copied().collect();
    assert_eq!(labels.len(), unique.len(), "duplicate labels: {:?}", labels);
}

// ==================== LEVELS ====================

#[test]
fn test_level_parsing() {
    assert_eq!("folding".parse::<OptLevel>(), Ok(OptLevel::Folding));
    assert_eq!("propagation".parse::<OptLevel>(), Ok(OptLevel::Propagation));
    assert_eq!("dead_code".parse::<OptLevel>(), Ok(OptLevel::DeadCode));
    assert_eq!("completo".parse::<OptLevel>(), Ok(OptLevel::Full));
    assert!("aggressive".parse::<OptLevel>().is_err());
}

#[test]
fn test_folding_level_does_not_propagate() {
    let gen = lower_program(&["(3 5 +)"]);
    let roots = roots_of(&gen);
    let mut optimizer = Optimizer::new();
    let out = optimizer.optimize(gen.into_instrs(), OptLevel::Folding, &roots);
    // operands are temporaries, so pure folding changes nothing
    assert_eq!(
        tac_text(&out),
        vec!["t0 = 3", "t1 = 5", "t2 = t0 + t1"]
    );
}
