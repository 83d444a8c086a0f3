//! TAC optimization passes.
//!
//! Three pure passes, pipelined in a fixed order:
//!
//! 1. constant folding - `t = 2 + 3` becomes `t = 5`
//! 2. constant propagation - known literals substitute into later operands,
//!    retrying the fold on the rewritten instruction
//! 3. dead-code elimination - unused temporary definitions are dropped
//!
//! Propagation walks forward and drops every known mapping at a label;
//! correctness over precision, since any branch may land there. Division
//! and remainder by zero never fold - the instruction is kept verbatim.
//! Writes to user-visible memories are never removed, and neither are the
//! temporaries holding per-line results (RES reads them on later lines).

use std::fmt;
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::tac::{const_value, is_const, is_temp, Instr, TacOp};

/// Which passes to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptLevel {
    /// Constant folding only
    Folding,
    /// Constant propagation only
    Propagation,
    /// Dead-code elimination only
    DeadCode,
    /// All three passes in order
    #[default]
    Full,
}

impl OptLevel {
    fn runs_folding(self) -> bool {
        matches!(self, OptLevel::Folding | OptLevel::Full)
    }

    fn runs_propagation(self) -> bool {
        matches!(self, OptLevel::Propagation | OptLevel::Full)
    }

    fn runs_dead_code(self) -> bool {
        matches!(self, OptLevel::DeadCode | OptLevel::Full)
    }
}

impl FromStr for OptLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folding" => Ok(OptLevel::Folding),
            "propagation" => Ok(OptLevel::Propagation),
            "dead_code" => Ok(OptLevel::DeadCode),
            "completo" => Ok(OptLevel::Full),
            other => Err(format!(
                "unknown optimization level '{}' (expected folding, propagation, dead_code or completo)",
                other
            )),
        }
    }
}

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptLevel::Folding => write!(f, "folding"),
            OptLevel::Propagation => write!(f, "propagation"),
            OptLevel::DeadCode => write!(f, "dead_code"),
            OptLevel::Full => write!(f, "completo"),
        }
    }
}

/// Counters reported after optimization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Operations replaced by assignments in the folding pass
    pub folds: usize,
    /// Operand substitutions performed by propagation
    pub propagations: usize,
    /// Instructions removed by dead-code elimination
    pub removed: usize,
}

/// TAC optimizer; records statistics across one `optimize` call.
pub struct Optimizer {
    stats: OptStats,
}

impl Optimizer {
    pub fn new() -> Self {
        Self {
            stats: OptStats::default(),
        }
    }

    /// Statistics of the most recent `optimize` call.
    pub fn stats(&self) -> OptStats {
        self.stats
    }

    /// Runs the selected passes over the instruction list.
    ///
    /// `roots` names temporaries that must survive dead-code elimination
    /// even when nothing reads them yet: the per-line results that a later
    /// `(N RES)` may still reference.
    pub fn optimize(
        &mut self,
        instrs: Vec<Instr>,
        level: OptLevel,
        roots: &FxHashSet<String>,
    ) -> Vec<Instr> {
        self.stats = OptStats::default();

        let mut result = instrs;
        if level.runs_folding() {
            result = self.fold(result);
        }
        if level.runs_propagation() {
            result = self.propagate(result);
        }
        if level.runs_dead_code() {
            result = self.dead_code(result, roots);
        }
        result
    }

    // =========================================================================
    // PASS 1: CONSTANT FOLDING
    // =========================================================================

    fn fold(&mut self, instrs: Vec<Instr>) -> Vec<Instr> {
        instrs
            .into_iter()
            .map(|instr| match instr {
                Instr::Op {
                    ref dst,
                    ref lhs,
                    op,
                    ref rhs,
                } => {
                    let folded = match (const_value(lhs), const_value(rhs)) {
                        (Some(l), Some(r)) => eval(l, op, r),
                        _ => None,
                    };
                    match folded {
                        Some(value) => {
                            self.stats.folds += 1;
                            Instr::Assign {
                                dst: dst.clone(),
                                src: format_number(value),
                            }
                        },
                        // operands not literal, or undefined at compile
                        // time (e.g. division by zero): keep the original
                        None => instr,
                    }
                },
                other => other,
            })
            .collect()
    }

    // =========================================================================
    // PASS 2: CONSTANT PROPAGATION
    // =========================================================================

    fn propagate(&mut self, instrs: Vec<Instr>) -> Vec<Instr> {
        let mut known: FxHashMap<String, String> = FxHashMap::default();

        instrs
            .into_iter()
            .map(|instr| match instr {
                // any branch may land on a label; forget everything
                Instr::Label(_) => {
                    known.clear();
                    instr
                },

                Instr::Goto(_) => instr,

                Instr::Assign { dst, src } => {
                    if is_const(&src) {
                        known.insert(dst.clone(), src.clone());
                    } else {
                        known.remove(&dst);
                    }
                    Instr::Assign { dst, src }
                },

                Instr::Copy { dst, src } => {
                    let src = self.substitute(src, &known);
                    if is_const(&src) {
                        known.insert(dst.clone(), src.clone());
                    } else {
                        known.remove(&dst);
                    }
                    Instr::Copy { dst, src }
                },

                Instr::Op { dst, lhs, op, rhs } => {
                    let lhs = self.substitute(lhs, &known);
                    let rhs = self.substitute(rhs, &known);

                    // retry the fold on the rewritten instruction
                    if let (Some(l), Some(r)) = (const_value(&lhs), const_value(&rhs)) {
                        if let Some(value) = eval(l, op, r) {
                            let src = format_number(value);
                            known.insert(dst.clone(), src.clone());
                            return Instr::Assign { dst, src };
                        }
                    }

                    known.remove(&dst);
                    Instr::Op { dst, lhs, op, rhs }
                },

                Instr::IfFalse { cond, label } => {
                    let cond = self.substitute(cond, &known);
                    Instr::IfFalse { cond, label }
                },
            })
            .collect()
    }

    fn substitute(&mut self, operand: String, known: &FxHashMap<String, String>) -> String {
        match known.get(&operand) {
            Some(literal) => {
                self.stats.propagations += 1;
                literal.clone()
            },
            None => operand,
        }
    }

    // =========================================================================
    // PASS 3: DEAD-CODE ELIMINATION
    // =========================================================================

    fn dead_code(&mut self, instrs: Vec<Instr>, roots: &FxHashSet<String>) -> Vec<Instr> {
        let mut uses: FxHashMap<&str, usize> = FxHashMap::default();
        for instr in &instrs {
            for operand in instr.operands() {
                if !is_const(operand) {
                    *uses.entry(operand).or_insert(0) += 1;
                }
            }
        }

        let dead: Vec<bool> = instrs
            .iter()
            .map(|instr| {
                if instr.is_control() {
                    return false;
                }
                match instr.dst() {
                    Some(dst) => {
                        is_temp(dst) && !roots.contains(dst) && !uses.contains_key(dst)
                    },
                    None => false,
                }
            })
            .collect();

        self.stats.removed = dead.iter().filter(|&&d| d).count();

        instrs
            .into_iter()
            .zip(dead)
            .filter_map(|(instr, dead)| (!dead).then_some(instr))
            .collect()
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates a TAC operator over literal operands.
///
/// Returns `None` when the result is undefined at compile time: division
/// or remainder by zero, or a non-finite power. `/` truncates toward zero
/// to match integer division; typing guarantees its operands are ints.
/// Relational operators produce `1` or `0`.
pub fn eval(lhs: f64, op: TacOp, rhs: f64) -> Option<f64> {
    let value = match op {
        TacOp::Add => lhs + rhs,
        TacOp::Sub => lhs - rhs,
        TacOp::Mul => lhs * rhs,
        TacOp::IntDiv => {
            if rhs == 0.0 {
                return None;
            }
            (lhs / rhs).trunc()
        },
        TacOp::Rem => {
            if rhs == 0.0 {
                return None;
            }
            lhs % rhs
        },
        TacOp::RealDiv => {
            if rhs == 0.0 {
                return None;
            }
            lhs / rhs
        },
        TacOp::Pow => lhs.powf(rhs),
        TacOp::Gt => bool_value(lhs > rhs),
        TacOp::Lt => bool_value(lhs < rhs),
        TacOp::Ge => bool_value(lhs >= rhs),
        TacOp::Le => bool_value(lhs <= rhs),
        TacOp::Eq => bool_value(lhs == rhs),
        TacOp::Ne => bool_value(lhs != rhs),
    };
    value.is_finite().then_some(value)
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Formats a folded value, keeping integral results integer-shaped.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
