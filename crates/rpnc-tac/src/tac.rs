//! Three-address code instruction model.
//!
//! One flat instruction list per compilation, in source order. Operands
//! are plain strings: numeric literals, compiler temporaries (`t0, t1,
//! ...`) or user memory names. The `Display` impl renders the stable text
//! format that tests and the `--emit-tac` listing rely on:
//!
//! ```text
//! t = v                 # Assign / Copy
//! t = a OP b            # Op
//! L:                    # Label
//! goto L                # Goto
//! ifFalse c goto L      # IfFalse
//! ```

use std::fmt;

use rpnc_lex::{ArithOp, RelOp};

/// Operator of a TAC `Op` instruction: arithmetic or relational.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TacOp {
    Add,
    Sub,
    Mul,
    IntDiv,
    Rem,
    Pow,
    RealDiv,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl TacOp {
    /// Whether this is one of the six relational operators.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            TacOp::Gt | TacOp::Lt | TacOp::Ge | TacOp::Le | TacOp::Eq | TacOp::Ne
        )
    }

    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            TacOp::Add => "+",
            TacOp::Sub => "-",
            TacOp::Mul => "*",
            TacOp::IntDiv => "/",
            TacOp::Rem => "%",
            TacOp::Pow => "^",
            TacOp::RealDiv => "|",
            TacOp::Gt => ">",
            TacOp::Lt => "<",
            TacOp::Ge => ">=",
            TacOp::Le => "<=",
            TacOp::Eq => "==",
            TacOp::Ne => "!=",
        }
    }
}

impl From<ArithOp> for TacOp {
    fn from(op: ArithOp) -> Self {
        match op {
            ArithOp::Add => TacOp::Add,
            ArithOp::Sub => TacOp::Sub,
            ArithOp::Mul => TacOp::Mul,
            ArithOp::IntDiv => TacOp::IntDiv,
            ArithOp::Rem => TacOp::Rem,
            ArithOp::Pow => TacOp::Pow,
            ArithOp::RealDiv => TacOp::RealDiv,
        }
    }
}

impl From<RelOp> for TacOp {
    fn from(op: RelOp) -> Self {
        match op {
            RelOp::Gt => TacOp::Gt,
            RelOp::Lt => TacOp::Lt,
            RelOp::Ge => TacOp::Ge,
            RelOp::Le => TacOp::Le,
            RelOp::Eq => TacOp::Eq,
            RelOp::Ne => TacOp::Ne,
        }
    }
}

impl fmt::Display for TacOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A three-address instruction.
///
/// `Copy` has the same runtime shape as `Assign`; the distinction records
/// intent (memory traffic vs. literal materialization) and is kept because
/// the optimizer treats their sources differently.
#[derive(Clone, Debug, PartialEq)]
pub enum Instr {
    /// `dst = src` where src is a literal
    Assign { dst: String, src: String },
    /// `dst = lhs op rhs`
    Op {
        dst: String,
        lhs: String,
        op: TacOp,
        rhs: String,
    },
    /// `dst = src` where src is a name (memory or temporary)
    Copy { dst: String, src: String },
    /// `name:`
    Label(String),
    /// `goto label`
    Goto(String),
    /// `ifFalse cond goto label`
    IfFalse { cond: String, label: String },
}

impl Instr {
    /// The name this instruction writes, if any.
    pub fn dst(&self) -> Option<&str> {
        match self {
            Instr::Assign { dst, .. } | Instr::Op { dst, .. } | Instr::Copy { dst, .. } => {
                Some(dst)
            },
            Instr::Label(_) | Instr::Goto(_) | Instr::IfFalse { .. } => None,
        }
    }

    /// The operand names this instruction reads.
    pub fn operands(&self) -> Vec<&str> {
        match self {
            Instr::Assign { src, .. } | Instr::Copy { src, .. } => vec![src],
            Instr::Op { lhs, rhs, .. } => vec![lhs, rhs],
            Instr::IfFalse { cond, .. } => vec![cond],
            Instr::Label(_) | Instr::Goto(_) => Vec::new(),
        }
    }

    /// Whether this is a control-flow instruction (never removed).
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Instr::Label(_) | Instr::Goto(_) | Instr::IfFalse { .. }
        )
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::Assign { dst, src } | Instr::Copy { dst, src } => {
                write!(f, "{} = {}", dst, src)
            },
            Instr::Op { dst, lhs, op, rhs } => write!(f, "{} = {} {} {}", dst, lhs, op, rhs),
            Instr::Label(name) => write!(f, "{}:", name),
            Instr::Goto(label) => write!(f, "goto {}", label),
            Instr::IfFalse { cond, label } => write!(f, "ifFalse {} goto {}", cond, label),
        }
    }
}

/// Whether a TAC operand is a compiler temporary (`t` + digits).
pub fn is_temp(name: &str) -> bool {
    name.strip_prefix('t')
        .map(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Whether a TAC operand is a numeric literal.
pub fn is_const(operand: &str) -> bool {
    operand.parse::<f64>().is_ok()
}

/// Numeric value of a literal operand.
pub fn const_value(operand: &str) -> Option<f64> {
    operand.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        assert_eq!(
            Instr::Assign {
                dst: "t0".into(),
                src: "3".into()
            }
            .to_string(),
            "t0 = 3"
        );
        assert_eq!(
            Instr::Op {
                dst: "t2".into(),
                lhs: "t0".into(),
                op: TacOp::Add,
                rhs: "t1".into()
            }
            .to_string(),
            "t2 = t0 + t1"
        );
        assert_eq!(Instr::Label("L0".into()).to_string(), "L0:");
        assert_eq!(Instr::Goto("L1".into()).to_string(), "goto L1");
        assert_eq!(
            Instr::IfFalse {
                cond: "t3".into(),
                label: "L1".into()
            }
            .to_string(),
            "ifFalse t3 goto L1"
        );
    }

    #[test]
    fn test_is_temp() {
        assert!(is_temp("t0"));
        assert!(is_temp("t42"));
        assert!(!is_temp("t"));
        assert!(!is_temp("MEM"));
        assert!(!is_temp("T0"));
        assert!(!is_temp("tX"));
    }

    #[test]
    fn test_is_const() {
        assert!(is_const("3"));
        assert!(is_const("2.5"));
        assert!(!is_const("t0"));
        assert!(!is_const("MEM"));
    }

    #[test]
    fn test_operands_and_dst() {
        let op = Instr::Op {
            dst: "t2".into(),
            lhs: "t0".into(),
            op: TacOp::Mul,
            rhs: "5".into(),
        };
        assert_eq!(op.dst(), Some("t2"));
        assert_eq!(op.operands(), vec!["t0", "5"]);

        let goto = Instr::Goto("L0".into());
        assert_eq!(goto.dst(), None);
        assert!(goto.operands().is_empty());
        assert!(goto.is_control());
    }
}
