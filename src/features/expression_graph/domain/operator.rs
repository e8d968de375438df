//! The closed set of operators an expression graph node can carry.

use serde::{Deserialize, Serialize};

/// Every operator a `Node` can be tagged with. Closed: the Analyzer,
/// Evaluator, and structural-equivalence rules are written as exhaustive
/// matches over this set, and adding a variant means updating all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    // --- State and time-dependent leaves/constructs ---
    Integ,
    Initial,
    ActiveInitial,
    DelayFixed,
    Pulse,
    PulseTrain,
    Step,
    Ramp,
    RandomUniform,
    Time,

    // --- Arithmetic ---
    Plus,
    Minus,
    Mult,
    Div,
    UMinus,
    Power,
    Log,
    Modulo,
    Min,
    Max,
    Sqrt,
    Exp,
    Ln,
    Abs,
    Integer,

    // --- Trigonometric ---
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    Sinh,
    Cosh,
    Tanh,

    // --- Boolean / comparison ---
    Not,
    And,
    Or,
    Eq,
    Neq,
    G,
    Ge,
    L,
    Le,

    // --- Control flow ---
    If,

    // --- Leaves ---
    Constant,
    LookupTable,
    ApplyLookup,
    Control,
    Nil,
}

impl Operator {
    /// Whether this operator's children are compared unordered for
    /// structural equivalence (the symmetric/commutative operators).
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Operator::Plus
                | Operator::Mult
                | Operator::Min
                | Operator::Max
                | Operator::Eq
                | Operator::Neq
                | Operator::Or
                | Operator::And
        )
    }

    /// The inverse comparison operator with swapped operands, if any:
    /// `G(a,b)` and `LE(b,a)` are one equivalence class, as are `L(a,b)`
    /// and `GE(b,a)`.
    pub fn comparison_inverse(self) -> Option<Operator> {
        match self {
            Operator::G => Some(Operator::Le),
            Operator::Le => Some(Operator::G),
            Operator::L => Some(Operator::Ge),
            Operator::Ge => Some(Operator::L),
            _ => None,
        }
    }
}
