//! Crate-wide error type.

use thiserror::Error;

use crate::shared::models::symbol::Symbol;

/// Errors returned by the builder, analyzer, and evaluator.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Raised once, after a complete analysis pass, if the diagnostics
    /// bag recorded at least one error. Carries the rendered report.
    #[error("graph analysis failed:\n{0}")]
    Fatal(String),

    /// A symbol was referenced but never bound to a real node.
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(Symbol),

    /// A cycle was found that does not pass through an `INTEG` node.
    #[error("cycle detected not passing through an INTEG node")]
    CycleDetected,

    /// A node was asked to evaluate before it had been analyzed.
    #[error("node is not analyzed (UNKNOWN type): cannot evaluate")]
    NotAnalyzed,

    /// `DELAY_FIXED` was reached during evaluation. Its true value depends
    /// on a history of past `time` values that a single static evaluation
    /// call never sees; the reference implementation leaves this case
    /// unimplemented rather than define it, and this crate reports the gap
    /// explicitly instead of silently returning a wrong number.
    #[error("DELAY FIXED cannot be evaluated without simulation-time history")]
    DelayFixedUnsupported,
}
