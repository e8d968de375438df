//! Hash-consed expression graphs for dynamical-system simulation.
//!
//! Architecture follows a feature-first layout:
//!
//! - `shared::models` holds cross-cutting domain types (`Symbol`,
//!   `Location`, `LookupTable`, `Objective`, `VopFile`) with no behavior
//!   tied to a single feature.
//! - `features::diagnostics` is the error/warning bag shared by the
//!   builder and analyzer.
//! - `features::expression_graph` is the core: the `Operator`/`Node`
//!   data model, the hash-consing `ExpressionGraph` builder, the
//!   structural equivalence rules used to drive hash-consing, the
//!   non-recursive `Analyzer`, the non-recursive static `Evaluator`, and
//!   the `ModelParser` port that out-of-tree file-format parsers
//!   implement.
//! - `features::butcher_tableau` is the Runge-Kutta tableau catalogue.
//! - `config` holds builder-level knobs.
//! - `errors` is the crate-wide error type returned by fallible entry
//!   points.

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use errors::GraphError;
pub use features::butcher_tableau::domain::tableau::{ButcherTableau, TableauName};
pub use features::diagnostics::domain::bag::{Diagnostics, Severity};
pub use features::expression_graph::application::analyzer::analyze;
pub use features::expression_graph::domain::graph::ExpressionGraph;
pub use features::expression_graph::domain::node::{InitialType, NodeId, NodeType};
pub use features::expression_graph::domain::operator::Operator;
pub use features::expression_graph::infrastructure::evaluator::evaluate;
pub use shared::models::location::{FileLocation, Location};
pub use shared::models::lookup_table::LookupTable;
pub use shared::models::symbol::Symbol;
