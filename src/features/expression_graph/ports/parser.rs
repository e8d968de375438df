//! The model-file parsing contract.
//!
//! No implementation lives in this crate: VOC/MDL/VOP/VPD are file formats
//! owned by a downstream driver, which is expected to build an
//! `ExpressionGraph` by calling `parse_voc_file`/`parse_mdl_file` against
//! it and hand the result to the Analyzer. This trait exists so that
//! driver and this crate can be developed against a shared contract
//! without this crate knowing anything about file syntax.

use std::path::Path;

use crate::errors::GraphError;
use crate::features::expression_graph::domain::graph::ExpressionGraph;
use crate::shared::models::objective::Objective;
use crate::shared::models::vop_file::VopFile;

/// Parses the four file kinds a dynamical-system model is assembled from.
///
/// Order matters for `parse_voc_file`/`parse_mdl_file`: control (`.voc`)
/// files must be parsed into a graph before model (`.mdl`) files, since a
/// symbol's first definition wins (`ExpressionGraph::add_symbol`) and a
/// `.voc` file's control overrides and time-step changes are only picked
/// up if they land before the `.mdl` file's own definitions.
pub trait ModelParser: Send + Sync {
    /// Resolves a `.vop` file's model/control/objective paths (made
    /// absolute relative to the `.vop` file's own location) and category
    /// list.
    fn parse_vop_file(&self, path: &Path) -> Result<VopFile, GraphError>;

    /// Parses a `.mdl` file's equations into `graph`. Safe to call more
    /// than once against the same graph to layer multiple model files.
    fn parse_mdl_file(&self, path: &Path, graph: &mut ExpressionGraph) -> Result<(), GraphError>;

    /// Parses a `.voc` file's control declarations and time-step overrides
    /// into `graph`. Must run before `parse_mdl_file` for the same graph.
    fn parse_voc_file(&self, path: &Path, graph: &mut ExpressionGraph) -> Result<(), GraphError>;

    /// Parses a `.vpd` file's objective summands into `obj`. Safe to call
    /// more than once to accumulate summands from multiple objective
    /// files into the same `Objective`.
    fn parse_vpd_file(&self, path: &Path, obj: &mut Objective) -> Result<(), GraphError>;
}
