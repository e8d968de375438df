//! The VOP file's container shape, as handed to a driver by a (not
//! implemented here) parser. See `features::expression_graph::ports::parser`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// Paths and category labels a VOP file resolves to; no parsing logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VopFile {
    pub model_path: PathBuf,
    pub control_path: Option<PathBuf>,
    pub objective_path: Option<PathBuf>,
    pub categories: Vec<Symbol>,
}

impl VopFile {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            control_path: None,
            objective_path: None,
            categories: Vec::new(),
        }
    }
}
