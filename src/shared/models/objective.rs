//! Optimal-control objective description.
//!
//! Data-only container: the NLP/optimization machinery that would consume
//! this is out of scope, as is the parser that would populate it. This
//! exists so the `ModelParser` port (see
//! `features::expression_graph::ports::parser`) has a concrete return
//! shape to hand back to a driver.

use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// Whether a summand contributes at the final time only (`Mayer`) or
/// integrated over the whole horizon (`Lagrange`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummandKind {
    Mayer,
    Lagrange,
}

/// A single weighted contribution to the objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summand {
    pub kind: SummandKind,
    pub variable: Symbol,
    pub coefficient: f64,
}

/// Whether the objective is minimized or maximized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Minimize,
    Maximize,
}

/// The optimization objective: a weighted sum of Mayer/Lagrange summands
/// plus a direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub summands: Vec<Summand>,
    pub direction: Direction,
}

impl Objective {
    pub fn new(direction: Direction) -> Self {
        Self {
            summands: Vec::new(),
            direction,
        }
    }

    pub fn push(&mut self, kind: SummandKind, variable: impl Into<Symbol>, coefficient: f64) {
        self.summands.push(Summand {
            kind,
            variable: variable.into(),
            coefficient,
        });
    }
}
