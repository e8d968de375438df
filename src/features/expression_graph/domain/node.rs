//! Node identity, the type/init lattices, and the node record itself.

use serde::{Deserialize, Serialize};

use crate::shared::models::location::FileLocation;
use crate::shared::models::symbol::Symbol;

use super::operator::Operator;

/// A stable index into an `ExpressionGraph`'s node arena. Never a raw
/// pointer: every child reference is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A stable index into an `ExpressionGraph`'s lookup-table arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupTableId(pub(crate) u32);

impl LookupTableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a node sits in the constant/static/dynamic lattice.
///
/// The numeric values are chosen so that `a.lub(b)` is exactly `a | b`:
/// `Constant (0) < Static (1) < Dynamic (3) < Unknown (7)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Constant = 0,
    Static = 1,
    Dynamic = 3,
    Unknown = 7,
}

impl NodeType {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => NodeType::Constant,
            1 => NodeType::Static,
            3 => NodeType::Dynamic,
            _ => NodeType::Unknown,
        }
    }

    /// Least upper bound of two already-classified types.
    pub fn lub(self, other: Self) -> Self {
        Self::from_u8(self as u8 | other as u8)
    }
}

/// Whether a node's initial value is a compile-time constant, depends on a
/// `CONTROL` decision variable, or hasn't been classified yet.
///
/// Same OR-as-LUB convention as `NodeType`: `ConstantInit (0) < ControlledInit (1) < UnknownInit (2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InitialType {
    ConstantInit = 0,
    ControlledInit = 1,
    UnknownInit = 2,
}

impl InitialType {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => InitialType::ConstantInit,
            1 => InitialType::ControlledInit,
            _ => InitialType::UnknownInit,
        }
    }

    /// Least upper bound of two already-classified initial types.
    pub fn lub(self, other: Self) -> Self {
        Self::from_u8(self as u8 | other as u8)
    }
}

/// The data stored per node in the arena. Children and the lookup-table
/// reference are mutually exclusive in practice (only `LOOKUP_TABLE` nodes
/// carry `lookup_table`), but both fields are always present for
/// simplicity, following the original's tagged-union layout.
///
/// Four child slots rather than three: every operator but `PULSE_TRAIN`
/// uses at most three, but `PULSE_TRAIN` has four independent scalar
/// inputs (start, width, time-between, end). Rather than nest a private
/// two-child sub-node the way the original encodes it, `PULSE_TRAIN`
/// stores all four directly in `children[0..4]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub op: Operator,
    pub children: [Option<NodeId>; 4],
    pub lookup_table: Option<LookupTableId>,
    pub ty: NodeType,
    pub init: InitialType,
    pub level: u32,
    pub value: Option<f64>,
    pub unit: Option<Symbol>,
    pub lb: Option<f64>,
    pub ub: Option<f64>,
    pub usages: Vec<FileLocation>,
    pub integer: bool,
}

impl NodeData {
    pub(crate) fn new(op: Operator, children: [Option<NodeId>; 4]) -> Self {
        Self {
            op,
            children,
            lookup_table: None,
            ty: NodeType::Unknown,
            init: InitialType::UnknownInit,
            level: 0,
            value: None,
            unit: None,
            lb: None,
            ub: None,
            usages: Vec::new(),
            integer: false,
        }
    }

    pub fn child(&self, i: usize) -> Option<NodeId> {
        self.children[i]
    }
}
