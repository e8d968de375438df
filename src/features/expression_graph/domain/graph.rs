//! The hash-consing expression graph builder.

use rustc_hash::FxHashMap;

use crate::shared::models::location::FileLocation;
use crate::shared::models::lookup_table::LookupTable;
use crate::shared::models::symbol::Symbol;

use super::super::infrastructure::structural::{bypasses_hash_consing, structural_eq, structural_hash};
use super::node::{LookupTableId, NodeData, NodeId};
use super::operator::Operator;

/// A back-edge: `child_index` of `parent`'s children array currently
/// points at a `NIL` stub and must be rewritten when that symbol is
/// finally bound.
#[derive(Debug, Clone, Copy)]
struct Slot {
    parent: NodeId,
    child_index: u8,
}

/// The hash-consed expression graph: node arena, lookup-table arena,
/// symbol table, and the bookkeeping needed to resolve forward references.
pub struct ExpressionGraph {
    nodes: Vec<NodeData>,
    lookup_tables: Vec<LookupTable>,
    hash_buckets: FxHashMap<u64, Vec<NodeId>>,
    symbol_table: FxHashMap<Symbol, NodeId>,
    node_table: FxHashMap<NodeId, Vec<Symbol>>,
    temp_usages: FxHashMap<NodeId, Vec<Slot>>,
    unique_constants: bool,
    time_node: Option<NodeId>,
}

impl ExpressionGraph {
    pub fn new() -> Self {
        tracing::debug!("expression_graph_initialized");
        Self {
            nodes: Vec::new(),
            lookup_tables: Vec::new(),
            hash_buckets: FxHashMap::default(),
            symbol_table: FxHashMap::default(),
            node_table: FxHashMap::default(),
            temp_usages: FxHashMap::default(),
            unique_constants: false,
            time_node: None,
        }
    }

    /// If set, `CONSTANT` nodes are never hash-consed: every `constant()`
    /// call allocates a fresh node even if an equal value already exists.
    pub fn set_unique_constants(&mut self, unique: bool) {
        self.unique_constants = unique;
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn lookup_table(&self, id: LookupTableId) -> &LookupTable {
        &self.lookup_tables[id.index()]
    }

    /// Iterates the node arena in insertion order. Includes orphaned
    /// nodes left behind by forward-reference substitution.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    // ---- raw construction (hash-consing core) ----

    fn alloc(&mut self, op: Operator, children: [Option<NodeId>; 4]) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(op, children));
        id
    }

    fn register_back_edges(&mut self, parent: NodeId, children: [Option<NodeId>; 4]) {
        for (i, child) in children.iter().enumerate() {
            if let Some(child_id) = child {
                if self.nodes[child_id.index()].op == Operator::Nil {
                    self.temp_usages.entry(*child_id).or_default().push(Slot {
                        parent,
                        child_index: i as u8,
                    });
                }
            }
        }
    }

    /// Hash-conses a candidate node: if a structurally equivalent node
    /// already exists, returns it (the candidate is discarded, left as
    /// arena garbage); otherwise registers and returns the new node.
    fn intern(&mut self, op: Operator, children: [Option<NodeId>; 4]) -> NodeId {
        if bypasses_hash_consing(op) || op == Operator::RandomUniform {
            let id = self.alloc(op, children);
            self.register_back_edges(id, children);
            return id;
        }
        if self.unique_constants && op == Operator::Constant {
            let id = self.alloc(op, children);
            return id;
        }

        let candidate = self.alloc(op, children);
        let hash = structural_hash(&self.nodes, candidate);
        if let Some(bucket) = self.hash_buckets.get(&hash) {
            for &existing in bucket {
                if existing != candidate && structural_eq(&self.nodes, candidate, existing) {
                    tracing::trace!(?op, node = existing.index(), "hash_cons_hit");
                    return existing;
                }
            }
        }
        self.hash_buckets.entry(hash).or_default().push(candidate);
        self.register_back_edges(candidate, children);
        tracing::trace!(?op, node = candidate.index(), "hash_cons_miss");
        candidate
    }

    pub fn nullary(&mut self, op: Operator) -> NodeId {
        self.intern(op, [None, None, None, None])
    }

    pub fn unary(&mut self, op: Operator, child: NodeId) -> NodeId {
        self.intern(op, [Some(child), None, None, None])
    }

    pub fn binary(&mut self, op: Operator, a: NodeId, b: NodeId) -> NodeId {
        self.intern(op, [Some(a), Some(b), None, None])
    }

    pub fn ternary(&mut self, op: Operator, a: NodeId, b: NodeId, c: NodeId) -> NodeId {
        self.intern(op, [Some(a), Some(b), Some(c), None])
    }

    /// `PULSE_TRAIN(start, width, tbetween, end)`: the one operator with
    /// four independent scalar children.
    pub fn pulse_train(&mut self, start: NodeId, width: NodeId, tbetween: NodeId, end: NodeId) -> NodeId {
        self.intern(
            Operator::PulseTrain,
            [Some(start), Some(width), Some(tbetween), Some(end)],
        )
    }

    /// Hash-consed constant leaf.
    pub fn constant(&mut self, value: f64) -> NodeId {
        let candidate = self.alloc(Operator::Constant, [None, None, None, None]);
        self.nodes[candidate.index()].value = Some(value);
        self.nodes[candidate.index()].ty = super::node::NodeType::Constant;
        self.nodes[candidate.index()].init = super::node::InitialType::ConstantInit;

        if self.unique_constants {
            return candidate;
        }
        let hash = structural_hash(&self.nodes, candidate);
        if let Some(bucket) = self.hash_buckets.get(&hash) {
            for &existing in bucket {
                if existing != candidate && structural_eq(&self.nodes, candidate, existing) {
                    return existing;
                }
            }
        }
        self.hash_buckets.entry(hash).or_default().push(candidate);
        candidate
    }

    /// The process-scoped `TIME` singleton. Left `Unknown`/`UnknownInit`
    /// like every other freshly allocated node: the Analyzer's own
    /// `Operator::Time` arm is what classifies it (`ty=Static`,
    /// `init=ConstantInit`, folded `value=INITIAL TIME`), the same way a
    /// `NIL` forward-reference stub is never pre-classified by the Builder.
    pub fn time_node(&mut self) -> NodeId {
        if let Some(id) = self.time_node {
            return id;
        }
        let id = self.alloc(Operator::Time, [None, None, None, None]);
        self.time_node = Some(id);
        id
    }

    /// The free decision-variable leaf.
    pub fn control(&mut self, lb: Option<f64>, ub: Option<f64>) -> NodeId {
        let id = self.alloc(Operator::Control, [None, None, None, None]);
        let n = &mut self.nodes[id.index()];
        n.lb = lb;
        n.ub = ub;
        n.ty = super::node::NodeType::Dynamic;
        n.init = super::node::InitialType::ControlledInit;
        id
    }

    /// Hash-conses a lookup table (by pointwise bit-exact content) and
    /// returns the `LOOKUP_TABLE` node wrapping it.
    pub fn lookup(&mut self, table: LookupTable) -> NodeId {
        let mut found = None;
        for (i, existing) in self.lookup_tables.iter().enumerate() {
            if existing.structural_eq(&table) {
                found = Some(LookupTableId(i as u32));
                break;
            }
        }
        let table_id = found.unwrap_or_else(|| {
            let id = LookupTableId(self.lookup_tables.len() as u32);
            self.lookup_tables.push(table);
            id
        });

        let candidate = self.alloc(Operator::LookupTable, [None, None, None, None]);
        self.nodes[candidate.index()].lookup_table = Some(table_id);
        self.nodes[candidate.index()].ty = super::node::NodeType::Static;
        self.nodes[candidate.index()].init = super::node::InitialType::ConstantInit;

        let hash = structural_hash(&self.nodes, candidate);
        if let Some(bucket) = self.hash_buckets.get(&hash) {
            for &existing in bucket {
                if existing != candidate && structural_eq(&self.nodes, candidate, existing) {
                    return existing;
                }
            }
        }
        self.hash_buckets.entry(hash).or_default().push(candidate);
        candidate
    }

    /// A fresh, never hash-consed `NIL` forward-reference stub.
    fn create_tmp_node(&mut self) -> NodeId {
        self.alloc(Operator::Nil, [None, None, None, None])
    }

    // ---- symbol resolution and forward references ----

    /// Resolves `s` to its bound node, creating a `NIL` forward-reference
    /// stub if `s` is not yet bound.
    pub fn node_for(&mut self, s: Symbol) -> NodeId {
        if let Some(&id) = self.symbol_table.get(&s) {
            return id;
        }
        let id = self.create_tmp_node();
        self.symbol_table.insert(s.clone(), id);
        self.node_table.entry(id).or_default().push(s);
        id
    }

    /// Binds `s` to `node`. First definition wins: if `s` is already bound
    /// to a real (non-`NIL`) node, this is a no-op. If `s` was a forward
    /// reference (bound to a `NIL` stub), every back-edge into that stub
    /// is rewritten to point at `node`, and every other symbol that shared
    /// the stub is migrated to point at `node` too. If `node` is itself
    /// `NIL` (a reference to another not-yet-defined symbol), the two
    /// `NIL` groups are merged instead of being resolved.
    pub fn add_symbol(&mut self, s: Symbol, node: NodeId, loc: Option<FileLocation>) {
        if let Some(&existing) = self.symbol_table.get(&s) {
            if self.nodes[existing.index()].op != Operator::Nil {
                // First definition wins; still record where the rejected
                // redefinition occurred, against the node that stays bound.
                if let Some(loc) = loc {
                    self.nodes[existing.index()].usages.push(loc);
                }
                return;
            }
            let tmp = existing;
            if tmp != node {
                let other_syms: Vec<Symbol> = self
                    .node_table
                    .remove(&tmp)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|sym| *sym != s)
                    .collect();
                for sym in &other_syms {
                    self.symbol_table.insert(sym.clone(), node);
                }
                self.node_table.entry(node).or_default().extend(other_syms);
                self.substitute_tmp(tmp, node);
            }
        }

        if let Some(loc) = loc {
            self.nodes[node.index()].usages.push(loc);
        }
        self.symbol_table.insert(s.clone(), node);
        self.node_table.entry(node).or_default().push(s);
    }

    /// Rewrites every recorded back-edge into `tmp` to point at `subst`
    /// instead. If `subst` is itself a `NIL` stub, the back-edge tracking
    /// is carried forward under `subst`'s key so a later substitution of
    /// `subst` still reaches these slots.
    fn substitute_tmp(&mut self, tmp: NodeId, subst: NodeId) {
        let tmp_usages = std::mem::take(&mut self.nodes[tmp.index()].usages);
        self.nodes[subst.index()].usages.extend(tmp_usages);

        if let Some(slots) = self.temp_usages.remove(&tmp) {
            for slot in &slots {
                self.nodes[slot.parent.index()].children[slot.child_index as usize] = Some(subst);
            }
            if self.nodes[subst.index()].op == Operator::Nil {
                self.temp_usages.entry(subst).or_default().extend(slots);
            }
        }
    }

    /// True once no symbol in the table still resolves to a `NIL` stub.
    pub fn all_symbols_resolved(&self) -> bool {
        self.symbol_table
            .values()
            .all(|&id| self.nodes[id.index()].op != Operator::Nil)
    }

    pub fn symbol_node(&self, s: &Symbol) -> Option<NodeId> {
        self.symbol_table.get(s).copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&Symbol, &NodeId)> {
        self.symbol_table.iter()
    }

    pub fn symbols_for(&self, node: NodeId) -> &[Symbol] {
        self.node_table
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

impl Default for ExpressionGraph {
    fn default() -> Self {
        Self::new()
    }
}
