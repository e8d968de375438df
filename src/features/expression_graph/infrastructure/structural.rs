//! Structural equivalence: the equality/hash pair that drives hash-consing.
//!
//! Operates directly on an arena slice plus `NodeId`s rather than on the
//! `ExpressionGraph` itself, so it has no dependency on the builder.
//! Children are compared by `NodeId` equality, never recursively: by the
//! time a node is hash-consed, every one of its children is already
//! canonical, so identity of the child `NodeId` is structural equality of
//! the child subtree.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use super::super::domain::node::{NodeData, NodeId};
use super::super::domain::operator::Operator;

/// `NIL` and `CONTROL` are never hash-consed: every construction must
/// yield a fresh node, so callers should skip the structural probe
/// entirely for these operators rather than calling these functions.
pub fn bypasses_hash_consing(op: Operator) -> bool {
    matches!(op, Operator::Nil | Operator::Control)
}

/// Two nodes are structurally equivalent according to spec's table:
/// commutative operators compare children unordered; `G`/`LE` and `L`/`GE`
/// are inverse pairs with swapped children; `RANDOM_UNIFORM` is never
/// equal to anything, including itself; `TIME` is a singleton (always
/// equal to another `TIME` node); `LOOKUP_TABLE` nodes compare by the
/// identity of their already-interned table; everything else compares op
/// plus children (ordered) plus, for `CONSTANT`, the bit-exact value.
pub fn structural_eq(arena: &[NodeData], a: NodeId, b: NodeId) -> bool {
    let na = &arena[a.index()];
    let nb = &arena[b.index()];

    if na.op == Operator::RandomUniform || nb.op == Operator::RandomUniform {
        return false;
    }
    if na.op == Operator::Nil || na.op == Operator::Control {
        return a == b;
    }
    if na.op == Operator::Time && nb.op == Operator::Time {
        return true;
    }
    if na.op != nb.op {
        // G/LE and L/GE are the only cross-operator equivalence classes.
        return match (na.op, nb.op) {
            (Operator::G, Operator::Le) | (Operator::Le, Operator::G) => {
                children_eq(arena, na.children[0], nb.children[1])
                    && children_eq(arena, na.children[1], nb.children[0])
            }
            (Operator::L, Operator::Ge) | (Operator::Ge, Operator::L) => {
                children_eq(arena, na.children[0], nb.children[1])
                    && children_eq(arena, na.children[1], nb.children[0])
            }
            _ => false,
        };
    }

    if na.op == Operator::Constant {
        return match (na.value, nb.value) {
            (Some(x), Some(y)) => x.to_bits() == y.to_bits(),
            _ => false,
        };
    }

    if na.op == Operator::LookupTable {
        return na.lookup_table == nb.lookup_table;
    }

    if na.op.is_commutative() {
        let (a0, a1) = (na.children[0], na.children[1]);
        let (b0, b1) = (nb.children[0], nb.children[1]);
        return (children_eq(arena, a0, b0) && children_eq(arena, a1, b1))
            || (children_eq(arena, a0, b1) && children_eq(arena, a1, b0));
    }

    for i in 0..4 {
        if !children_eq(arena, na.children[i], nb.children[i]) {
            return false;
        }
    }
    true
}

/// Children are compared by `NodeId` equality, never recursively: by the
/// time a parent is hash-consed, every one of its children is already
/// canonical, so identity of the child `NodeId` already is structural
/// equality of the child subtree. A recursive call here would re-run
/// `structural_eq`'s own-operand special cases (`RANDOM_UNIFORM`'s
/// never-equal rule, in particular) against a child that both parents
/// already share by identity, wrongly rejecting two otherwise-identical
/// parents that happen to point at the same `RANDOM_UNIFORM` descendant.
fn children_eq(_arena: &[NodeData], a: Option<NodeId>, b: Option<NodeId>) -> bool {
    a == b
}

/// Hash consistent with `structural_eq`: equal nodes (per the rules above)
/// always hash equal. `RANDOM_UNIFORM` hashes to a fixed constant (`0`) so
/// it lands in one bucket that `structural_eq` then always rejects,
/// guaranteeing every use gets its own node. `NIL`/`CONTROL` hash by
/// identity, matching their identity-only equality.
pub fn structural_hash(arena: &[NodeData], id: NodeId) -> u64 {
    let n = &arena[id.index()];

    if n.op == Operator::RandomUniform {
        return 0;
    }
    if n.op == Operator::Nil || n.op == Operator::Control {
        let mut h = FxHasher::default();
        id.index().hash(&mut h);
        return h.finish();
    }
    if n.op == Operator::Time {
        let mut h = FxHasher::default();
        "TIME".hash(&mut h);
        return h.finish();
    }

    let mut h = FxHasher::default();
    canonical_op(n.op).hash(&mut h);

    if n.op == Operator::Constant {
        if let Some(v) = n.value {
            v.to_bits().hash(&mut h);
        }
        return h.finish();
    }
    if n.op == Operator::LookupTable {
        n.lookup_table.hash(&mut h);
        return h.finish();
    }

    if n.op.is_commutative() {
        // Order-independent combination: XOR the per-child hashes.
        let mut combined = 0u64;
        for child in n.children.iter().flatten() {
            let mut ch = FxHasher::default();
            child.hash(&mut ch);
            combined ^= ch.finish();
        }
        combined.hash(&mut h);
        return h.finish();
    }

    // Comparison-inversion pairs hash under a canonical (op, child order):
    // `G(a,b)` and `LE(b,a)` must produce the same hash.
    let (c0, c1) = canonical_children(n.op, n.children[0], n.children[1]);
    c0.hash(&mut h);
    c1.hash(&mut h);
    if let Some(c2) = n.children[2] {
        c2.hash(&mut h);
    }
    if let Some(c3) = n.children[3] {
        c3.hash(&mut h);
    }
    h.finish()
}

/// Canonical operator tag for hashing: folds each inversion pair to a
/// single representative so both members hash identically.
fn canonical_op(op: Operator) -> Operator {
    match op {
        Operator::Le => Operator::G,
        Operator::Ge => Operator::L,
        other => other,
    }
}

/// Canonicalizes the first two children to match `canonical_op`'s choice
/// of representative: `LE(b,a)` is rehashed as if it were `G(a,b)`.
fn canonical_children(
    op: Operator,
    c0: Option<NodeId>,
    c1: Option<NodeId>,
) -> (Option<NodeId>, Option<NodeId>) {
    match op {
        Operator::Le | Operator::Ge => (c1, c0),
        _ => (c0, c1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expression_graph::domain::node::NodeData;

    fn push(arena: &mut Vec<NodeData>, data: NodeData) -> NodeId {
        let id = NodeId(arena.len() as u32);
        arena.push(data);
        id
    }

    #[test]
    fn commutative_operands_are_structurally_equal_either_order() {
        let mut arena = Vec::new();
        let mut c = |v: f64| {
            let mut n = NodeData::new(Operator::Constant, [None, None, None, None]);
            n.value = Some(v);
            push(&mut arena, n)
        };
        let a = c(1.0);
        let b = c(2.0);
        let plus_ab = push(
            &mut arena,
            NodeData::new(Operator::Plus, [Some(a), Some(b), None, None]),
        );
        let plus_ba = push(
            &mut arena,
            NodeData::new(Operator::Plus, [Some(b), Some(a), None, None]),
        );
        assert!(structural_eq(&arena, plus_ab, plus_ba));
        assert_eq!(
            structural_hash(&arena, plus_ab),
            structural_hash(&arena, plus_ba)
        );
    }

    #[test]
    fn g_and_le_with_swapped_children_are_equivalent() {
        let mut arena = Vec::new();
        let mut c = |v: f64| {
            let mut n = NodeData::new(Operator::Constant, [None, None, None, None]);
            n.value = Some(v);
            push(&mut arena, n)
        };
        let a = c(1.0);
        let b = c(2.0);
        let g_ab = push(
            &mut arena,
            NodeData::new(Operator::G, [Some(a), Some(b), None, None]),
        );
        let le_ba = push(
            &mut arena,
            NodeData::new(Operator::Le, [Some(b), Some(a), None, None]),
        );
        assert!(structural_eq(&arena, g_ab, le_ba));
        assert_eq!(
            structural_hash(&arena, g_ab),
            structural_hash(&arena, le_ba)
        );
    }

    #[test]
    fn random_uniform_is_never_equal_even_to_itself() {
        let mut arena = Vec::new();
        let r = push(&mut arena, NodeData::new(Operator::RandomUniform, [None, None, None, None]));
        assert!(!structural_eq(&arena, r, r));
    }

    #[test]
    fn nil_nodes_are_distinct_by_identity() {
        let mut arena = Vec::new();
        let a = push(&mut arena, NodeData::new(Operator::Nil, [None, None, None, None]));
        let b = push(&mut arena, NodeData::new(Operator::Nil, [None, None, None, None]));
        assert!(!structural_eq(&arena, a, b));
        assert!(structural_eq(&arena, a, a));
    }

    #[test]
    fn parents_sharing_the_same_random_uniform_child_are_still_structurally_equal() {
        let mut arena = Vec::new();
        let noise = push(&mut arena, NodeData::new(Operator::RandomUniform, [None, None, None, None]));
        let x = {
            let mut n = NodeData::new(Operator::Constant, [None, None, None, None]);
            n.value = Some(1.0);
            push(&mut arena, n)
        };
        let plus_1 = push(
            &mut arena,
            NodeData::new(Operator::Plus, [Some(noise), Some(x), None, None]),
        );
        let plus_2 = push(
            &mut arena,
            NodeData::new(Operator::Plus, [Some(noise), Some(x), None, None]),
        );
        // `noise` is the exact same NodeId in both parents: children_eq must
        // compare it by identity, not recurse into structural_eq and trip
        // RANDOM_UNIFORM's own never-equal rule.
        assert!(structural_eq(&arena, plus_1, plus_2));
        assert_eq!(structural_hash(&arena, plus_1), structural_hash(&arena, plus_2));
    }
}
