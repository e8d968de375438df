//! The non-recursive worklist Analyzer.
//!
//! Classifies every node's `NodeType`/`InitialType`, assigns its `level`,
//! and constant-folds a `value` wherever the node's inputs allow it. A
//! node is visited by peeking the back of a deque, not popping it: an
//! operator whose children are still `Unknown` pushes those children on
//! top and leaves itself in place, to resurface once they resolve. This
//! mirrors the seeding and traversal order of the reference analyzer
//! exactly, since the level numbers and constant-folded values it
//! produces are part of this crate's observable contract.

use std::collections::VecDeque;

use rand::Rng;

use crate::errors::GraphError;
use crate::features::diagnostics::domain::bag::Diagnostics;
use crate::shared::models::symbol::Symbol;

use super::super::domain::graph::ExpressionGraph;
use super::super::domain::node::{InitialType, NodeId, NodeType};
use super::super::domain::operator::Operator;

/// Bounds the number of worklist pops: a real non-`INTEG` cycle would spin
/// the reference algorithm forever. `32` pops per node is generous headroom
/// for any node's re-visit count in an acyclic (save for `INTEG`) graph.
fn iteration_budget(node_count: usize) -> usize {
    node_count.saturating_mul(32).max(1024)
}

/// Runs the Analyzer over every node reachable from a bound symbol, plus
/// the `TIME` singleton. Errors and warnings are recorded in `diagnostics`
/// rather than aborting the pass early; call returns `Err(GraphError::Fatal)`
/// once the pass is complete if any error was recorded.
pub fn analyze(graph: &mut ExpressionGraph, diagnostics: &mut Diagnostics) -> Result<(), GraphError> {
    tracing::info!(nodes = graph.len(), "analyzing_graph");

    let initial_time = graph.node_for(Symbol::intern("INITIAL TIME"));
    let final_time = graph.node_for(Symbol::intern("FINAL TIME"));
    let time_step = graph.node_for(Symbol::intern("TIME STEP"));
    let time_node = graph.time_node();

    let mut worklist: VecDeque<NodeId> = VecDeque::new();
    let bound: Vec<(Symbol, NodeId)> = graph
        .symbols()
        .map(|(s, &id)| (s.clone(), id))
        .collect();

    for (_, id) in bound {
        if graph.node(id).op == Operator::Integ {
            worklist.push_back(id);
        } else if id != initial_time && id != final_time && id != time_step {
            worklist.push_front(id);
        }
    }

    worklist.push_back(initial_time);
    worklist.push_back(final_time);
    worklist.push_back(time_step);
    worklist.push_back(time_node);

    tracing::debug!(nodes = graph.len(), seeded = worklist.len(), "analyzer_worklist_seeded");

    let budget = iteration_budget(graph.len());
    let mut pops = 0usize;

    while let Some(&id) = worklist.back() {
        if graph.node(id).ty != NodeType::Unknown {
            worklist.pop_back();
            continue;
        }

        pops += 1;
        if pops > budget {
            tracing::error!(node = id.index(), "analyzer_cycle_detected");
            return Err(GraphError::CycleDetected);
        }

        tracing::trace!(node = id.index(), op = ?graph.node(id).op, "classifying_node");
        visit(graph, diagnostics, &mut worklist, id, initial_time, time_step, time_node);
    }

    if graph.node(initial_time).ty != NodeType::Constant {
        diagnostics.error(graph.node(initial_time).usages.clone(), "INITIAL TIME is not constant");
    }
    if graph.node(time_step).ty != NodeType::Constant {
        diagnostics.error(graph.node(time_step).usages.clone(), "TIME STEP is not constant");
    }
    if graph.node(final_time).ty != NodeType::Constant {
        diagnostics.error(graph.node(final_time).usages.clone(), "FINAL TIME is not constant");
    }

    if diagnostics.has_errors() {
        return Err(GraphError::Fatal(diagnostics.render()));
    }
    Ok(())
}

fn child_of(graph: &ExpressionGraph, id: NodeId, i: usize) -> NodeId {
    graph.node(id).children[i].expect("operator missing a required child")
}

/// Joins names the way the RAMP diagnostic's original wording does:
/// `"one"`, `"one and two"`, `"one, two and three"` — a comma between every
/// pair but the last, which gets "and" instead.
fn join_with_and(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => (*only).to_string(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

/// A cheap snapshot of the classification fields a parent reads off one of
/// its children. All four fields are `Copy`; taking this by value rather
/// than holding a `&NodeData` borrow lets callers immediately follow up
/// with a `graph.node_mut(id)` on the parent without fighting the borrow
/// checker.
#[derive(Clone, Copy)]
struct Summary {
    ty: NodeType,
    init: InitialType,
    level: u32,
    value: Option<f64>,
}

fn summary(graph: &ExpressionGraph, id: NodeId) -> Summary {
    let n = graph.node(id);
    Summary {
        ty: n.ty,
        init: n.init,
        level: n.level,
        value: n.value,
    }
}

/// Dispatches a single worklist visit. Every arm either finalizes `id`
/// (setting its `ty`/`init`/`level`/`value` and popping it) or pushes
/// unresolved children and returns with `id` still at the back of the
/// deque, to be revisited once those children are classified.
fn visit(
    graph: &mut ExpressionGraph,
    diagnostics: &mut Diagnostics,
    worklist: &mut VecDeque<NodeId>,
    id: NodeId,
    initial_time: NodeId,
    time_step: NodeId,
    time_node: NodeId,
) {
    let op = graph.node(id).op;

    match op {
        Operator::Integ => {
            let rate = child_of(graph, id, 0);
            let init_expr = child_of(graph, id, 1);
            if graph.node(init_expr).init == InitialType::UnknownInit {
                worklist.push_back(init_expr);
                return;
            }
            let init_level = graph.node(init_expr).level;
            let init = graph.node(init_expr).init;
            let value = graph.node(init_expr).value;
            let n = graph.node_mut(id);
            n.ty = NodeType::Dynamic;
            n.level = init_level + 1;
            n.init = init;
            if init == InitialType::ConstantInit {
                n.value = value;
            }
            worklist.pop_back();
            worklist.push_front(rate);
        }

        Operator::If => {
            let (c1, c2, c3) = (child_of(graph, id, 0), child_of(graph, id, 1), child_of(graph, id, 2));
            let (n1, n2, n3) = (summary(graph, c1), summary(graph, c2), summary(graph, c3));
            let ty = n1.ty.lub(n2.ty).lub(n3.ty);
            let init = n1.init.lub(n2.init).lub(n3.init);
            let level = n1.level.max(n2.level).max(n3.level) + 1;

            match ty {
                NodeType::Dynamic | NodeType::Static | NodeType::Constant => {
                    let mut value = None;
                    if init == InitialType::ConstantInit {
                        value = Some(if n1.value.unwrap_or(0.0) != 0.0 {
                            n2.value.unwrap_or(0.0)
                        } else {
                            n3.value.unwrap_or(0.0)
                        });
                    }
                    let n = graph.node_mut(id);
                    n.ty = ty;
                    n.init = init;
                    n.level = level;
                    n.value = value;
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    worklist.push_back(c3);
                    worklist.push_back(c2);
                    worklist.push_back(c1);
                }
            }
        }

        Operator::ActiveInitial => {
            let c1 = child_of(graph, id, 0);
            let c2 = child_of(graph, id, 1);
            let s1 = summary(graph, c1);
            let s2 = summary(graph, c2);
            let ty = s2.ty.lub(s1.ty);
            let init = s2.init;

            {
                let n = graph.node_mut(id);
                n.ty = ty;
                n.init = init;
                n.level = s2.level;
            }

            if init == InitialType::UnknownInit {
                worklist.push_back(c2);
                return;
            }

            match ty {
                NodeType::Dynamic | NodeType::Static => {
                    let value = if init == InitialType::ConstantInit { s2.value } else { None };
                    let n = graph.node_mut(id);
                    n.value = value;
                    n.level = (s1.level + 1).max(s2.level);
                    worklist.pop_back();
                }
                NodeType::Constant => {
                    diagnostics.error(
                        graph.node(id).usages.clone(),
                        "Use of ACTIVE INITIAL while active equation is constant.",
                    );
                    let n = graph.node_mut(id);
                    n.level = (s1.level + 1).max(s2.level);
                    n.value = s1.value;
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    worklist.pop_back();
                    worklist.push_front(c1);
                    worklist.push_front(id);
                }
            }
        }

        Operator::Initial => {
            let c1 = child_of(graph, id, 0);
            let s1 = summary(graph, c1);
            if s1.init == InitialType::UnknownInit {
                worklist.push_back(c1);
                return;
            }
            let n = graph.node_mut(id);
            n.level = s1.level;
            if s1.init == InitialType::ConstantInit {
                n.ty = NodeType::Constant;
                n.init = InitialType::ConstantInit;
                // The reference implementation adds a stray `+ 1` here; dropped.
                n.value = s1.value;
            } else {
                n.ty = NodeType::Dynamic;
                n.init = InitialType::ControlledInit;
            }
            worklist.pop_back();
        }

        Operator::DelayFixed => {
            let (c1, c2, c3) = (child_of(graph, id, 0), child_of(graph, id, 1), child_of(graph, id, 2));
            let (s1, s2, s3) = (
                summary(graph, c1),
                summary(graph, c2),
                summary(graph, c3),
            );

            let ty = if s3.ty == NodeType::Unknown {
                NodeType::Unknown
            } else {
                s1.ty.lub(s2.ty).lub(NodeType::Static)
            };

            if ty != NodeType::Unknown {
                graph.node_mut(id).init = s3.init;
                if s1.ty == NodeType::Constant {
                    diagnostics.warning(
                        graph.node(id).usages.clone(),
                        "DELAY FIXED used with constant input. Consider using STEP instead.",
                    );
                }
                if s2.ty != NodeType::Constant {
                    diagnostics.warning(
                        graph.node(id).usages.clone(),
                        "DELAY FIXED used with non constant delay time. Only initial value will be used.",
                    );
                }
            }

            match ty {
                NodeType::Dynamic | NodeType::Static => {
                    let level = s1.level.max(s2.level).max(s3.level).max(graph.node(time_node).level) + 1;
                    let init = graph.node(id).init;
                    let n = graph.node_mut(id);
                    n.ty = ty;
                    n.level = level;
                    if init == InitialType::ConstantInit {
                        n.value = s3.value;
                    }
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    worklist.push_back(c3);
                    worklist.push_back(c2);
                    worklist.push_back(c1);
                }
                NodeType::Constant => unreachable!("DELAY_FIXED never resolves to CONSTANT"),
            }
        }

        Operator::Pulse => {
            let c1 = child_of(graph, id, 0);
            let c2 = child_of(graph, id, 1);
            let s1 = summary(graph, c1);
            let s2 = summary(graph, c2);
            let ty = s1.ty.lub(s2.ty).lub(NodeType::Static);
            let init = s1.init.lub(s2.init);

            match ty {
                NodeType::Dynamic | NodeType::Static => {
                    if ty == NodeType::Dynamic {
                        diagnostics.error(graph.node(id).usages.clone(), "Using PULSE with non constant arguments");
                    }
                    let level = s1.level.max(s2.level).max(graph.node(time_node).level) + 1;
                    let mut value = None;
                    if init == InitialType::ConstantInit {
                        let it = graph.node(initial_time).value.unwrap_or(0.0);
                        let ts = graph.node(time_step).value.unwrap_or(0.0);
                        let time_plus = it + 0.5 * ts;
                        let start = s1.value.unwrap_or(0.0);
                        let width = s2.value.unwrap_or(0.0);
                        value = Some(if time_plus > start && time_plus < start + width { 1.0 } else { 0.0 });
                    }
                    let n = graph.node_mut(id);
                    n.ty = ty;
                    n.init = init;
                    n.level = level;
                    n.value = value;
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    graph.node_mut(id).init = init;
                    worklist.push_back(c2);
                    worklist.push_back(c1);
                }
                NodeType::Constant => unreachable!("PULSE never resolves to CONSTANT"),
            }
        }

        Operator::PulseTrain => {
            let start = child_of(graph, id, 0);
            let width = child_of(graph, id, 1);
            let tbetween = child_of(graph, id, 2);
            let end = child_of(graph, id, 3);
            let (ss, sw, st, se) = (
                summary(graph, start),
                summary(graph, width),
                summary(graph, tbetween),
                summary(graph, end),
            );
            let ty = ss.ty.lub(sw.ty).lub(st.ty).lub(se.ty).lub(NodeType::Static);
            let init = ss.init.lub(sw.init).lub(st.init).lub(se.init);

            match ty {
                NodeType::Dynamic | NodeType::Static => {
                    if ty == NodeType::Dynamic {
                        diagnostics.error(graph.node(id).usages.clone(), "Using PULSE TRAIN with non constant arguments");
                    }
                    let level = ss.level.max(sw.level).max(st.level).max(se.level).max(graph.node(time_node).level) + 1;
                    let mut value = None;
                    if init == InitialType::ConstantInit {
                        let it = graph.node(initial_time).value.unwrap_or(0.0);
                        let ts = graph.node(time_step).value.unwrap_or(0.0);
                        let time_plus = it + 0.5 * ts;
                        let start_v = ss.value.unwrap_or(0.0);
                        let width_v = sw.value.unwrap_or(0.0);
                        let tbetween_v = st.value.unwrap_or(0.0);
                        let end_v = se.value.unwrap_or(0.0);
                        value = Some(if tbetween_v < width_v {
                            if time_plus > start_v && time_plus < end_v { 1.0 } else { 0.0 }
                        } else if time_plus > start_v && time_plus < start_v + width_v {
                            1.0
                        } else {
                            0.0
                        });
                    }
                    let n = graph.node_mut(id);
                    n.ty = ty;
                    n.init = init;
                    n.level = level;
                    n.value = value;
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    graph.node_mut(id).init = init;
                    worklist.push_back(end);
                    worklist.push_back(tbetween);
                    worklist.push_back(width);
                    worklist.push_back(start);
                }
                NodeType::Constant => unreachable!("PULSE_TRAIN never resolves to CONSTANT"),
            }
        }

        Operator::Step => {
            let c1 = child_of(graph, id, 0);
            let c2 = child_of(graph, id, 1);
            let s1 = summary(graph, c1);
            let s2 = summary(graph, c2);
            let ty = s1.ty.lub(s2.ty).lub(NodeType::Static);
            let it = graph.node(initial_time).value.unwrap_or(0.0);

            if ty != NodeType::Unknown {
                let (mut init, mut value) = (graph.node(id).init, graph.node(id).value);
                if s2.ty != NodeType::Constant {
                    diagnostics.error(graph.node(id).usages.clone(), "STEP used with non constant step time");
                } else if s2.value.unwrap_or(0.0) <= it {
                    diagnostics.warning(
                        graph.node(id).usages.clone(),
                        "Usage of STEP has no effect because step time is at or before initial time",
                    );
                    init = s1.init;
                    if init == InitialType::ConstantInit {
                        value = s1.value;
                    }
                } else {
                    init = InitialType::ConstantInit;
                    value = Some(0.0);
                }
                let n = graph.node_mut(id);
                n.init = init;
                n.value = value;
            }

            match ty {
                NodeType::Dynamic | NodeType::Static => {
                    let level = s1.level.max(s2.level).max(graph.node(time_node).level) + 1;
                    let n = graph.node_mut(id);
                    n.ty = ty;
                    n.level = level;
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    worklist.push_back(c2);
                    worklist.push_back(c1);
                }
                NodeType::Constant => unreachable!("STEP never resolves to CONSTANT"),
            }
        }

        Operator::Ramp => {
            let (c1, c2, c3) = (child_of(graph, id, 0), child_of(graph, id, 1), child_of(graph, id, 2));
            let (s1, s2, s3) = (
                summary(graph, c1),
                summary(graph, c2),
                summary(graph, c3),
            );
            let ty = s1.ty.lub(s2.ty).lub(s3.ty).lub(NodeType::Static);

            if ty != NodeType::Unknown {
                let non_const: Vec<&str> = [
                    (s1.ty != NodeType::Constant, "one"),
                    (s2.ty != NodeType::Constant, "two"),
                    (s3.ty != NodeType::Constant, "three"),
                ]
                .into_iter()
                .filter_map(|(bad, name)| bad.then_some(name))
                .collect();

                if !non_const.is_empty() {
                    let msg = format!("Use of RAMP with argument{} {} not constant",
                        if non_const.len() > 1 { "s" } else { "" },
                        join_with_and(&non_const));
                    diagnostics.error(graph.node(id).usages.clone(), msg);
                }

                let level = s1.level.max(s2.level).max(s3.level).max(graph.node(time_node).level) + 1;
                let n = graph.node_mut(id);
                n.ty = ty;
                n.init = InitialType::ConstantInit;
                n.value = Some(0.0);
                n.level = level;
                worklist.pop_back();
                return;
            }

            worklist.push_back(c3);
            worklist.push_back(c2);
            worklist.push_back(c1);
        }

        Operator::RandomUniform => {
            let c1 = child_of(graph, id, 0);
            let c2 = child_of(graph, id, 1);
            let s1 = summary(graph, c1);
            let s2 = summary(graph, c2);
            let ty = s1.ty.lub(s2.ty).lub(NodeType::Static);

            match ty {
                NodeType::Dynamic | NodeType::Static => {
                    if ty == NodeType::Dynamic {
                        diagnostics.error(graph.node(id).usages.clone(), "RANDOM UNIFORM used with non constant arguments.");
                    }
                    let level = s1.level.max(s2.level) + 1;
                    let lower = s1.value.unwrap_or(0.0);
                    let upper = s2.value.unwrap_or(0.0);
                    let value = rand::thread_rng().gen_range(lower..=upper.max(lower));
                    let n = graph.node_mut(id);
                    n.ty = ty;
                    n.init = InitialType::ConstantInit;
                    n.level = level;
                    n.value = Some(value);
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    worklist.push_back(c2);
                    worklist.push_back(c1);
                }
                NodeType::Constant => unreachable!("RANDOM_UNIFORM never resolves to CONSTANT"),
            }
        }

        Operator::Time => {
            let it = graph.node(initial_time).value.unwrap_or(0.0);
            let n = graph.node_mut(id);
            n.ty = NodeType::Static;
            n.init = InitialType::ConstantInit;
            n.level = 1;
            n.value = Some(it);
            worklist.pop_back();
        }

        Operator::Control => {
            let n = graph.node_mut(id);
            n.ty = NodeType::Dynamic;
            n.init = InitialType::ControlledInit;
            n.level = 0;
            worklist.pop_back();
        }

        Operator::ApplyLookup => {
            let table_node = child_of(graph, id, 0);
            let arg = child_of(graph, id, 1);
            if graph.node(table_node).op != Operator::LookupTable {
                diagnostics.error(graph.node(table_node).usages.clone(), "Symbol not a lookup table");
            }
            let s2 = summary(graph, arg);

            match s2.ty {
                NodeType::Dynamic | NodeType::Static => {
                    let level = s2.level + 1;
                    let mut value = None;
                    if s2.init == InitialType::ConstantInit {
                        if let Some(table_id) = graph.node(table_node).lookup_table {
                            value = Some(graph.lookup_table(table_id).eval(s2.value.unwrap_or(0.0)));
                        }
                    }
                    let n = graph.node_mut(id);
                    n.ty = s2.ty;
                    n.init = s2.init;
                    n.level = level;
                    n.value = value;
                    worklist.pop_back();
                }
                NodeType::Unknown => {
                    worklist.push_back(arg);
                }
                NodeType::Constant => {
                    let level = s2.level + 1;
                    let value = graph
                        .node(table_node)
                        .lookup_table
                        .map(|t| graph.lookup_table(t).eval(s2.value.unwrap_or(0.0)));
                    let n = graph.node_mut(id);
                    n.ty = s2.ty;
                    n.init = s2.init;
                    n.level = level;
                    n.value = value;
                    worklist.pop_back();
                }
            }
        }

        Operator::Nil => {
            let sym = graph.symbols_for(id).first().cloned();
            let msg = match sym {
                Some(s) => format!("Use of undefined symbol '{s}'"),
                None => "Something has gone terribly wrong. NIL node found but it has no symbol attached".to_string(),
            };
            diagnostics.error(graph.node(id).usages.clone(), msg);
            let n = graph.node_mut(id);
            n.ty = NodeType::Constant;
            n.init = InitialType::ConstantInit;
            n.value = Some(0.0);
            n.level = 0;
            worklist.pop_back();
        }

        Operator::Constant | Operator::LookupTable => {
            unreachable!("{op:?} is classified at construction time, never reaches the worklist");
        }

        // Plain binary arithmetic/comparison/boolean operators: classify
        // by LUB, fold `value` with `fold` when both children are known
        // and `init` resolves to `ConstantInit`.
        Operator::Plus => binary(graph, worklist, id, |a, b| a + b),
        Operator::Minus => binary(graph, worklist, id, |a, b| a - b),
        Operator::Mult => binary(graph, worklist, id, |a, b| a * b),
        Operator::Div => binary(graph, worklist, id, |a, b| a / b),
        Operator::Power => binary(graph, worklist, id, f64::powf),
        Operator::Log => binary(graph, worklist, id, |a, b| a.ln() / b.ln()),
        Operator::Modulo => binary(graph, worklist, id, |a, b| a - b * (a / b).floor()),
        Operator::Min => binary(graph, worklist, id, f64::min),
        Operator::Max => binary(graph, worklist, id, f64::max),
        Operator::G => binary(graph, worklist, id, |a, b| bool_f64(a > b)),
        Operator::Ge => binary(graph, worklist, id, |a, b| bool_f64(a >= b)),
        Operator::L => binary(graph, worklist, id, |a, b| bool_f64(a < b)),
        Operator::Le => binary(graph, worklist, id, |a, b| bool_f64(a <= b)),
        Operator::Eq => binary(graph, worklist, id, |a, b| bool_f64(a == b)),
        Operator::Neq => binary(graph, worklist, id, |a, b| bool_f64(a != b)),
        Operator::And => binary(graph, worklist, id, |a, b| bool_f64(a != 0.0 && b != 0.0)),
        Operator::Or => binary(graph, worklist, id, |a, b| bool_f64(a != 0.0 || b != 0.0)),

        // Plain unary operators: classify by passthrough, fold with `fold`.
        Operator::UMinus => unary(graph, worklist, id, |a| -a),
        Operator::Sqrt => unary(graph, worklist, id, f64::sqrt),
        Operator::Exp => unary(graph, worklist, id, f64::exp),
        Operator::Ln => unary(graph, worklist, id, f64::ln),
        Operator::Abs => unary(graph, worklist, id, f64::abs),
        Operator::Integer => unary(graph, worklist, id, f64::floor),
        Operator::Not => unary(graph, worklist, id, |a| bool_f64(a == 0.0)),
        Operator::Sin => unary(graph, worklist, id, f64::sin),
        Operator::Cos => unary(graph, worklist, id, f64::cos),
        Operator::Tan => unary(graph, worklist, id, f64::tan),
        Operator::Arcsin => unary(graph, worklist, id, f64::asin),
        Operator::Arccos => unary(graph, worklist, id, f64::acos),
        Operator::Arctan => unary(graph, worklist, id, f64::atan),
        Operator::Sinh => unary(graph, worklist, id, f64::sinh),
        Operator::Cosh => unary(graph, worklist, id, f64::cosh),
        Operator::Tanh => unary(graph, worklist, id, f64::tanh),
    }
}

fn bool_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Shared fold tail for the plain binary operators (`PLUS`, `G`, `AND`, ...):
/// `type`/`init` are the LUB of both children; `level` is one past their
/// max; `value` folds via `fold` once `init` is `ConstantInit`. Replaces
/// the reference implementation's labelled-fallthrough-into-CONSTANT_NODE
/// idiom with a plain function.
fn binary(graph: &mut ExpressionGraph, worklist: &mut VecDeque<NodeId>, id: NodeId, fold: impl Fn(f64, f64) -> f64) {
    let c1 = child_of(graph, id, 0);
    let c2 = child_of(graph, id, 1);
    let s1 = summary(graph, c1);
    let s2 = summary(graph, c2);
    let ty = s1.ty.lub(s2.ty);
    let init = s1.init.lub(s2.init);

    if ty == NodeType::Unknown {
        worklist.push_back(c2);
        worklist.push_back(c1);
        return;
    }

    let level = s1.level.max(s2.level) + 1;
    let value = (init == InitialType::ConstantInit)
        .then(|| fold(s1.value.unwrap_or(0.0), s2.value.unwrap_or(0.0)));
    let n = graph.node_mut(id);
    n.ty = ty;
    n.init = init;
    n.level = level;
    n.value = value;
    worklist.pop_back();
}

/// Shared fold tail for the plain unary operators (`UMINUS`, `SIN`, ...).
fn unary(graph: &mut ExpressionGraph, worklist: &mut VecDeque<NodeId>, id: NodeId, fold: impl Fn(f64) -> f64) {
    let c1 = child_of(graph, id, 0);
    let s1 = summary(graph, c1);

    if s1.ty == NodeType::Unknown {
        worklist.push_back(c1);
        return;
    }

    let level = s1.level + 1;
    let value = (s1.init == InitialType::ConstantInit).then(|| fold(s1.value.unwrap_or(0.0)));
    let n = graph.node_mut(id);
    n.ty = s1.ty;
    n.init = s1.init;
    n.level = level;
    n.value = value;
    worklist.pop_back();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::location::{FileLocation, Location};

    fn bind(graph: &mut ExpressionGraph, name: &str, node: NodeId) {
        graph.add_symbol(Symbol::intern(name), node, None);
    }

    fn seed_time(graph: &mut ExpressionGraph) {
        let it = graph.constant(0.0);
        let ft = graph.constant(10.0);
        let ts = graph.constant(0.5);
        bind(graph, "INITIAL TIME", it);
        bind(graph, "FINAL TIME", ft);
        bind(graph, "TIME STEP", ts);
    }

    #[test]
    fn constant_plus_constant_folds_to_a_constant() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph);
        let a = graph.constant(2.0);
        let b = graph.constant(3.0);
        let sum = graph.binary(Operator::Plus, a, b);
        bind(&mut graph, "total", sum);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert_eq!(graph.node(sum).ty, NodeType::Constant);
        assert_eq!(graph.node(sum).value, Some(5.0));
    }

    #[test]
    fn integ_does_not_block_on_its_rate_expression() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph);
        let initial = graph.constant(0.0);
        // The rate expression references the stock itself through a NIL
        // forward reference, which INTEG must not wait on to classify.
        let stock_ref = graph.node_for(Symbol::intern("stock"));
        let rate = graph.unary(Operator::UMinus, stock_ref);
        let integ = graph.binary(Operator::Integ, rate, initial);
        bind(&mut graph, "stock", integ);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert_eq!(graph.node(integ).ty, NodeType::Dynamic);
        assert_eq!(graph.node(integ).init, InitialType::ConstantInit);
        assert_eq!(graph.node(integ).value, Some(0.0));
    }

    #[test]
    fn undefined_symbol_is_reported_as_an_error() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph);
        let dangling = graph.node_for(Symbol::intern("ghost"));
        let loc = FileLocation::new("m.mdl", Location::new(3, 1));
        graph.add_symbol(Symbol::intern("ghost"), dangling, Some(loc));

        let mut diag = Diagnostics::new();
        let result = analyze(&mut graph, &mut diag);
        assert!(result.is_err());
        assert!(diag.has_errors());
    }

    #[test]
    fn if_folds_the_taken_branch_only() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph);
        let cond = graph.constant(1.0);
        let then_v = graph.constant(10.0);
        let else_v = graph.constant(20.0);
        let if_node = graph.ternary(Operator::If, cond, then_v, else_v);
        bind(&mut graph, "chosen", if_node);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();
        assert_eq!(graph.node(if_node).value, Some(10.0));
    }

    #[test]
    fn pulse_train_uses_tbetween_vs_width_branch() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph);
        let start = graph.constant(1.0);
        let width = graph.constant(1.0);
        let tbetween = graph.constant(0.5);
        let end = graph.constant(5.0);
        let pt = graph.pulse_train(start, width, tbetween, end);
        bind(&mut graph, "train", pt);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();
        assert_eq!(graph.node(pt).ty, NodeType::Static);
        assert!(graph.node(pt).value.is_some());
    }

    #[test]
    fn random_uniform_folds_a_value_within_bounds() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph);
        let lo = graph.constant(1.0);
        let hi = graph.constant(2.0);
        let r = graph.nullary(Operator::RandomUniform);
        graph.node_mut(r).children[0] = Some(lo);
        graph.node_mut(r).children[1] = Some(hi);
        bind(&mut graph, "roll", r);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();
        let v = graph.node(r).value.unwrap();
        assert!((1.0..=2.0).contains(&v));
    }
}
