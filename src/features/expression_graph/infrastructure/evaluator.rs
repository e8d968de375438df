//! The non-recursive static Evaluator.
//!
//! Computes one `f64` for one node at one instant `time`, given that the
//! graph has already been through the Analyzer. Recursion is replaced by an
//! explicit `Frame` stack: a node is represented by a `Visit` frame that
//! pushes its children's `Visit` frames plus a trailing "combine" frame for
//! itself, so the combine frame only runs once every child's value is
//! already sitting on the value stack. This is the same non-recursive shape
//! as the reference evaluator, without replicating its stack-offset
//! bookkeeping.

use rand::Rng;

use crate::errors::GraphError;
use crate::shared::models::symbol::Symbol;

use super::super::domain::graph::ExpressionGraph;
use super::super::domain::node::{LookupTableId, NodeId, NodeType};
use super::super::domain::operator::Operator;

/// A unit of pending work. `Visit` dispatches on a node's operator; the
/// other variants are continuations pushed by `Visit` to run once their
/// operand(s) have been evaluated and are waiting on the value stack.
enum Frame {
    Visit(NodeId),
    IfTaken(NodeId, NodeId),
    BinaryOp(Operator),
    UnaryOp(Operator),
    PulseCombine,
    PulseTrainCombine,
    StepCombine,
    RampCombine,
    RandomUniformCombine,
    ApplyLookupCombine(LookupTableId),
}

/// Evaluates `id` at simulation time `time`. `initial` selects which branch
/// of an `ACTIVE_INITIAL` node is taken (`true` during the initial-value
/// pass, `false` once the simulation is running) — this mirrors the
/// reference evaluator's `initial` parameter exactly, since it is not
/// something the graph itself can recover from `time` alone.
pub fn evaluate(graph: &ExpressionGraph, id: NodeId, time: f64, initial: bool) -> Result<f64, GraphError> {
    if graph.node(id).ty == NodeType::Unknown {
        return Err(GraphError::NotAnalyzed);
    }

    let time_step_id = graph
        .symbol_node(&Symbol::intern("TIME STEP"))
        .ok_or(GraphError::NotAnalyzed)?;
    let time_step = graph.node(time_step_id).value.ok_or(GraphError::NotAnalyzed)?;
    let time_plus = time + time_step * 0.5;

    let mut stack = vec![Frame::Visit(id)];
    let mut vals: Vec<f64> = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Visit(node_id) => visit(graph, &mut stack, &mut vals, node_id, time, initial)?,

            Frame::IfTaken(then_id, else_id) => {
                let cond = vals.pop().expect("IF combine runs after its condition is evaluated");
                let chosen = if cond != 0.0 { then_id } else { else_id };
                stack.push(Frame::Visit(chosen));
            }

            Frame::BinaryOp(op) => {
                let b = vals.pop().expect("binary combine runs after both operands are evaluated");
                let a = vals.pop().expect("binary combine runs after both operands are evaluated");
                vals.push(fold_binary(op, a, b));
            }

            Frame::UnaryOp(op) => {
                let a = vals.pop().expect("unary combine runs after its operand is evaluated");
                vals.push(fold_unary(op, a));
            }

            Frame::PulseCombine => {
                let width = vals.pop().expect("PULSE combine runs after start and width are evaluated");
                let start = vals.pop().expect("PULSE combine runs after start and width are evaluated");
                let width = width.max(time_step);
                let v = if time_plus > start && time_plus < start + width { 1.0 } else { 0.0 };
                vals.push(v);
            }

            Frame::PulseTrainCombine => {
                let end = vals.pop().expect("PULSE_TRAIN combine runs after all four arguments are evaluated");
                let tbetween = vals.pop().expect("PULSE_TRAIN combine runs after all four arguments are evaluated");
                let width = vals.pop().expect("PULSE_TRAIN combine runs after all four arguments are evaluated").max(time_step);
                let start = vals.pop().expect("PULSE_TRAIN combine runs after all four arguments are evaluated");
                let v = if time_plus < start || end < time_plus {
                    0.0
                } else if tbetween < width {
                    1.0
                } else {
                    let tmodplus = time_plus % tbetween;
                    let smod = start % tbetween;
                    if tmodplus > smod && tmodplus < smod + width { 1.0 } else { 0.0 }
                };
                vals.push(v);
            }

            Frame::StepCombine => {
                let step_time = vals.pop().expect("STEP combine runs after height and step time are evaluated");
                let height = vals.pop().expect("STEP combine runs after height and step time are evaluated");
                vals.push(if time_plus > step_time { height } else { 0.0 });
            }

            Frame::RampCombine => {
                let end_time = vals.pop().expect("RAMP combine runs after all three arguments are evaluated");
                let start_time = vals.pop().expect("RAMP combine runs after all three arguments are evaluated");
                let slope = vals.pop().expect("RAMP combine runs after all three arguments are evaluated");
                let v = if time > start_time {
                    if time < end_time { slope * (time - start_time) } else { slope * (end_time - start_time) }
                } else {
                    0.0
                };
                vals.push(v);
            }

            Frame::RandomUniformCombine => {
                let upper = vals.pop().expect("RANDOM_UNIFORM combine runs after both bounds are evaluated");
                let lower = vals.pop().expect("RANDOM_UNIFORM combine runs after both bounds are evaluated");
                vals.push(rand::thread_rng().gen_range(lower..=upper.max(lower)));
            }

            Frame::ApplyLookupCombine(table_id) => {
                let arg = vals.pop().expect("APPLY_LOOKUP combine runs after its argument is evaluated");
                vals.push(graph.lookup_table(table_id).eval(arg));
            }
        }
    }

    debug_assert_eq!(vals.len(), 1, "evaluate must leave exactly one value on the stack");
    vals.pop().ok_or(GraphError::NotAnalyzed)
}

fn child_of(graph: &ExpressionGraph, id: NodeId, i: usize) -> NodeId {
    graph.node(id).children[i].expect("operator missing a required child")
}

/// Dispatches a single `Visit` frame: pushes whatever continuation and
/// child `Visit` frames are needed for `id`'s operator, in the order that
/// leaves its operands on `vals` in evaluation order once they run.
fn visit(
    graph: &ExpressionGraph,
    stack: &mut Vec<Frame>,
    vals: &mut Vec<f64>,
    id: NodeId,
    time: f64,
    initial: bool,
) -> Result<(), GraphError> {
    let op = graph.node(id).op;

    match op {
        Operator::Constant => {
            vals.push(graph.node(id).value.expect("CONSTANT always carries a folded value"));
        }
        Operator::Initial => {
            vals.push(graph.node(id).value.expect("INITIAL is constant-folded by the Analyzer"));
        }
        Operator::Time => vals.push(time),

        Operator::Control | Operator::LookupTable | Operator::Nil | Operator::Integ => {
            unreachable!("{op:?} is never evaluated directly; only read as a state value by the simulation driver");
        }

        Operator::DelayFixed => return Err(GraphError::DelayFixedUnsupported),

        Operator::ActiveInitial => {
            // `initial` is a caller-supplied flag, not a data dependency:
            // unlike IF, the branch is known before either child runs.
            let ongoing = child_of(graph, id, 0);
            let at_start = child_of(graph, id, 1);
            stack.push(Frame::Visit(if initial { at_start } else { ongoing }));
        }

        Operator::If => {
            let cond = child_of(graph, id, 0);
            let then_branch = child_of(graph, id, 1);
            let else_branch = child_of(graph, id, 2);
            stack.push(Frame::IfTaken(then_branch, else_branch));
            stack.push(Frame::Visit(cond));
        }

        Operator::Pulse => {
            let start = child_of(graph, id, 0);
            let width = child_of(graph, id, 1);
            stack.push(Frame::PulseCombine);
            stack.push(Frame::Visit(width));
            stack.push(Frame::Visit(start));
        }

        Operator::PulseTrain => {
            let start = child_of(graph, id, 0);
            let width = child_of(graph, id, 1);
            let tbetween = child_of(graph, id, 2);
            let end = child_of(graph, id, 3);
            stack.push(Frame::PulseTrainCombine);
            stack.push(Frame::Visit(end));
            stack.push(Frame::Visit(tbetween));
            stack.push(Frame::Visit(width));
            stack.push(Frame::Visit(start));
        }

        Operator::Step => {
            let height = child_of(graph, id, 0);
            let step_time = child_of(graph, id, 1);
            stack.push(Frame::StepCombine);
            stack.push(Frame::Visit(step_time));
            stack.push(Frame::Visit(height));
        }

        Operator::Ramp => {
            let slope = child_of(graph, id, 0);
            let start_time = child_of(graph, id, 1);
            let end_time = child_of(graph, id, 2);
            stack.push(Frame::RampCombine);
            stack.push(Frame::Visit(end_time));
            stack.push(Frame::Visit(start_time));
            stack.push(Frame::Visit(slope));
        }

        Operator::RandomUniform => {
            let lower = child_of(graph, id, 0);
            let upper = child_of(graph, id, 1);
            stack.push(Frame::RandomUniformCombine);
            stack.push(Frame::Visit(upper));
            stack.push(Frame::Visit(lower));
        }

        Operator::ApplyLookup => {
            let table_node = child_of(graph, id, 0);
            let arg = child_of(graph, id, 1);
            let table_id = graph
                .node(table_node)
                .lookup_table
                .expect("APPLY_LOOKUP's first child must be a LOOKUP_TABLE node");
            stack.push(Frame::ApplyLookupCombine(table_id));
            stack.push(Frame::Visit(arg));
        }

        Operator::Plus
        | Operator::Minus
        | Operator::Mult
        | Operator::Div
        | Operator::Power
        | Operator::Log
        | Operator::Modulo
        | Operator::Min
        | Operator::Max
        | Operator::G
        | Operator::Ge
        | Operator::L
        | Operator::Le
        | Operator::Eq
        | Operator::Neq
        | Operator::And
        | Operator::Or => {
            let c1 = child_of(graph, id, 0);
            let c2 = child_of(graph, id, 1);
            stack.push(Frame::BinaryOp(op));
            stack.push(Frame::Visit(c2));
            stack.push(Frame::Visit(c1));
        }

        Operator::UMinus
        | Operator::Sqrt
        | Operator::Exp
        | Operator::Ln
        | Operator::Abs
        | Operator::Integer
        | Operator::Not
        | Operator::Sin
        | Operator::Cos
        | Operator::Tan
        | Operator::Arcsin
        | Operator::Arccos
        | Operator::Arctan
        | Operator::Sinh
        | Operator::Cosh
        | Operator::Tanh => {
            let c1 = child_of(graph, id, 0);
            stack.push(Frame::UnaryOp(op));
            stack.push(Frame::Visit(c1));
        }
    }

    Ok(())
}

fn bool_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Runtime fold for the plain binary operators. `MODULO` here is
/// `std::fmod` semantics (Rust's `%` on `f64`), deliberately different from
/// the Analyzer's constant fold (`a - b * (a / b).floor()`): the reference
/// implementation uses the two formulas in exactly those two places, and
/// nothing in either context needs them to agree.
fn fold_binary(op: Operator, a: f64, b: f64) -> f64 {
    match op {
        Operator::Plus => a + b,
        Operator::Minus => a - b,
        Operator::Mult => a * b,
        Operator::Div => a / b,
        Operator::Power => a.powf(b),
        Operator::Log => a.ln() / b.ln(),
        Operator::Modulo => a % b,
        Operator::Min => a.min(b),
        Operator::Max => a.max(b),
        Operator::G => bool_f64(a > b),
        Operator::Ge => bool_f64(a >= b),
        Operator::L => bool_f64(a < b),
        Operator::Le => bool_f64(a <= b),
        Operator::Eq => bool_f64(a == b),
        Operator::Neq => bool_f64(a != b),
        Operator::And => bool_f64(a != 0.0 && b != 0.0),
        Operator::Or => bool_f64(a != 0.0 || b != 0.0),
        _ => unreachable!("fold_binary called with a non-binary operator"),
    }
}

fn fold_unary(op: Operator, a: f64) -> f64 {
    match op {
        Operator::UMinus => -a,
        Operator::Sqrt => a.sqrt(),
        Operator::Exp => a.exp(),
        Operator::Ln => a.ln(),
        Operator::Abs => a.abs(),
        Operator::Integer => a.floor(),
        Operator::Not => bool_f64(a == 0.0),
        Operator::Sin => a.sin(),
        Operator::Cos => a.cos(),
        Operator::Tan => a.tan(),
        Operator::Arcsin => a.asin(),
        Operator::Arccos => a.acos(),
        Operator::Arctan => a.atan(),
        Operator::Sinh => a.sinh(),
        Operator::Cosh => a.cosh(),
        Operator::Tanh => a.tanh(),
        _ => unreachable!("fold_unary called with a non-unary operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::diagnostics::domain::bag::Diagnostics;
    use crate::features::expression_graph::application::analyzer::analyze;

    fn bind(graph: &mut ExpressionGraph, name: &str, node: NodeId) {
        graph.add_symbol(Symbol::intern(name), node, None);
    }

    fn seed_time(graph: &mut ExpressionGraph, step: f64) {
        let it = graph.constant(0.0);
        let ft = graph.constant(10.0);
        let ts = graph.constant(step);
        bind(graph, "INITIAL TIME", it);
        bind(graph, "FINAL TIME", ft);
        bind(graph, "TIME STEP", ts);
    }

    #[test]
    fn constant_expression_evaluates_to_its_folded_value() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph, 0.5);
        let a = graph.constant(2.0);
        let b = graph.constant(3.0);
        let sum = graph.binary(Operator::Plus, a, b);
        bind(&mut graph, "total", sum);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert_eq!(evaluate(&graph, sum, 0.0, false).unwrap(), 5.0);
    }

    #[test]
    fn if_picks_branch_by_runtime_condition_not_fold() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph, 0.5);
        let time = graph.time_node();
        let threshold = graph.constant(3.0);
        let cond = graph.binary(Operator::G, time, threshold);
        let then_v = graph.constant(10.0);
        let else_v = graph.constant(20.0);
        let if_node = graph.ternary(Operator::If, cond, then_v, else_v);
        bind(&mut graph, "chosen", if_node);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        // The Analyzer folds `value` using TIME's *initial* value (0.0, so
        // the else branch), since folding happens once, before any real
        // simulation time exists. `evaluate` must ignore that stale fold
        // and re-run `cond` against the real runtime `time` every call.
        assert_eq!(evaluate(&graph, if_node, 5.0, false).unwrap(), 10.0);
        assert_eq!(evaluate(&graph, if_node, 1.0, false).unwrap(), 20.0);
    }

    #[test]
    fn active_initial_selects_branch_from_the_initial_flag() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph, 0.5);
        let ongoing = graph.constant(1.0);
        let at_start = graph.constant(2.0);
        let ai = graph.binary(Operator::ActiveInitial, ongoing, at_start);
        bind(&mut graph, "x", ai);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert_eq!(evaluate(&graph, ai, 0.0, true).unwrap(), 2.0);
        assert_eq!(evaluate(&graph, ai, 0.0, false).unwrap(), 1.0);
    }

    #[test]
    fn pulse_is_high_only_inside_its_window_and_floors_width_at_time_step() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph, 1.0);
        let start = graph.constant(1.0);
        let width = graph.constant(0.1);
        let pulse = graph.binary(Operator::Pulse, start, width);
        bind(&mut graph, "p", pulse);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert_eq!(evaluate(&graph, pulse, 1.4, false).unwrap(), 1.0);
        assert_eq!(evaluate(&graph, pulse, 5.0, false).unwrap(), 0.0);
    }

    #[test]
    fn ramp_is_zero_before_start_and_clamped_after_end() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph, 0.5);
        let slope = graph.constant(2.0);
        let start_time = graph.constant(1.0);
        let end_time = graph.constant(3.0);
        let ramp = graph.ternary(Operator::Ramp, slope, start_time, end_time);
        bind(&mut graph, "r", ramp);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert_eq!(evaluate(&graph, ramp, 0.0, false).unwrap(), 0.0);
        assert_eq!(evaluate(&graph, ramp, 2.0, false).unwrap(), 2.0);
        assert_eq!(evaluate(&graph, ramp, 5.0, false).unwrap(), 4.0);
    }

    #[test]
    fn delay_fixed_reports_the_unsupported_error_instead_of_a_wrong_value() {
        let mut graph = ExpressionGraph::new();
        seed_time(&mut graph, 0.5);
        let input = graph.constant(1.0);
        let delay_time = graph.constant(1.0);
        let init_val = graph.constant(0.0);
        let delay = graph.ternary(Operator::DelayFixed, input, delay_time, init_val);
        bind(&mut graph, "d", delay);

        let mut diag = Diagnostics::new();
        analyze(&mut graph, &mut diag).unwrap();

        assert!(matches!(
            evaluate(&graph, delay, 0.0, false),
            Err(GraphError::DelayFixedUnsupported)
        ));
    }
}
