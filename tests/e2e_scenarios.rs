//! End-to-end scenarios S1-S5.

use simgraph::{
    evaluate, ButcherTableau, Diagnostics, ExpressionGraph, FileLocation, InitialType, Location,
    NodeType, Operator, Symbol, TableauName,
};

fn bind(graph: &mut ExpressionGraph, name: &str, node: simgraph::NodeId, loc: Option<FileLocation>) {
    graph.add_symbol(Symbol::intern(name), node, loc);
}

fn seed_time(graph: &mut ExpressionGraph, initial: f64, final_: f64, step: f64) {
    let it = graph.constant(initial);
    let ft = graph.constant(final_);
    let ts = graph.constant(step);
    bind(graph, "INITIAL TIME", it, None);
    bind(graph, "FINAL TIME", ft, None);
    bind(graph, "TIME STEP", ts, None);
}

#[test]
fn s1_scalar_ode() {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph, 0.0, 1.0, 0.1);

    let x_ref = graph.node_for(Symbol::intern("x"));
    let rate = graph.unary(Operator::UMinus, x_ref);
    let initial = graph.constant(1.0);
    let x = graph.binary(Operator::Integ, rate, initial);
    bind(&mut graph, "x", x, None);

    let mut diag = Diagnostics::new();
    simgraph::analyze(&mut graph, &mut diag).unwrap();

    assert_eq!(graph.node(x).ty, NodeType::Dynamic);
    assert_eq!(graph.node(x).init, InitialType::ConstantInit);
    assert_eq!(graph.node(x).value, Some(1.0));
    assert_eq!(graph.node(x).level, 1);
    assert_eq!(graph.node(rate).ty, NodeType::Dynamic);
}

#[test]
fn s2_common_subexpression_elimination() {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph, 0.0, 1.0, 0.1);

    let p = graph.constant(2.0);
    let q = graph.constant(3.0);
    let r = graph.constant(4.0);

    let p_plus_q = graph.binary(Operator::Plus, p, q);
    let a = graph.binary(Operator::Mult, p_plus_q, r);
    bind(&mut graph, "a", a, None);

    let q_plus_p = graph.binary(Operator::Plus, q, p);
    let b = graph.binary(Operator::Mult, r, q_plus_p);
    bind(&mut graph, "b", b, None);

    assert_eq!(a, b);
    assert_eq!(p_plus_q, q_plus_p);
}

#[test]
fn s3_forward_reference_resolves_before_analysis_completes() {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph, 0.0, 1.0, 0.1);

    // `y = x + 1` is parsed before `x = 2`.
    let x_ref = graph.node_for(Symbol::intern("x"));
    let one = graph.constant(1.0);
    let y = graph.binary(Operator::Plus, x_ref, one);
    bind(&mut graph, "y", y, None);

    let two = graph.constant(2.0);
    bind(&mut graph, "x", two, None);

    let mut diag = Diagnostics::new();
    simgraph::analyze(&mut graph, &mut diag).unwrap();

    assert_eq!(graph.node(y).value, Some(3.0));
    assert!(graph.all_symbols_resolved());
    assert!(!diag.has_errors());
}

#[test]
fn s4_undefined_symbol_is_one_error_at_the_right_location() {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph, 0.0, 1.0, 0.1);

    let z_ref = graph.node_for(Symbol::intern("z"));
    let loc = FileLocation::new("model.mdl", Location::new(7, 3));
    bind(&mut graph, "z", z_ref, Some(loc.clone()));

    let mut diag = Diagnostics::new();
    let result = simgraph::analyze(&mut graph, &mut diag);

    assert!(result.is_err());
    assert!(diag.has_errors());
    let rendered = diag.render();
    assert!(rendered.contains('z'));
    assert!(rendered.contains("model.mdl"));
    assert_eq!(graph.node(z_ref).ty, NodeType::Constant);
    assert_eq!(graph.node(z_ref).value, Some(0.0));
}

#[test]
fn s5_butcher_rk4() {
    let t = ButcherTableau::new(TableauName::RungeKutta4);
    assert_eq!(t.stages(), 4);
    assert_eq!(t.row(0), vec![0.0]);
    assert_eq!(t.row(1), vec![0.5, 0.5]);
    assert_eq!(t.row(2), vec![0.5, 0.0, 0.5]);
    assert_eq!(t.row(3), vec![1.0, 0.0, 0.0, 1.0]);
    assert_eq!(t.row(4), vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0]);
}

#[test]
fn constant_node_evaluates_to_its_folded_value_at_any_time() {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph, 0.0, 1.0, 0.1);
    let a = graph.constant(2.0);
    let b = graph.constant(5.0);
    let sum = graph.binary(Operator::Plus, a, b);
    bind(&mut graph, "total", sum, None);

    let mut diag = Diagnostics::new();
    simgraph::analyze(&mut graph, &mut diag).unwrap();

    assert_eq!(evaluate(&graph, sum, 0.0, false).unwrap(), 7.0);
    assert_eq!(evaluate(&graph, sum, 100.0, false).unwrap(), 7.0);
}
