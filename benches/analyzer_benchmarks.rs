//! Benchmarks for Builder + Analyzer throughput.
//!
//! Run with: cargo bench --bench analyzer_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use simgraph::{analyze, Diagnostics, ExpressionGraph, Operator, Symbol};

fn seed_time(graph: &mut ExpressionGraph) {
    let it = graph.constant(0.0);
    let ft = graph.constant(100.0);
    let ts = graph.constant(0.1);
    graph.add_symbol(Symbol::intern("INITIAL TIME"), it, None);
    graph.add_symbol(Symbol::intern("FINAL TIME"), ft, None);
    graph.add_symbol(Symbol::intern("TIME STEP"), ts, None);
}

/// A chain `x0 = 1, x1 = x0 + 1, x2 = x1 + 1, ...` of `n` bound symbols,
/// exercising the Builder's hash-consing and the Analyzer's worklist on a
/// deep, narrow dependency graph.
fn build_linear_chain(n: usize) -> ExpressionGraph {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph);
    let one = graph.constant(1.0);
    let mut prev = graph.constant(0.0);
    for i in 0..n {
        let next = graph.binary(Operator::Plus, prev, one);
        graph.add_symbol(Symbol::intern(&format!("x{i}")), next, None);
        prev = next;
    }
    graph
}

/// A forest of `n` independent `a_i = (p + q) * r` trees sharing the same
/// `p`, `q`, `r` leaves, exercising hash-consing breadth rather than depth.
fn build_shared_leaves_forest(n: usize) -> ExpressionGraph {
    let mut graph = ExpressionGraph::new();
    seed_time(&mut graph);
    let p = graph.constant(2.0);
    let q = graph.constant(3.0);
    let r = graph.constant(4.0);
    for i in 0..n {
        let sum = graph.binary(Operator::Plus, p, q);
        let prod = graph.binary(Operator::Mult, sum, r);
        graph.add_symbol(Symbol::intern(&format!("a{i}")), prod, None);
    }
    graph
}

fn bench_analyze_linear_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_linear_chain");

    for size in [10, 100, 1_000, 5_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || build_linear_chain(size),
                |mut graph| {
                    let mut diagnostics = Diagnostics::new();
                    analyze(black_box(&mut graph), &mut diagnostics).unwrap();
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_analyze_shared_leaves_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_shared_leaves_forest");

    for size in [10, 100, 1_000, 5_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter_batched(
                || build_shared_leaves_forest(size),
                |mut graph| {
                    let mut diagnostics = Diagnostics::new();
                    analyze(black_box(&mut graph), &mut diagnostics).unwrap();
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_build_only_linear_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_only_linear_chain");

    for size in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| build_linear_chain(black_box(size)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_analyze_linear_chain,
    bench_analyze_shared_leaves_forest,
    bench_build_only_linear_chain,
);

criterion_main!(benches);
