//! Control dependence benchmarks
//!
//! Decisive dependence on synthetic functions:
//! - chain of nested if/else diamonds
//! - nested loops
//! - both granularities through the lazy analysis

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use depgraph_ir::config::{CdGranularity, CdaConfig};
use depgraph_ir::features::control_dependence::DecisiveOrderDependence;
use depgraph_ir::shared::models::{BlockId, FunctionId, InstructionKind, Module, ModuleBuilder};
use depgraph_ir::{ControlDependence, ControlDependenceAnalysis};

/// `n` diamonds in sequence, each arm holding a few instructions
fn diamond_chain(n: usize) -> (Module, FunctionId) {
    let mut mb = ModuleBuilder::new("bench");
    let f = mb.add_function("f", 1, false);
    let cond = mb.argument(f, 0);

    let mut head = mb.add_block(f);
    for _ in 0..n {
        let then = mb.add_block(f);
        let other = mb.add_block(f);
        let merge = mb.add_block(f);
        mb.push(
            head,
            InstructionKind::CondBr {
                condition: cond,
                if_true: then,
                if_false: other,
            },
        );
        for arm in [then, other] {
            for _ in 0..3 {
                mb.push(arm, InstructionKind::Op { operands: vec![cond] });
            }
            mb.push(arm, InstructionKind::Br { target: merge });
        }
        head = merge;
    }
    mb.push(head, InstructionKind::Ret { value: None });
    (mb.build(), f)
}

/// `depth` loops nested inside each other
fn nested_loops(depth: usize) -> (Module, FunctionId) {
    let mut mb = ModuleBuilder::new("bench");
    let f = mb.add_function("f", 1, false);
    let cond = mb.argument(f, 0);

    let entry = mb.add_block(f);
    let headers: Vec<BlockId> = (0..depth).map(|_| mb.add_block(f)).collect();
    let body = mb.add_block(f);
    let latches: Vec<BlockId> = (0..depth).map(|_| mb.add_block(f)).collect();
    let exit = mb.add_block(f);

    mb.push(entry, InstructionKind::Br { target: headers[0] });
    for i in 0..depth {
        let inner = headers.get(i + 1).copied().unwrap_or(body);
        let out = if i == 0 { exit } else { latches[i - 1] };
        mb.push(
            headers[i],
            InstructionKind::CondBr {
                condition: cond,
                if_true: inner,
                if_false: out,
            },
        );
        mb.push(latches[i], InstructionKind::Br { target: headers[i] });
    }
    mb.push(body, InstructionKind::Br { target: latches[depth - 1] });
    mb.push(exit, InstructionKind::Ret { value: None });
    (mb.build(), f)
}

fn bench_decisive_dependence(c: &mut Criterion) {
    let mut group = c.benchmark_group("decisive_dependence");

    for n in [8usize, 32, 128] {
        let (module, f) = diamond_chain(n);
        let mut cda = ControlDependenceAnalysis::new(&module, CdaConfig::default());
        cda.compute(Some(f)).unwrap();
        let graph = cda.graph(f).unwrap().clone();

        group.throughput(Throughput::Elements(graph.node_count() as u64));
        group.bench_with_input(BenchmarkId::new("diamond_chain", n), &graph, |b, graph| {
            let analysis = DecisiveOrderDependence::new();
            b.iter(|| black_box(analysis.compute(graph)));
        });
    }

    for depth in [4usize, 16] {
        let (module, f) = nested_loops(depth);
        let mut cda = ControlDependenceAnalysis::new(&module, CdaConfig::default());
        cda.compute(Some(f)).unwrap();
        let graph = cda.graph(f).unwrap().clone();

        group.bench_with_input(BenchmarkId::new("nested_loops", depth), &graph, |b, graph| {
            let analysis = DecisiveOrderDependence::new();
            b.iter(|| black_box(analysis.compute(graph)));
        });
    }

    group.finish();
}

fn bench_order_dependence(c: &mut Criterion) {
    let (module, f) = diamond_chain(16);
    let mut cda = ControlDependenceAnalysis::new(&module, CdaConfig::default());
    cda.compute(Some(f)).unwrap();
    let graph = cda.graph(f).unwrap().clone();

    c.bench_function("decisive_order_dependence", |b| {
        let analysis = DecisiveOrderDependence::new().with_order_dependence(true);
        b.iter(|| black_box(analysis.compute(&graph)));
    });
}

fn bench_lazy_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("lazy_analysis");
    let (module, f) = diamond_chain(32);

    for granularity in [CdGranularity::Block, CdGranularity::Instruction] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", granularity)),
            &granularity,
            |b, &granularity| {
                b.iter(|| {
                    let config = CdaConfig::default().granularity(granularity);
                    let mut cda = ControlDependenceAnalysis::new(&module, config);
                    cda.compute(Some(f)).unwrap();
                    black_box(cda.is_computed(f))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decisive_dependence,
    bench_order_dependence,
    bench_lazy_analysis
);
criterion_main!(benches);
