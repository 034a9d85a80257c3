//! Benchmarks for graph building and sync-mode composition.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ramify::graphs::{graph, GraphBuilder};
use ramify::lowering::comp_rewrite;

/// Build a linear chain: root -> n1 -> n2 -> ... -> n_count.
fn build_chain(count: usize) -> GraphBuilder<i64> {
    let mut builder = graph::<i64>();
    for _ in 0..count {
        builder = builder.each(|x| x + 1);
    }
    builder
}

/// Build a flat fan-out: root with `count` children.
fn build_fanout(count: usize) -> GraphBuilder<i64> {
    let mut builder = graph::<i64>().each(|x| x);
    for _ in 0..count {
        builder = builder.subgraph(|g| g.each(|x| x + 1));
    }
    builder
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for count in [8, 64, 256] {
        group.bench_with_input(BenchmarkId::new("chain", count), &count, |b, &count| {
            b.iter(|| build_chain(count).build().unwrap())
        });
        group.bench_with_input(BenchmarkId::new("fanout", count), &count, |b, &count| {
            b.iter(|| build_fanout(count).build().unwrap())
        });
    }
    group.finish();
}

fn bench_sync_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("sync_dispatch");
    for count in [8, 64] {
        let root = build_chain(count).build().unwrap();
        group.bench_with_input(BenchmarkId::new("chain", count), &count, |b, _| {
            b.to_async(&runtime).iter(|| async {
                let mono = comp_rewrite(&root);
                mono(0).await
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_sync_dispatch);
criterion_main!(benches);
