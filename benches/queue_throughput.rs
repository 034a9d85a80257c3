//! Offer/poll throughput of the two queue primitives.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ramify::queues::{LocalQueue, PriorityItem, PriorityQueue};
use std::sync::Arc;

fn bench_fifo(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo");
    for batch in [64usize, 1024] {
        group.bench_with_input(
            BenchmarkId::new("offer_poll", batch),
            &batch,
            |b, &batch| {
                b.iter(|| {
                    let queue = LocalQueue::new();
                    for n in 0..batch {
                        queue.offer(n);
                    }
                    while queue.poll().is_some() {}
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("offer_unique", batch),
            &batch,
            |b, &batch| {
                b.iter(|| {
                    let queue = LocalQueue::new();
                    for n in 0..batch {
                        queue.offer_unique(n % 32);
                    }
                })
            },
        );
    }
    group.finish();
}

fn bench_priority(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority");
    for batch in [64usize, 1024] {
        group.bench_with_input(
            BenchmarkId::new("offer_poll", batch),
            &batch,
            |b, &batch| {
                b.iter(|| {
                    let queue = PriorityQueue::new(batch, Arc::new(|n: &usize| *n as i64));
                    for n in 0..batch {
                        queue.offer(PriorityItem::new(batch - n)).unwrap();
                    }
                    while queue.poll().is_some() {}
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_fifo, bench_priority);
criterion_main!(benches);
