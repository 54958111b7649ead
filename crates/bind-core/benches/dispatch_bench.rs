//! Dispatch benchmarks for the observable core.
//!
//! - Fan-out: one update delivered to N observers
//! - Chain depth: one update cascading through N `map` stages
//! - Bind with replay
//!
//! Run with: cargo bench -p bind-core --bench dispatch_bench

use bind_core::Observable;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");
    for observers in [1usize, 8, 64, 512] {
        let obs = Observable::new();
        let total = Rc::new(Cell::new(0u64));
        for _ in 0..observers {
            let total = Rc::clone(&total);
            obs.bind(move |v: &u64| total.set(total.get().wrapping_add(*v)));
        }
        group.bench_with_input(BenchmarkId::from_parameter(observers), &obs, |b, obs| {
            b.iter(|| obs.update(black_box(1)));
        });
    }
    group.finish();
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_chain");
    for depth in [1usize, 4, 16, 64] {
        let head = Observable::new();
        let mut tail = head.clone();
        for _ in 0..depth {
            tail = tail.map(|v: &u64| v.wrapping_add(1));
        }
        group.bench_with_input(BenchmarkId::from_parameter(depth), &head, |b, head| {
            b.iter(|| head.update(black_box(0)));
        });
        black_box(tail.value());
    }
    group.finish();
}

fn bench_bind_replay(c: &mut Criterion) {
    c.bench_function("bind_replay_unbind", |b| {
        let obs = Observable::with_value(7u64);
        b.iter(|| {
            let subscription = obs.bind(|v| {
                black_box(*v);
            });
            obs.unbind(&subscription);
        });
    });
}

criterion_group!(benches, bench_fan_out, bench_chain_depth, bench_bind_replay);
criterion_main!(benches);
