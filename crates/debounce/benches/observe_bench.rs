//! Observation throughput benchmarks for the debouncer

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use debounce::{Debouncer, KeyedDebouncer, ManualScheduler};
use std::time::Duration;

fn bench_observe(c: &mut Criterion) {
    let scheduler = ManualScheduler::new();
    let debouncer = Debouncer::with_scheduler(0u64, Duration::from_millis(300), scheduler.clone());

    // Every observation preempts the previous one: cancel + rearm
    c.bench_function("observe_burst", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            debouncer.push(black_box(n));
        });
    });

    c.bench_function("observe_and_commit", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            debouncer.push(black_box(n));
            scheduler.advance(Duration::from_millis(300));
        });
    });
}

fn bench_keyed(c: &mut Criterion) {
    let scheduler = ManualScheduler::new();
    let debouncer: KeyedDebouncer<u32, u64, _> =
        KeyedDebouncer::with_scheduler(Duration::from_millis(300), scheduler.clone());

    c.bench_function("keyed_observe_64_keys", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            debouncer.push(black_box((n % 64) as u32), n);
        });
    });
}

criterion_group!(benches, bench_observe, bench_keyed);
criterion_main!(benches);
