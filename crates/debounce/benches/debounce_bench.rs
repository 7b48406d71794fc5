//! Debouncer hot-path benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use debounce::Debouncer;
use std::time::Duration;

fn bench_update(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap();
    let _guard = runtime.enter();

    // Every call re-arms: cancel previous timer + spawn a new one
    c.bench_function("update_rearm", |b| {
        let debouncer = Debouncer::new(0u64, Duration::from_millis(300));
        let mut next = 0u64;
        b.iter(|| {
            next += 1;
            black_box(debouncer.update(next).unwrap());
        });
    });

    // Unchanged input is a lock + compare
    c.bench_function("update_unchanged", |b| {
        let debouncer = Debouncer::new(0u64, Duration::from_millis(300));
        debouncer.update(1).unwrap();
        b.iter(|| {
            black_box(debouncer.update(1).unwrap());
        });
    });

    c.bench_function("settled_read", |b| {
        let debouncer = Debouncer::new("settled".to_string(), Duration::from_millis(300));
        b.iter(|| black_box(debouncer.settled()));
    });
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
