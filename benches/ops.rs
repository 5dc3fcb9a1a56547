//! Micro-operation benchmarks for both indexing strategies.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency (nanoseconds) for lookup, incremental
//! add/remove, full rebuild, and snapshot under identical conditions.

use std::hint::black_box;
use std::sync::Arc;
use std::time::Instant;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use indexkit::index::{ConcurrentCategoryIndex, ConcurrentIdIndex};

const WORKING_SET: u64 = 8_192;
const OPS: u64 = 100_000;

fn owned_set() -> Vec<Arc<u64>> {
    (0..WORKING_SET).map(Arc::new).collect()
}

// ============================================================================
// Lookup Latency (ns/op)
// ============================================================================

fn bench_id_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("id_get_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("concurrent_id", |b| {
        b.iter_custom(|iters| {
            let owned = owned_set();
            let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
            index.rebuild(&owned);
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(index.get(i % WORKING_SET));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Incremental Add/Remove Cycle (ns/op)
// ============================================================================

fn bench_add_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_remove_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("concurrent_id", |b| {
        b.iter_custom(|iters| {
            let owned = owned_set();
            let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
            index.rebuild(&owned);
            let churn = Arc::new(WORKING_SET + 1);
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..OPS {
                    black_box(index.add(&churn));
                    black_box(index.remove(&churn));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("concurrent_category", |b| {
        b.iter_custom(|iters| {
            let owned = owned_set();
            let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 16);
            index.rebuild(&owned);
            let churn = Arc::new(WORKING_SET + 1);
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..OPS {
                    index.add(&churn);
                    // O(bucket) scan, the strategy's documented removal cost
                    black_box(index.remove(&churn));
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Full Rebuild (per snapshot)
// ============================================================================

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");
    group.throughput(Throughput::Elements(WORKING_SET));

    group.bench_function("concurrent_id", |b| {
        let owned = owned_set();
        let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
        b.iter(|| index.rebuild(black_box(&owned)))
    });

    group.bench_function("concurrent_category", |b| {
        let owned = owned_set();
        let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 16);
        b.iter(|| index.rebuild(black_box(&owned)))
    });

    group.finish();
}

// ============================================================================
// Snapshot Copy-Out (per snapshot)
// ============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    group.throughput(Throughput::Elements(WORKING_SET));

    group.bench_function("concurrent_id", |b| {
        let owned = owned_set();
        let index: ConcurrentIdIndex<u64> = ConcurrentIdIndex::new();
        index.rebuild(&owned);
        b.iter(|| black_box(index.snapshot()))
    });

    group.bench_function("concurrent_category", |b| {
        let owned = owned_set();
        let index = ConcurrentCategoryIndex::boxed(|v: &u64| v % 16);
        index.rebuild(&owned);
        b.iter(|| black_box(index.snapshot()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_id_get,
    bench_add_remove,
    bench_rebuild,
    bench_snapshot
);
criterion_main!(benches);
