//! Performance benchmarks comparing pool allocation vs system malloc.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quarry::memory::{MemoryManager, PoolKind};
use std::alloc::{GlobalAlloc, Layout, System};

fn bench_allocation_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_speed");

    // Typical kernel object sizes
    let sizes = [16, 32, 48, 64, 96, 128, 256];

    for &size in &sizes {
        // Benchmark system malloc
        group.bench_with_input(BenchmarkId::new("system_malloc", size), &size, |b, &size| {
            b.iter(|| {
                let layout = Layout::from_size_align(size, 8).unwrap();
                unsafe {
                    let ptr = System.alloc(layout);
                    if !ptr.is_null() {
                        black_box(ptr);
                        System.dealloc(ptr, layout);
                    }
                }
            })
        });

        // Benchmark pool allocation (steady state: free list stays warm)
        group.bench_with_input(BenchmarkId::new("memory_pool", size), &size, |b, &size| {
            let mut manager = MemoryManager::default();
            manager.init_pool(PoolKind::Wme, size, "wme").unwrap();
            b.iter(|| {
                let ptr = manager.allocate(PoolKind::Wme).unwrap();
                black_box(ptr);
                unsafe { manager.free(PoolKind::Wme, ptr.as_ptr()) };
            })
        });
    }

    group.finish();
}

fn bench_allocation_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_patterns");

    // Burst pattern: the match cycle allocates a wave of tokens, then
    // retracts them all.
    group.bench_function("burst_malloc", |b| {
        let layout = Layout::from_size_align(40, 8).unwrap();
        b.iter(|| {
            let mut ptrs = Vec::with_capacity(500);
            for _ in 0..500 {
                unsafe {
                    let ptr = System.alloc(layout);
                    if !ptr.is_null() {
                        ptrs.push(ptr);
                    }
                }
            }
            for ptr in ptrs {
                unsafe { System.dealloc(ptr, layout) };
            }
        })
    });

    group.bench_function("burst_pool", |b| {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Token, 40, "token").unwrap();
        b.iter(|| {
            let mut ptrs = Vec::with_capacity(500);
            for _ in 0..500 {
                ptrs.push(manager.allocate(PoolKind::Token).unwrap());
            }
            for ptr in ptrs {
                unsafe { manager.free(PoolKind::Token, ptr.as_ptr()) };
            }
        })
    });

    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");

    // Interleaved allocate/free churn with a standing population, the shape
    // of working memory across decision cycles.
    group.bench_function("interleaved_pool_churn", |b| {
        let mut manager = MemoryManager::default();
        manager.init_pool(PoolKind::Wme, 48, "wme").unwrap();

        let mut standing: Vec<_> = (0..1000)
            .map(|_| manager.allocate(PoolKind::Wme).unwrap())
            .collect();

        let mut cursor = 0;
        b.iter(|| {
            // Retire one element and admit a replacement.
            let old = standing[cursor];
            unsafe { manager.free(PoolKind::Wme, old.as_ptr()) };
            standing[cursor] = manager.allocate(PoolKind::Wme).unwrap();
            cursor = (cursor + 1) % standing.len();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_allocation_speed,
    bench_allocation_patterns,
    bench_churn
);

criterion_main!(benches);
