//! Scheduler Benchmark Suite
//!
//! # Scenarios
//!
//! 1. **Many runnables**: N random-delay posts while paused, then one
//!    `advance_to_last_posted_runnable`
//!    - Guards against quadratic queue behavior
//!
//! 2. **Front insertion**: N `post_at_front_of_queue` calls, drained one task
//!    at a time
//!
//! 3. **Constant idle**: N posts each running on the spot
//!    - Measures the synchronous path (no queue traffic)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use krepis_chrono::{IdleState, Runnable, Scheduler, TimeUnit};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Helpers
// ============================================================================

/// Deterministic delays in `0..10` (64-bit LCG)
fn delays(count: usize) -> Vec<i64> {
    let mut seed: u64 = 0;
    (0..count)
        .map(|_| {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((seed >> 33) % 10) as i64
        })
        .collect()
}

fn counting(counter: &Arc<AtomicU64>) -> Runnable {
    let counter = Arc::clone(counter);
    Runnable::from_fn(move || {
        counter.fetch_add(1, Ordering::Relaxed);
    })
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_many_runnables(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_runnables");

    for n in [1_000, 20_000].iter() {
        let delays = delays(*n);

        group.bench_with_input(BenchmarkId::new("post_then_drain", n), &delays, |b, delays| {
            b.iter(|| {
                let scheduler = Scheduler::new();
                scheduler.pause();
                let counter = Arc::new(AtomicU64::new(0));

                for &delay in delays {
                    scheduler
                        .post_delayed(counting(&counter), delay, TimeUnit::Milliseconds)
                        .unwrap();
                }
                scheduler
                    .advance_to_last_posted_runnable_within(Duration::ZERO)
                    .unwrap();

                black_box(counter.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn bench_front_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("front_insertion");

    for n in [100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("post_at_front", n), n, |b, &n| {
            b.iter(|| {
                let scheduler = Scheduler::new();
                scheduler.pause();
                let counter = Arc::new(AtomicU64::new(0));

                for _ in 0..n {
                    scheduler.post_at_front_of_queue(counting(&counter)).unwrap();
                }
                while scheduler.run_one_task_within(Duration::ZERO).unwrap() {}

                black_box(counter.load(Ordering::Relaxed))
            });
        });
    }

    group.finish();
}

fn bench_constant_idle(c: &mut Criterion) {
    let mut group = c.benchmark_group("constant_idle");

    for n in [100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("post_delayed", n), n, |b, &n| {
            b.iter(|| {
                let scheduler = Scheduler::new();
                scheduler.set_idle_state(IdleState::ConstantIdle).unwrap();
                let counter = Arc::new(AtomicU64::new(0));

                for _ in 0..n {
                    scheduler
                        .post_delayed(counting(&counter), 1, TimeUnit::Microseconds)
                        .unwrap();
                }

                black_box(scheduler.current_time())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_many_runnables,
    bench_front_insertion,
    bench_constant_idle
);

criterion_main!(benches);
