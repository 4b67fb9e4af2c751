//! Throughput benchmarks for the sliding window
//! Update and snapshot cost should stay flat regardless of how many events
//! the window has absorbed

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use std::hint::black_box;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use windowstat::clock::MockClock;
use windowstat::stats::WINDOW_SECONDS;
use windowstat::{SlidingWindow, WindowPolicy};

fn filled_window(events_per_second: usize) -> (SlidingWindow, MockClock) {
    let clock = MockClock::new(1_700_000_000);
    let window = SlidingWindow::with_clock(Arc::new(clock.clone()), WindowPolicy::LastBuckets);
    let x = Decimal::from_str("0.33323").unwrap();

    for _ in 0..=WINDOW_SECONDS {
        for _ in 0..events_per_second {
            window.update(x, 235424234, 0).unwrap();
        }
        clock.advance(1);
    }
    (window, clock)
}

/// Benchmark single-threaded updates into the open bucket
fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let x = Decimal::from_str("0.33323").unwrap();

    for events_per_second in [1, 100, 10_000] {
        let (window, _clock) = filled_window(events_per_second);
        group.bench_with_input(
            BenchmarkId::new("same_second", events_per_second),
            &window,
            |b, window| b.iter(|| window.update(black_box(x), black_box(42), 0)),
        );
    }

    let (window, clock) = filled_window(1);
    group.bench_function("rollover_every_call", |b| {
        b.iter(|| {
            clock.advance(1);
            window.update(black_box(x), black_box(42), 0)
        })
    });

    group.finish();
}

/// Benchmark snapshot folding over a full window
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for events_per_second in [1, 10_000] {
        let (window, _clock) = filled_window(events_per_second);
        group.bench_with_input(
            BenchmarkId::new("full_window", events_per_second),
            &window,
            |b, window| b.iter(|| black_box(window.snapshot())),
        );
    }

    let (window, _clock) = filled_window(1);
    group.bench_function("wire_line", |b| {
        b.iter(|| black_box(window.snapshot().to_wire_line()))
    });

    group.finish();
}

/// Benchmark updates under writer contention
fn bench_contended_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_update");
    let x = Decimal::from_str("5.0").unwrap();

    for writers in [2, 8] {
        group.bench_with_input(BenchmarkId::new("writers", writers), &writers, |b, &writers| {
            b.iter(|| {
                let window = Arc::new(SlidingWindow::new());
                let handles: Vec<_> = (0..writers)
                    .map(|_| {
                        let window = window.clone();
                        thread::spawn(move || {
                            for _ in 0..1_000 {
                                window.update(x, 50, 0).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                black_box(window.snapshot())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_update, bench_snapshot, bench_contended_update);
criterion_main!(benches);
