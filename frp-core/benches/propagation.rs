//! Propagation Benchmarks
//!
//! Measures the cost of one input write through chains, fan-in and fan-out.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use frp_core::reactive::{combine3, Input, Output, Signal};

fn bench_map_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_chain");

    for depth in [1usize, 10, 100] {
        let input = Input::new(0u64);
        let mut tail: Signal<u64> = input.signal().clone();
        for _ in 0..depth {
            tail = tail.map(|v| v.wrapping_add(1));
        }
        let _output = tail.output(|v| {
            black_box(*v);
        });

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                input.set(next);
            });
        });
    }
    group.finish();
}

fn bench_diamond(c: &mut Criterion) {
    let input = Input::new(0u64);
    let doubled = input.signal().map(|v| v * 2);
    let squared = input.signal().map(|v| v.wrapping_mul(*v));
    let combined = combine3(input.signal(), &doubled, &squared, |a, b, c| a + b + c);
    let _output = combined.output(|v| {
        black_box(*v);
    });

    c.bench_function("diamond_combine3", |b| {
        let mut next = 0u64;
        b.iter(|| {
            next += 1;
            input.set(next);
        });
    });
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for observers in [1usize, 16, 256] {
        let input = Input::new(0u64);
        let outputs: Vec<Output> = (0..observers)
            .map(|_| {
                input.signal().output(|v| {
                    black_box(*v);
                })
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(observers), &observers, |b, _| {
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                input.set(next);
            });
        });
        drop(outputs);
    }
    group.finish();
}

criterion_group!(benches, bench_map_chain, bench_diamond, bench_fan_out);
criterion_main!(benches);
