//! Criterion benchmarks for the reduction engine.
//!
//! Covers full reductions across sizes and worker strategies, axis
//! reductions across row/column aspect ratios, and the autotuned path.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use numkern::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pseudo_f32(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| ((i * 17 + 3) % 1000) as f32 / 1000.0)
        .collect()
}

fn tensor_f32(shape: &[usize], device: &CpuDevice) -> Tensor<CpuRuntime> {
    let n: usize = shape.iter().product();
    Tensor::<CpuRuntime>::from_slice(&pseudo_f32(n), shape, device)
}

fn client_with(device: &CpuDevice, config: ReduceConfig) -> CpuClient {
    CpuClient::with_config(device.clone(), config)
}

// ---------------------------------------------------------------------------
// Full reductions
// ---------------------------------------------------------------------------

fn bench_full(c: &mut Criterion) {
    let device = CpuDevice::new();
    let client = client_with(&device, ReduceConfig::default());
    let mut group = c.benchmark_group("full_reduce_f32");

    for n in [1_000usize, 100_000, 1_000_000, 10_000_000] {
        let t = tensor_f32(&[n], &device);
        group.bench_with_input(BenchmarkId::new("sum", n), &t, |b, t| {
            b.iter(|| black_box(client.sum(t, false).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("mean", n), &t, |b, t| {
            b.iter(|| black_box(client.mean(t, false).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("argmax", n), &t, |b, t| {
            b.iter(|| black_box(client.argmax(t, false).unwrap()))
        });
    }

    group.finish();
}

fn bench_full_strategies(c: &mut Criterion) {
    let device = CpuDevice::new();
    let t = tensor_f32(&[4_000_000], &device);
    let mut group = c.benchmark_group("full_reduce_strategy");

    for (label, strategy) in [
        ("workers_1", FullReduceStrategy::FixedWorkers(1)),
        ("workers_12", FullReduceStrategy::FixedWorkers(12)),
        ("workers_64", FullReduceStrategy::FixedWorkers(64)),
        ("sqrt", FullReduceStrategy::SqrtSplit),
    ] {
        let client = client_with(&device, ReduceConfig::default().with_full_reduce(strategy));
        group.bench_function(BenchmarkId::new("argmax", label), |b| {
            b.iter(|| black_box(client.argmax(&t, false).unwrap()))
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Axis reductions
// ---------------------------------------------------------------------------

/// (M, N): tall-skinny, square, and short-wide problems.
const AXIS_SHAPES: [(usize, usize); 4] = [(100_000, 8), (1024, 1024), (16, 65_536), (1, 1_000_000)];

fn bench_axis(c: &mut Criterion) {
    let device = CpuDevice::new();
    let client = client_with(&device, ReduceConfig::default());
    let mut group = c.benchmark_group("axis_reduce_f32");

    for (m, n) in AXIS_SHAPES {
        let t = tensor_f32(&[m, n], &device);
        let label = format!("{m}x{n}");
        group.bench_with_input(BenchmarkId::new("mean_last", &label), &t, |b, t| {
            b.iter(|| black_box(client.mean_dims(t, &[-1], false).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("argmax_last", &label), &t, |b, t| {
            b.iter(|| black_box(client.argmax_dim(t, -1, false).unwrap()))
        });
    }

    // Leading-axis reductions: sum/mean permute+densify, argmax strides in place.
    let t = tensor_f32(&[1024, 1024], &device);
    group.bench_function("mean_first/1024x1024", |b| {
        b.iter(|| black_box(client.mean_dims(&t, &[0], false).unwrap()))
    });
    group.bench_function("argmax_first/1024x1024", |b| {
        b.iter(|| black_box(client.argmax_dim(&t, 0, false).unwrap()))
    });

    group.finish();
}

fn bench_axis_autotuned(c: &mut Criterion) {
    let device = CpuDevice::new();
    let client = client_with(&device, ReduceConfig::default().with_autotune(true));
    let mut group = c.benchmark_group("axis_reduce_autotuned");

    for (m, n) in AXIS_SHAPES {
        let t = tensor_f32(&[m, n], &device);
        // Populate the cache outside the timed loop.
        client.mean_dims(&t, &[-1], false).unwrap();
        group.bench_with_input(BenchmarkId::new("mean_last", format!("{m}x{n}")), &t, |b, t| {
            b.iter(|| black_box(client.mean_dims(t, &[-1], false).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_full,
    bench_full_strategies,
    bench_axis,
    bench_axis_autotuned
);
criterion_main!(benches);
