//! Integration tests for launch-parameter selection
//!
//! Covers the index-width selector, the tiling selectors, and the config
//! knobs. None of these may change a result beyond summation order.

mod common;

use std::sync::Arc;

use common::{arange_f32, create_cpu_client, create_cpu_client_with};
use numkern::dtype::{AccumulationPrecision, DType};
use numkern::ops::ReduceOps;
use numkern::ops::reduce::{
    AxisTileConfig, FullReducePlan, FullReduceStrategy, I32_OFFSET_LIMIT, IndexWidth,
    ReduceConfig, TuneCache, TuneKey, axis_reduce_heuristic, layout_bounds,
};
use numkern::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use numkern::tensor::{Layout, Tensor};

fn mixed_data(n: usize) -> Vec<f32> {
    (0..n).map(|i| ((i * 7919) % 1013) as f32 - 500.0).collect()
}

// ============================================================================
// Selector Determinism
// ============================================================================

#[test]
fn test_tiling_selection_is_idempotent() {
    for (m, n) in [(1, 1), (3, 4), (1000, 7), (17, 100_000)] {
        assert_eq!(axis_reduce_heuristic(m, n), axis_reduce_heuristic(m, n));
    }
    for numel in [1, 64, 1_000_003] {
        for strategy in [FullReduceStrategy::default(), FullReduceStrategy::SqrtSplit] {
            assert_eq!(
                FullReducePlan::select(numel, strategy).unwrap(),
                FullReducePlan::select(numel, strategy).unwrap()
            );
        }
    }
}

#[test]
fn test_fixed_worker_plan_for_64_elements() {
    let plan = FullReducePlan::select(64, FullReduceStrategy::FixedWorkers(12)).unwrap();
    // ceil(64 / 12) = 6 rounds up to 8, so only 8 of the 12 slots are valid.
    assert_eq!(plan.tile_size, 8);
    assert_eq!(plan.valid_partials, 8);
    assert_eq!(plan.worker_count, 12);
    assert!(plan.covered() >= 64);
}

// ============================================================================
// Index Width
// ============================================================================

#[test]
fn test_large_shape_selects_wide_index() {
    // 2^31 + 8 elements: metadata only, nothing is allocated.
    let layout = Layout::contiguous(&[1 << 16, (1 << 15) + 1]);
    assert!(layout.elem_count() > I32_OFFSET_LIMIT);
    assert_eq!(IndexWidth::select(&layout_bounds(&layout), false), IndexWidth::I64);

    let plan =
        FullReducePlan::select(layout.elem_count(), FullReduceStrategy::default()).unwrap();
    assert_eq!(IndexWidth::select(&[plan.covered()], false), IndexWidth::I64);

    let small = Layout::contiguous(&[1 << 10, 1 << 10]);
    assert_eq!(IndexWidth::select(&layout_bounds(&small), false), IndexWidth::I32);
}

#[test]
fn test_forced_wide_index_is_numerically_identical() {
    let device = CpuDevice::new();
    let narrow = CpuClient::with_config(device.clone(), ReduceConfig::default());
    let wide = CpuClient::with_config(
        device.clone(),
        ReduceConfig::default().with_force_wide_index(true),
    );

    let data = mixed_data(5 * 300);
    let a = Tensor::<CpuRuntime>::from_slice(&data, &[5, 300], &device);

    for (x, y) in [
        (narrow.sum(&a, false).unwrap(), wide.sum(&a, false).unwrap()),
        (narrow.mean(&a, true).unwrap(), wide.mean(&a, true).unwrap()),
        (
            narrow.mean_dims(&a, &[1], false).unwrap(),
            wide.mean_dims(&a, &[1], false).unwrap(),
        ),
        (
            narrow.sum_dims(&a, &[0], false).unwrap(),
            wide.sum_dims(&a, &[0], false).unwrap(),
        ),
    ] {
        assert_eq!(x.to_vec::<f32>(), y.to_vec::<f32>());
    }

    assert_eq!(
        narrow.argmax(&a, false).unwrap().to_vec::<i64>(),
        wide.argmax(&a, false).unwrap().to_vec::<i64>()
    );
    assert_eq!(
        narrow.argmax_dim(&a, 0, false).unwrap().to_vec::<i64>(),
        wide.argmax_dim(&a, 0, false).unwrap().to_vec::<i64>()
    );
}

// ============================================================================
// Worker Count and Strategy
// ============================================================================

#[test]
fn test_hierarchical_combination_is_lossless() {
    let (twelve, device) = create_cpu_client_with(ReduceConfig::default().with_workers(12));
    let (one, _) = create_cpu_client_with(ReduceConfig::default().with_workers(1));

    let a = arange_f32(&[64], &device);
    assert_eq!(twelve.sum(&a, false).unwrap().item::<f32>().unwrap(), 2016.0);
    assert_eq!(one.sum(&a, false).unwrap().item::<f32>().unwrap(), 2016.0);

    let mut data = vec![1.0f32; 64];
    data[13] = 4.0;
    data[60] = 4.0;
    let b = Tensor::<CpuRuntime>::from_slice(&data, &[64], &device);
    assert_eq!(twelve.argmax(&b, false).unwrap().item::<i64>().unwrap(), 13);
    assert_eq!(one.argmax(&b, false).unwrap().item::<i64>().unwrap(), 13);
}

#[test]
fn test_worker_counts_agree_on_argmax() {
    let data = mixed_data(10_007);
    let expected = {
        let (c, device) = create_cpu_client_with(ReduceConfig::default().with_workers(1));
        let a = Tensor::<CpuRuntime>::from_slice(&data, &[10_007], &device);
        c.argmax(&a, false).unwrap().item::<i64>().unwrap()
    };

    for strategy in [
        FullReduceStrategy::FixedWorkers(3),
        FullReduceStrategy::FixedWorkers(12),
        FullReduceStrategy::FixedWorkers(1000),
        FullReduceStrategy::SqrtSplit,
    ] {
        let (c, device) = create_cpu_client_with(ReduceConfig::default().with_full_reduce(strategy));
        let a = Tensor::<CpuRuntime>::from_slice(&data, &[10_007], &device);
        assert_eq!(
            c.argmax(&a, false).unwrap().item::<i64>().unwrap(),
            expected,
            "{strategy:?}"
        );
    }
}

#[test]
fn test_more_workers_than_elements() {
    let (c, device) = create_cpu_client_with(ReduceConfig::default().with_workers(64));
    let a = Tensor::<CpuRuntime>::from_slice(&[2.0f64, 9.0, 4.0], &[3], &device);
    assert_eq!(c.sum(&a, false).unwrap().item::<f64>().unwrap(), 15.0);
    assert_eq!(c.mean(&a, false).unwrap().item::<f64>().unwrap(), 5.0);
    assert_eq!(c.argmax(&a, false).unwrap().item::<i64>().unwrap(), 1);
}

// ============================================================================
// Grid Cap
// ============================================================================

#[test]
fn test_small_max_grid_grid_strides() {
    let (capped, device) = create_cpu_client_with(ReduceConfig::default().with_max_grid(3));
    let (free, _) = create_cpu_client_with(ReduceConfig::default());

    let data = mixed_data(101 * 9);
    let a = Tensor::<CpuRuntime>::from_slice(&data, &[101, 9], &device);

    assert_eq!(
        capped.sum_dims(&a, &[1], false).unwrap().to_vec::<f32>(),
        free.sum_dims(&a, &[1], false).unwrap().to_vec::<f32>()
    );
    assert_eq!(
        capped.argmax_dim(&a, 1, false).unwrap().to_vec::<i64>(),
        free.argmax_dim(&a, 1, false).unwrap().to_vec::<i64>()
    );
    assert_eq!(
        capped.argmax_dim(&a, 0, false).unwrap().to_vec::<i64>(),
        free.argmax_dim(&a, 0, false).unwrap().to_vec::<i64>()
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let (c, device) = create_cpu_client_with(ReduceConfig::default().with_max_grid(0));
    let a = arange_f32(&[2, 2], &device);
    assert!(c.mean_dims(&a, &[1], false).is_err());
    assert!(c.argmax_dim(&a, 1, false).is_err());
}

// ============================================================================
// Accumulation Precision
// ============================================================================

#[test]
fn test_f64_accumulation_of_f32_input() {
    let (narrow, device) = create_cpu_client();
    let (wide, _) = create_cpu_client_with(
        ReduceConfig::default().with_precision(AccumulationPrecision::F64),
    );

    // Adding 1.0 to 2^24 is lost in f32; an f64 accumulator keeps every term
    // and the total 2^24 + 1024 is representable in the f32 output.
    let mut data = vec![1.0f32; 1025];
    data[0] = 16_777_216.0;
    let a = Tensor::<CpuRuntime>::from_slice(&data, &[1, 1025], &device);

    let rows = wide.sum_dims(&a, &[1], false).unwrap();
    assert_eq!(rows.dtype(), DType::F32);
    assert_eq!(rows.to_vec::<f32>(), [16_778_240.0]);

    let rows = narrow.sum_dims(&a, &[1], false).unwrap();
    assert!(rows.to_vec::<f32>()[0] < 16_778_240.0);
}

// ============================================================================
// Autotune Cache
// ============================================================================

#[test]
fn test_autotune_is_cached_per_shape() {
    let (c, device) = create_cpu_client_with(ReduceConfig::default().with_autotune(true));
    assert!(c.tune_cache().is_empty());

    let a = arange_f32(&[32, 16], &device);
    let first = c.mean_dims(&a, &[1], false).unwrap().to_vec::<f32>();
    assert_eq!(c.tune_cache().len(), 1);

    let key = TuneKey {
        kernel: "mean_dim",
        dtype: DType::F32,
        m: 32,
        n: 16,
    };
    let chosen = c.tune_cache().get(&key).unwrap();
    assert!([1, 2, 4, 8].contains(&chosen.block_m));

    // Same shape reuses the entry; a new shape or kernel adds one.
    let again = c.mean_dims(&a, &[1], false).unwrap().to_vec::<f32>();
    assert_eq!(first, again);
    assert_eq!(c.tune_cache().get(&key), Some(chosen));
    c.sum_dims(&a, &[1], false).unwrap();
    c.mean_dims(&a, &[0], false).unwrap();
    assert_eq!(c.tune_cache().len(), 3);
}

#[test]
fn test_clearing_cache_keeps_results() {
    let cache = Arc::new(TuneCache::new());
    let device = CpuDevice::new();
    let tuned = CpuClient::with_config(device.clone(), ReduceConfig::default().with_autotune(true))
        .with_tune_cache(Arc::clone(&cache));
    let shared = CpuClient::with_config(device.clone(), ReduceConfig::default())
        .with_tune_cache(Arc::clone(&cache));

    let a = arange_f32(&[9, 40], &device);
    let before = tuned.sum_dims(&a, &[1], false).unwrap().to_vec::<f32>();
    assert_eq!(cache.len(), 1);

    // A client without autotune still reads the shared entry.
    assert_eq!(shared.sum_dims(&a, &[1], false).unwrap().to_vec::<f32>(), before);

    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(shared.sum_dims(&a, &[1], false).unwrap().to_vec::<f32>(), before);
    assert!(cache.is_empty());
}

#[test]
fn test_seeded_cache_entry_is_used() {
    let cache = Arc::new(TuneCache::new());
    let seed = AxisTileConfig {
        block_m: 1,
        block_n: 1024,
    };
    cache.insert(
        TuneKey {
            kernel: "sum_dim",
            dtype: DType::F64,
            m: 5,
            n: 3,
        },
        seed,
    );

    let device = CpuDevice::new();
    let c = CpuClient::with_config(device.clone(), ReduceConfig::default()).with_tune_cache(cache);
    let data: Vec<f64> = (0..15).map(f64::from).collect();
    let a = Tensor::<CpuRuntime>::from_slice(&data, &[5, 3], &device);
    let rows = c.sum_dims(&a, &[-1], false).unwrap();
    assert_eq!(rows.to_vec::<f64>(), [3.0, 12.0, 21.0, 30.0, 39.0]);
}

#[test]
fn test_foreign_cache_entry_is_evicted() {
    let key = TuneKey {
        kernel: "sum_dim",
        dtype: DType::F64,
        m: 5,
        n: 3,
    };
    let data: Vec<f64> = (0..15).map(f64::from).collect();
    let device = CpuDevice::new();
    let a = Tensor::<CpuRuntime>::from_slice(&data, &[5, 3], &device);

    for bad in [
        AxisTileConfig {
            block_m: 0,
            block_n: 1024,
        },
        AxisTileConfig {
            block_m: 1,
            block_n: 0,
        },
        AxisTileConfig {
            block_m: 3,
            block_n: 1 << 40,
        },
    ] {
        let cache = Arc::new(TuneCache::new());
        cache.insert(key.clone(), bad);
        let c = CpuClient::with_config(device.clone(), ReduceConfig::default())
            .with_tune_cache(Arc::clone(&cache));

        let rows = c.sum_dims(&a, &[-1], false).unwrap();
        assert_eq!(rows.to_vec::<f64>(), [3.0, 12.0, 21.0, 30.0, 39.0], "{bad:?}");
        assert!(cache.get(&key).is_none(), "{bad:?}");
    }
}
